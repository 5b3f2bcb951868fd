use clap::builder::PossibleValue;
use clap::{Arg, ArgAction, Command, crate_description, crate_name, crate_version};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("IMAGE_WEBHOOK_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("IMAGE_WEBHOOK_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("IMAGE_WEBHOOK_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("IMAGE_WEBHOOK_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("IMAGE_WEBHOOK_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("IMAGE_WEBHOOK_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("whitelist-registries")
            .long("whitelist-registries")
            .value_name("REGISTRY_PREFIXES")
            .env("IMAGE_WEBHOOK_WHITELIST_REGISTRIES")
            .value_delimiter(',')
            .action(ArgAction::Append)
            .help("Comma separated list of registry prefixes container images must start with"),
        Arg::new("whitelist-file")
            .long("whitelist-file")
            .value_name("WHITELIST_FILE")
            .env("IMAGE_WEBHOOK_WHITELIST_FILE")
            .help("YAML file holding the list of allowed registry prefixes under the `registries` key"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
