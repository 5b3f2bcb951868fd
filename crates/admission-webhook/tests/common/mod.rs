use admission_webhook::{WebhookServer, config::Config};
use axum::Router;
use registry_policy::whitelist::RegistryWhitelist;
use std::net::SocketAddr;

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        tls_config: None,
        whitelist: RegistryWhitelist::new(["docker.io/library/", "gcr.io/myorg/"]).unwrap(),
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) fn app(config: Config) -> Router {
    let server = WebhookServer::new_from_config(config).unwrap();

    server.router()
}
