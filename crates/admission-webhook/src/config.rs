use anyhow::{Result, anyhow};
use clap::ArgMatches;
use lazy_static::lazy_static;
use registry_policy::whitelist::RegistryWhitelist;
use serde::Deserialize;
use std::fs::File;
use std::net::SocketAddr;
use std::path::Path;

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub whitelist: RegistryWhitelist,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: String,
    pub key_file: String,
}

/// Layout of the file passed with `--whitelist-file`.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct WhitelistFile {
    pub registries: Vec<String>,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let whitelist = whitelist(matches)?;

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();
        let (cert_file, key_file) = tls_files(matches)?;
        let tls_config = if cert_file.is_empty() {
            None
        } else {
            Some(TlsConfig {
                cert_file,
                key_file,
            })
        };

        Ok(Self {
            addr,
            tls_config,
            whitelist,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    let address = matches
        .get_one::<String>("address")
        .ok_or_else(|| anyhow!("error parsing arguments: missing bind address"))?;
    let port = matches
        .get_one::<String>("port")
        .ok_or_else(|| anyhow!("error parsing arguments: missing port"))?;

    format!("{address}:{port}")
        .parse()
        .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_files(matches: &ArgMatches) -> Result<(String, String)> {
    let cert_file = matches
        .get_one::<String>("cert-file")
        .cloned()
        .unwrap_or_default();
    let key_file = matches
        .get_one::<String>("key-file")
        .cloned()
        .unwrap_or_default();
    if cert_file.is_empty() != key_file.is_empty() {
        Err(anyhow!(
            "error parsing arguments: either both --cert-file and --key-file must be provided, or neither"
        ))
    } else {
        Ok((cert_file, key_file))
    }
}

/// Entries coming from the whitelist file come first, followed by the ones
/// given on the command line.
fn whitelist(matches: &ArgMatches) -> Result<RegistryWhitelist> {
    let mut prefixes = match matches.get_one::<String>("whitelist-file") {
        Some(path) => {
            let path = Path::new(path);
            read_whitelist_file(path).map_err(|e| {
                anyhow!("error while loading whitelist from {:?}: {}", path, e)
            })?
        }
        None => Vec::new(),
    };

    if let Some(values) = matches.get_many::<String>("whitelist-registries") {
        prefixes.extend(
            values
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(String::from),
        );
    }

    RegistryWhitelist::new(prefixes).map_err(|e| anyhow!("invalid registry whitelist: {}", e))
}

pub fn read_whitelist_file(path: &Path) -> Result<Vec<String>> {
    let whitelist_file: WhitelistFile = serde_yaml::from_reader(File::open(path)?)?;
    Ok(whitelist_file.registries)
}
