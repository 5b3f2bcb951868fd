use anyhow::{Result, anyhow};
use axum_server::tls_rustls::RustlsConfig;
use std::path::Path;

use crate::config::TlsConfig;

/// Load the certificate and key used by the HTTPS listener.
pub(crate) async fn create_tls_config(tls_config: &TlsConfig) -> Result<RustlsConfig> {
    for file in [&tls_config.cert_file, &tls_config.key_file] {
        if !Path::new(file).exists() {
            return Err(anyhow!("TLS file {file} does not exist"));
        }
    }

    RustlsConfig::from_pem_file(&tls_config.cert_file, &tls_config.key_file)
        .await
        .map_err(|e| anyhow!("Cannot load TLS certificate and key: {e}"))
}
