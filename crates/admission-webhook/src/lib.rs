mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod handler;
pub mod tracing;

use ::tracing::{info, warn};
use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use registry_policy::codec::EnvelopeCodec;
use std::{net::SocketAddr, sync::Arc, time::Duration};

use crate::api::{
    handlers::{not_found_handler, readiness_handler, review_handler},
    state::ApiServerState,
};
use crate::config::{Config, TlsConfig};
use crate::handler::{ReviewHandler, RouteTable};

/// How long in-flight requests are given to complete once shutdown starts.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

pub struct WebhookServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<TlsConfig>,
}

impl WebhookServer {
    pub fn new_from_config(config: Config) -> Result<Self> {
        let handler = ReviewHandler::new(
            EnvelopeCodec::default(),
            config.whitelist,
            RouteTable::default(),
        );
        if handler.whitelist().is_empty() {
            warn!("the registry whitelist is empty, every pod is going to be rejected");
        } else {
            info!(whitelist = %handler.whitelist(), "registry whitelist loaded");
        }
        let state = Arc::new(ApiServerState { handler });

        let mut router: Router<Arc<ApiServerState>> = Router::new();
        for (path, pipeline) in state.handler.routes().iter() {
            info!(path, ?pipeline, "registering review pipeline");
            router = router.route(path, post(review_handler));
        }
        let router = router
            .route("/readiness", get(readiness_handler))
            .fallback(not_found_handler)
            .with_state(state);

        Ok(Self {
            router,
            addr: config.addr,
            tls_config: config.tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        let handle = axum_server::Handle::new();
        tokio::spawn(shutdown_signal(handle.clone()));

        match self.tls_config {
            Some(tls_config) => {
                let rustls_config = certs::create_tls_config(&tls_config).await?;
                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, rustls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = %self.addr, "started HTTP server");
                axum_server::bind(self.addr)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal(handle: axum_server::Handle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "cannot listen for the shutdown signal");
            return;
        }
    }
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}
