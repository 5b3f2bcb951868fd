use anyhow::{Result, anyhow};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

// Setup the tracing system. Must be called once, before the server starts.
pub fn setup_tracing(log_level: &str, log_fmt: &str, log_no_color: bool) -> Result<()> {
    // some of our dependencies generate trace events too, but we don't care about them ->
    // let's filter them
    let filter_layer = EnvFilter::new(log_level)
        .add_directive("h2=off".parse()?)
        .add_directive("hyper=off".parse()?)
        .add_directive("rustls=off".parse()?);

    match log_fmt {
        "json" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().json())
            .try_init()?,
        "text" => {
            let fmt_layer = fmt::layer().with_ansi(!log_no_color);

            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt_layer)
                .try_init()?
        }
        _ => return Err(anyhow!("Unknown log message format")),
    };

    Ok(())
}
