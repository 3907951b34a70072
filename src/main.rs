//! batch-media server binary
//!
//! Configuration comes from the JSON file named by `BATCH_MEDIA_CONFIG`
//! (defaults when unset), with `BATCH_MEDIA_BIND` overriding the bind
//! address. Log filtering follows `RUST_LOG`.

use batch_media::api::{AppState, start_api_server};
use batch_media::{Config, Error};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "BATCH_MEDIA_CONFIG";
const BIND_ENV: &str = "BATCH_MEDIA_BIND";
const DEFAULT_LOG_FILTER: &str = "batch_media=info,tower_http=info";

fn load_config() -> batch_media::Result<Config> {
    let mut config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            tracing::info!(path = %path.display(), "loading configuration file");
            Config::from_file(&path)?
        }
        None => Config::default(),
    };

    if let Ok(bind) = std::env::var(BIND_ENV) {
        config.server.bind_address = bind
            .parse::<SocketAddr>()
            .map_err(|e| Error::config("server.bind_address", format!("{BIND_ENV}={bind}: {e}")))?;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Arc::new(load_config()?);
    let state = AppState::new(config)?;

    start_api_server(state).await?;
    Ok(())
}
