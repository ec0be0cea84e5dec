use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lifeline::api::{start_server, ApiContext};
use lifeline::config;
use lifeline::geocode::Geocoder;
use lifeline::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let state = Arc::new(AppState::open()?);
    tracing::info!(data_dir = %state.data_dir.display(), "{} {} starting", config::APP_NAME, config::APP_VERSION);

    let ctx = ApiContext::new(state, Geocoder::new(config::geocode_endpoint()));
    let mut server = start_server(ctx, config::bind_addr()).await?;
    tracing::info!(addr = %server.addr, "listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.shutdown();

    Ok(())
}
