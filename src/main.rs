// src/main.rs
mod canon;
mod config;
mod error;
mod handlers;
mod logging;
mod registry;
mod relay;
mod translate;
mod types;

#[cfg(test)]
mod testutil;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use config::Config;
use handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let path = std::env::var("QR_GATEWAY_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let cfg = Config::load(&path).with_context(|| format!("loading {path}"))?;
    let _log_guards = logging::init(&cfg.log_dir, cfg.log_max_files)
        .with_context(|| format!("initialising logs in {}", cfg.log_dir.display()))?;

    let addr = cfg.listen_addr()?;
    let state = AppState::from_config(&cfg)?;
    let app = handlers::router(state, cfg.request_timeout());

    info!("--------------------");
    info!("listen address: {addr}");
    info!("verify url: {}", cfg.verify_url);
    info!("shop id: {}", cfg.mc_shop_id);
    info!("devices: {}", cfg.devices.len());
    if !cfg.require_sign {
        info!("unsigned requests are accepted (require_sign = false)");
    }
    info!("--------------------");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("gateway listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
