use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::{signal, sync::mpsc};
use tracing::info;

use orderdesk_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    let ledger: Arc<dyn api::ledger::OrderLedger> = Arc::new(
        api::ledger::CsvLedger::open(&cfg.data.orders_file).context("failed to open order ledger")?,
    );

    let addr: SocketAddr = cfg
        .server_addr()
        .parse()
        .context("invalid host/port configuration")?;
    let state =
        api::AppState::build(cfg, ledger, event_sender).context("failed to build app state")?;

    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, api::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown signal received");
}
