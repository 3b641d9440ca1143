use anyhow::Result;
use log::{info, warn};

use plcwatch::{Monitor, MonitorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cfg = MonitorConfig::from_env();
    info!(
        "plcwatch starting up (server {}, plc {})",
        cfg.base_url, cfg.plc_id
    );

    let monitor = Monitor::new(cfg);
    let mut events = monitor.subscribe();
    monitor.start().await?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(err) => warn!("unserializable event: {err}"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("event consumer lagged, {missed} events dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}
