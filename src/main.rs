//! cui-console entry point.
//!
//! Connects to the configured `/cui` endpoint, prints the console log to
//! stdout and reads controls from stdin (`:reconnect`, `:quit`, or a
//! command name to send).

use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use cui_console::config::ConsoleConfig;
use cui_console::ws::{ConsoleClient, Control, spawn_control_reader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics on stderr; stdout carries the console itself.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConsoleConfig::from_env()?;
    tracing::info!(endpoint = %config.endpoint_url(), mode = ?config.render_mode, "starting cui-console");

    let mut client = ConsoleClient::new(config);
    let mut entries = client.subscribe_log();

    let printer = tokio::spawn(async move {
        loop {
            match entries.recv().await {
                Ok(entry) => println!("{}", entry.text()),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "console output fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let (control_tx, control_rx) = mpsc::channel(16);

    spawn_control_reader(std::io::BufReader::new(std::io::stdin()), control_tx.clone())?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = control_tx.send(Control::Shutdown).await;
        }
    });

    client.run(control_rx).await;
    if let Some(stats) = client.session_stats() {
        tracing::info!(
            received = stats.messages_received,
            parse_failures = stats.parse_failures,
            sent = stats.commands_sent,
            "console stopped"
        );
    }

    drop(client);
    printer.await?;

    Ok(())
}
