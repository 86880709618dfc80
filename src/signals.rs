use anyhow::Result;
use tokio::sync::broadcast;
use tracing::info;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Process control events delivered to the agent loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Finish in-flight exports and exit
    Shutdown,
    /// Re-read the configuration file
    Reload,
}

/// Setup signal handlers for the agent adapter
///
/// Handles:
/// - SIGTERM/SIGINT: shutdown
/// - SIGHUP: configuration reload
#[cfg(unix)]
pub fn setup_signal_handlers() -> Result<(
    broadcast::Sender<ControlSignal>,
    tokio::task::JoinHandle<()>,
)> {
    let (control_tx, _) = broadcast::channel(16);
    let tx_clone = control_tx.clone();

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("SIGTERM received, shutting down");
                    let _ = tx_clone.send(ControlSignal::Shutdown);
                    break;
                }
                _ = sigint.recv() => {
                    info!("SIGINT received, shutting down");
                    let _ = tx_clone.send(ControlSignal::Shutdown);
                    break;
                }
                _ = sighup.recv() => {
                    info!("SIGHUP received, reloading configuration");
                    let _ = tx_clone.send(ControlSignal::Reload);
                }
            }
        }
    });

    Ok((control_tx, handle))
}

/// Windows placeholder - only Ctrl+C is supported
#[cfg(not(unix))]
pub fn setup_signal_handlers() -> Result<(
    broadcast::Sender<ControlSignal>,
    tokio::task::JoinHandle<()>,
)> {
    let (control_tx, _) = broadcast::channel(16);
    let tx_clone = control_tx.clone();

    let handle = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, shutting down");
                let _ = tx_clone.send(ControlSignal::Shutdown);
            }
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
        }
    });

    Ok((control_tx, handle))
}
