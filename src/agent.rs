//! Host-agent adapter: newline-delimited JSON requests on one stream,
//! results and log records on another.
//!
//! Configure and validate run inline so a configure is fully applied before
//! the next request is read. Each export runs on its own task; a panic in an
//! export becomes an error result and the loop keeps serving.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{self, EffectiveConfig, GlobalOptions};
use crate::logging::LogSink;
use crate::plugin::Plugin;
use crate::signals::ControlSignal;

/// Request from the host agent
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    Configure {
        id: u64,
        #[serde(default)]
        global: Option<GlobalOptions>,
        #[serde(default)]
        private: Option<serde_json::Value>,
    },
    Validate {
        id: u64,
        #[serde(default)]
        private: Option<serde_json::Value>,
    },
    Export {
        id: u64,
        key: String,
        #[serde(default)]
        params: Vec<String>,
    },
    Terminate,
}

/// Message sent back to the host agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    Result {
        id: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Log {
        level: String,
        message: String,
    },
}

impl Outbound {
    fn ok(id: u64, value: serde_json::Value) -> Self {
        Self::Result {
            id: Some(id),
            value: Some(value),
            error: None,
        }
    }

    fn err(id: Option<u64>, error: impl ToString) -> Self {
        Self::Result {
            id,
            value: None,
            error: Some(error.to_string()),
        }
    }
}

/// Forwards plugin log records to the host as `log` messages
pub struct AgentLogSink {
    tx: mpsc::UnboundedSender<Outbound>,
    max_level: tracing::Level,
}

impl AgentLogSink {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>, max_level: tracing::Level) -> Self {
        Self { tx, max_level }
    }
}

impl LogSink for AgentLogSink {
    fn log(&self, level: tracing::Level, message: &str) {
        // Level ordering: ERROR < WARN < INFO < DEBUG < TRACE
        if level > self.max_level {
            return;
        }
        let _ = self.tx.send(Outbound::Log {
            level: level.as_str().to_lowercase(),
            message: message.to_string(),
        });
    }
}

/// Agent loop settings
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Configuration in effect before the host sends `configure`
    pub initial: EffectiveConfig,
    /// File re-read on reload
    pub config_path: Option<PathBuf>,
    /// Most verbose level forwarded to the host
    pub log_level: tracing::Level,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            initial: EffectiveConfig::default(),
            config_path: None,
            log_level: tracing::Level::INFO,
        }
    }
}

/// Serve host requests until `terminate`, end of input, or a shutdown signal.
///
/// In-flight exports are drained before returning.
pub async fn serve<R, W>(
    reader: R,
    writer: W,
    options: AgentOptions,
    mut control: broadcast::Receiver<ControlSignal>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_loop(writer, rx));

    let sink = Arc::new(AgentLogSink::new(tx.clone(), options.log_level));
    let plugin = Arc::new(Plugin::new(options.initial, sink));
    plugin.start();

    let mut reader = reader;
    let mut pending = Vec::new();
    let mut exports = JoinSet::new();
    let mut last_global: Option<GlobalOptions> = None;

    loop {
        tokio::select! {
            // Partial reads stay in `pending` if another branch wins
            read = reader.read_until(b'\n', &mut pending) => {
                match read {
                    Ok(0) if pending.is_empty() => {
                        info!("Host closed the request stream");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Failed to read host request: {}", e);
                        break;
                    }
                }
                let line = match String::from_utf8(std::mem::take(&mut pending)) {
                    Ok(line) => line,
                    Err(e) => {
                        let e = e.utf8_error();
                        warn!("Malformed request: {}", e);
                        let _ = tx.send(Outbound::err(None, format!("malformed request: {}", e)));
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let request: Inbound = match serde_json::from_str(&line) {
                    Ok(request) => request,
                    Err(e) => {
                        warn!("Malformed request: {}", e);
                        let _ = tx.send(Outbound::err(None, format!("malformed request: {}", e)));
                        continue;
                    }
                };

                match request {
                    Inbound::Configure { id, global, private } => {
                        if global.is_some() {
                            last_global = global;
                        }
                        let applied = plugin.configure(global.as_ref(), private.as_ref());
                        let _ = tx.send(Outbound::ok(id, serde_json::to_value(applied)?));
                    }
                    Inbound::Validate { id, private } => {
                        let reply = match plugin.validate(private.as_ref()) {
                            Ok(()) => Outbound::ok(id, serde_json::Value::Null),
                            Err(e) => Outbound::err(Some(id), e),
                        };
                        let _ = tx.send(reply);
                    }
                    Inbound::Export { id, key, params } => {
                        let plugin = plugin.clone();
                        let tx = tx.clone();
                        exports.spawn(async move {
                            let reply = run_export(plugin, id, key, params).await;
                            let _ = tx.send(reply);
                        });
                    }
                    Inbound::Terminate => {
                        info!("Terminate requested by host");
                        break;
                    }
                }
            }
            signal = control.recv() => {
                match signal {
                    Ok(ControlSignal::Reload) => {
                        reload(&plugin, options.config_path.as_ref(), last_global.as_ref());
                    }
                    Ok(ControlSignal::Shutdown) | Err(broadcast::error::RecvError::Closed) => {
                        info!("Shutdown requested");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Missed {} control signals", n);
                    }
                }
            }
            Some(_) = exports.join_next(), if !exports.is_empty() => {}
        }
    }

    while exports.join_next().await.is_some() {}

    plugin.stop();
    drop(plugin);
    drop(tx);

    writer_task.await??;
    Ok(())
}

/// Run one export on its own task so a panic is reported, not propagated
async fn run_export(plugin: Arc<Plugin>, id: u64, key: String, params: Vec<String>) -> Outbound {
    let handle = tokio::spawn(async move { plugin.export(&key, &params).await });

    match handle.await {
        Ok(Ok(body)) => Outbound::ok(id, serde_json::Value::String(body)),
        Ok(Err(e)) => Outbound::err(Some(id), e),
        Err(e) => {
            tracing::error!("Export {} aborted: {}", id, e);
            Outbound::err(Some(id), format!("internal fault: {}", e))
        }
    }
}

fn reload(plugin: &Plugin, path: Option<&PathBuf>, global: Option<&GlobalOptions>) {
    let Some(path) = path else {
        debug!("No configuration file to reload");
        return;
    };

    match config::load_raw_config(path) {
        Ok(raw) => match serde_json::to_value(&raw) {
            Ok(value) => {
                plugin.configure(global, Some(&value));
                info!("Configuration reloaded from {}", path.display());
            }
            Err(e) => warn!("Failed to encode reloaded configuration: {}", e),
        },
        Err(e) => warn!("Failed to reload configuration from {}: {}", path.display(), e),
    }
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Outbound>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    writer.shutdown().await?;
    Ok(())
}
