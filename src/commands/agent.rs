use anyhow::Result;
use segi9::agent::{self, AgentOptions};
use segi9::config::{self, load_raw_config};
use segi9::signals::setup_signal_handlers;
use std::path::Path;
use tokio::io::BufReader;
use tracing::{info, warn};

/// Execute the agent command
///
/// Serves host requests on stdin/stdout until the host terminates the
/// plugin or a shutdown signal arrives.
pub async fn execute(config_path: &Path) -> Result<()> {
    let initial = match load_raw_config(config_path) {
        Ok(raw) => config::resolve(Some(&raw), None),
        Err(e) => {
            warn!("Ignoring configuration file {}: {}", config_path.display(), e);
            config::resolve(None, None)
        }
    };

    info!(
        timeout = initial.timeout_seconds,
        skip_verify = initial.skip_tls_verify,
        "Starting agent adapter"
    );

    let (control_tx, signal_handle) = setup_signal_handlers()?;
    let options = AgentOptions {
        initial,
        config_path: Some(config_path.to_path_buf()),
        ..AgentOptions::default()
    };

    let result = agent::serve(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        options,
        control_tx.subscribe(),
    )
    .await;

    signal_handle.abort();
    info!("Agent adapter stopped");
    result
}
