pub mod agent;
pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod plugin;
pub mod signals;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use crate::config::{ConfigCell, EffectiveConfig, GlobalOptions, RawConfig};
pub use crate::error::{ErrorKind, ExportError, ValidationError};
pub use crate::executor::{RequestExecutor, RequestSpec};
pub use crate::plugin::Plugin;

/// Initialize tracing/logging
///
/// Logs are written to stderr; stdout is reserved for metric values and
/// agent protocol messages. Can only be called once per process.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
