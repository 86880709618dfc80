//! The plugin as seen by a host agent: identity, lifecycle, configure,
//! validate and export.

use std::sync::Arc;

use crate::config::{self, ConfigCell, EffectiveConfig, GlobalOptions, RawConfig};
use crate::error::{ExportError, ValidationError};
use crate::executor::RequestExecutor;
use crate::logging::LogSink;

pub const PLUGIN_NAME: &str = "Segi9";
pub const METRIC_KEY: &str = "segi9.http";
pub const METRIC_DESCRIPTION: &str =
    "Performs an HTTP/HTTPS GET request from the agent host and returns the full response body.";

/// A metric this plugin can export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    pub key: &'static str,
    pub description: &'static str,
}

pub const METRICS: &[Metric] = &[Metric {
    key: METRIC_KEY,
    description: METRIC_DESCRIPTION,
}];

pub struct Plugin {
    executor: RequestExecutor,
    logger: Arc<dyn LogSink>,
}

impl Plugin {
    pub fn new(config: EffectiveConfig, logger: Arc<dyn LogSink>) -> Self {
        let cell = Arc::new(ConfigCell::new(config));
        Self {
            executor: RequestExecutor::new(cell, logger.clone()),
            logger,
        }
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn metrics(&self) -> &'static [Metric] {
        METRICS
    }

    pub fn start(&self) {
        self.logger.info(&format!("{} plugin started", PLUGIN_NAME));
    }

    pub fn stop(&self) {
        self.logger.info(&format!("{} plugin stopped", PLUGIN_NAME));
    }

    /// Current effective configuration snapshot
    pub fn config(&self) -> EffectiveConfig {
        self.executor.config().get()
    }

    /// Apply host configuration. Never fails: a malformed private payload is
    /// logged and treated as absent, and the timeout is clamped into range.
    pub fn configure(
        &self,
        global: Option<&GlobalOptions>,
        private: Option<&serde_json::Value>,
    ) -> EffectiveConfig {
        self.logger.info("Configure called");

        let raw = match private.map(RawConfig::decode).transpose() {
            Ok(raw) => raw,
            Err(e) => {
                self.logger
                    .error(&format!("Ignoring plugin configuration: {}", e));
                None
            }
        };

        let resolved = config::resolve(raw.as_ref(), global);
        self.executor.config().set(resolved);

        self.logger.info(&format!(
            "Configuration set: Timeout={}, SkipVerify={}",
            resolved.timeout_seconds, resolved.skip_tls_verify
        ));
        resolved
    }

    /// Check a candidate configuration without applying it
    pub fn validate(&self, private: Option<&serde_json::Value>) -> Result<(), ValidationError> {
        self.logger.debug("Validate called");

        let raw = match private {
            Some(value) => RawConfig::decode(value)?,
            None => RawConfig::default(),
        };
        config::validate(&raw)?;

        self.logger.debug(&format!(
            "Validation successful: Timeout={:?}, SkipVerify={:?}",
            raw.timeout, raw.skip_verify
        ));
        Ok(())
    }

    pub async fn export(&self, key: &str, params: &[String]) -> Result<String, ExportError> {
        if !METRICS.iter().any(|m| m.key == key) {
            self.logger.warn(&format!("Unknown metric key: {}", key));
            return Err(ExportError::UnknownMetric(key.to_string()));
        }
        self.executor.execute(key, params).await
    }
}
