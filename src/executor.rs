//! One GET request per export.
//!
//! Each call builds its own client from a snapshot of the effective
//! configuration, so concurrent exports never share a connection and a
//! reconfigure only affects calls that start after it.

use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Auth, AuthMode};
use crate::config::{ConfigCell, EffectiveConfig};
use crate::error::ExportError;
use crate::logging::{LogSink, Presence};

/// Request parameters derived from the positional export parameters
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub url: Url,
    pub auth: Auth,
}

impl RequestSpec {
    /// Parse `[url, auth_mode?, user_or_token?, password?]`.
    pub fn parse(params: &[String]) -> Result<Self, ExportError> {
        let raw_url = params
            .first()
            .ok_or_else(|| ExportError::InvalidParams("missing URL parameter".to_string()))?;
        if raw_url.is_empty() {
            return Err(ExportError::InvalidParams("URL cannot be empty".to_string()));
        }

        let url = Url::parse(raw_url)
            .map_err(|e| ExportError::InvalidParams(format!("invalid URL: {}", e)))?;

        let mode = AuthMode::parse(params.get(1).map(String::as_str).unwrap_or_default())?;
        let auth = Auth::new(
            mode,
            params.get(2).map(String::as_str),
            params.get(3).map(String::as_str),
        );

        Ok(Self { url, auth })
    }
}

/// Issues the request described by an export and reduces it to a body or error
pub struct RequestExecutor {
    config: Arc<ConfigCell>,
    logger: Arc<dyn LogSink>,
}

impl RequestExecutor {
    pub fn new(config: Arc<ConfigCell>, logger: Arc<dyn LogSink>) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &Arc<ConfigCell> {
        &self.config
    }

    /// Perform the GET and return the body as text, whatever the status code
    pub async fn execute(&self, key: &str, params: &[String]) -> Result<String, ExportError> {
        self.logger.info(&format!(
            "Export called with key: {}, params count: {}",
            key,
            params.len()
        ));

        let spec = match RequestSpec::parse(params) {
            Ok(spec) => spec,
            Err(e) => {
                self.logger.warn(&format!("Rejected parameters: {}", e));
                return Err(e);
            }
        };

        self.logger.debug(&format!(
            "URL: {}, auth: {}, username/token: {}, password: {}",
            redacted(&spec.url),
            spec.auth.mode(),
            Presence::of(params.get(2).map(String::as_str)),
            Presence::of(params.get(3).map(String::as_str)),
        ));
        if spec.auth.mode() != AuthMode::None && params.len() < 3 {
            self.logger.warn(&format!(
                "Auth mode {} selected without credentials",
                spec.auth.mode()
            ));
        }

        self.send(spec, self.config.get()).await
    }

    async fn send(&self, spec: RequestSpec, config: EffectiveConfig) -> Result<String, ExportError> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = build_client(&config).map_err(|e| {
            self.logger.error(&format!("Failed to build HTTP client: {}", e));
            ExportError::network(e)
        })?;

        self.logger.info(&format!(
            "Sending GET request to {} with timeout {:?}, SkipVerify: {}",
            redacted(&spec.url),
            timeout,
            config.skip_tls_verify
        ));

        let request = client
            .get(spec.url.clone())
            .header("Content-Type", "application/json");
        let request = spec.auth.apply(request);

        let response = request.send().await.map_err(|e| {
            let err = ExportError::network(e);
            self.logger
                .warn(&format!("Request to {} failed: {}", redacted(&spec.url), err));
            err
        })?;

        let status = response.status();
        self.logger
            .info(&format!("Response received: Status {}", status));

        let body = response.bytes().await.map_err(|e| {
            let err = ExportError::read(e);
            self.logger.warn(&format!("{}", err));
            err
        })?;

        self.logger
            .debug(&format!("Body read successfully ({} bytes)", body.len()));

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// URL for log lines, with any userinfo masked
/// Display form of a raw URL parameter with userinfo masked.
///
/// Unparseable input is never echoed.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => redacted(&url),
        Err(_) => "<invalid url>".to_string(),
    }
}

fn redacted(url: &Url) -> String {
    if url.username().is_empty() && url.password().is_none() {
        return url.to_string();
    }
    let mut shown = url.clone();
    let _ = shown.set_username("***");
    let _ = shown.set_password(None);
    shown.to_string()
}

fn build_client(config: &EffectiveConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .danger_accept_invalid_certs(config.skip_tls_verify)
        .build()
}
