use std::fmt;
use thiserror::Error;

/// Errors returned to the caller of an export
#[derive(Debug, Error)]
pub enum ExportError {
    /// URL missing, empty or not parseable
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// Auth mode other than none/basic/bearer
    #[error("unsupported auth type: {mode}")]
    UnsupportedAuth { mode: String },
    /// Connect, TLS handshake, send or timeout failure
    #[error("request failed: {detail}")]
    NetworkError { detail: String },
    /// Body stream failed after headers were received
    #[error("failed to read response body: {detail}")]
    ReadError { detail: String },
    /// Metric key not registered by this plugin
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
}

/// Coarse classification of an [`ExportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParams,
    UnsupportedAuth,
    NetworkError,
    ReadError,
    UnknownMetric,
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParams(_) => ErrorKind::InvalidParams,
            Self::UnsupportedAuth { .. } => ErrorKind::UnsupportedAuth,
            Self::NetworkError { .. } => ErrorKind::NetworkError,
            Self::ReadError { .. } => ErrorKind::ReadError,
            Self::UnknownMetric(_) => ErrorKind::UnknownMetric,
        }
    }

    /// Build a `NetworkError` from a transport failure, keeping the source chain.
    ///
    /// The URL is dropped from the message since it may carry userinfo.
    pub fn network(err: reqwest::Error) -> Self {
        let err = err.without_url();
        let mut detail = describe(&err);
        if err.is_timeout() {
            detail = format!("timed out: {}", detail);
        }
        Self::NetworkError { detail }
    }

    pub fn read(err: reqwest::Error) -> Self {
        Self::ReadError {
            detail: describe(&err.without_url()),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidParams => "invalid_params",
            Self::UnsupportedAuth => "unsupported_auth",
            Self::NetworkError => "network_error",
            Self::ReadError => "read_error",
            Self::UnknownMetric => "unknown_metric",
        };
        f.write_str(name)
    }
}

/// Errors from the configuration validation path
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("timeout out of range: {value} (must be between 1 and 30)")]
    TimeoutOutOfRange { value: i64 },
    #[error("malformed configuration: {0}")]
    Decode(String),
}

/// Flatten an error and its sources into one line.
///
/// reqwest's own message is terse ("error sending request for url"); the
/// cause (DNS, refused, certificate) lives further down the chain.
fn describe(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
