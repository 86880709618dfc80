//! Authentication strategies for the outbound request.
//!
//! The mode string is decided once when parameters are parsed; after that the
//! request builder only sees the closed [`Auth`] union.

use reqwest::RequestBuilder;
use std::fmt;

use crate::error::ExportError;

/// Authentication mode named by the second export parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    None,
    Basic,
    Bearer,
}

impl AuthMode {
    /// Parse a mode name, case-insensitively. An empty string means `None`.
    pub fn parse(mode: &str) -> Result<Self, ExportError> {
        match mode.to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "basic" => Ok(Self::Basic),
            "bearer" => Ok(Self::Bearer),
            other => Err(ExportError::UnsupportedAuth {
                mode: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::Bearer => "bearer",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials bound to their mode
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Basic {
        username: String,
        password: Option<String>,
    },
    Bearer {
        token: String,
    },
}

impl Auth {
    /// Bind the positional credential parameters to a mode.
    ///
    /// `secret` is the username for basic and the token for bearer; `password`
    /// is only read for basic.
    pub fn new(mode: AuthMode, secret: Option<&str>, password: Option<&str>) -> Self {
        match mode {
            AuthMode::None => Self::None,
            AuthMode::Basic => Self::Basic {
                username: secret.unwrap_or_default().to_string(),
                password: password.map(str::to_string),
            },
            AuthMode::Bearer => Self::Bearer {
                token: secret.unwrap_or_default().to_string(),
            },
        }
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            Self::None => AuthMode::None,
            Self::Basic { .. } => AuthMode::Basic,
            Self::Bearer { .. } => AuthMode::Bearer,
        }
    }

    /// Attach the matching `Authorization` header, if any
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::None => builder,
            Self::Basic { username, password } => builder.basic_auth(username, password.as_ref()),
            Self::Bearer { token } => builder.bearer_auth(token),
        }
    }
}

// Credentials never reach Debug output
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { password, .. } => f
                .debug_struct("Basic")
                .field("username", &"***")
                .field("password", &password.as_ref().map(|_| "***"))
                .finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}
