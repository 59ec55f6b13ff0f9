use thiserror::Error;

use super::device_code::OAuthErrorCode;

/// Authentication errors raised by the device flow, the poll loop and the
/// credential store.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Device authorization failed: {0}")]
    DeviceAuthorization(String),
    #[error("Device code expired, restart authentication")]
    DeviceCodeExpired,
    #[error("Authorization denied by user")]
    AuthorizationDenied,
    #[error("Authentication timed out after {attempts} poll attempts")]
    AuthenticationTimeout { attempts: u32 },
    #[error("Token refresh failed: {0}")]
    Refresh(String),
    #[error("OAuth error {code}: {}", .description.as_deref().unwrap_or("no description"))]
    OAuth {
        code: String,
        description: Option<String>,
    },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// The standard OAuth error code carried by this error, if any.
    pub fn oauth_code(&self) -> Option<OAuthErrorCode> {
        match self {
            Self::DeviceCodeExpired => Some(OAuthErrorCode::ExpiredToken),
            Self::AuthorizationDenied => Some(OAuthErrorCode::AccessDenied),
            Self::OAuth { code, .. } => code.parse().ok(),
            _ => None,
        }
    }

    /// Terminal errors end a device flow; everything else is retried by the
    /// poll loop.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::AuthenticationTimeout { .. } => true,
            _ => matches!(
                self.oauth_code(),
                Some(OAuthErrorCode::ExpiredToken | OAuthErrorCode::AccessDenied)
            ),
        }
    }

    /// Collapse terminal OAuth codes into their dedicated variants.
    pub fn into_terminal(self) -> Self {
        match self.oauth_code() {
            Some(OAuthErrorCode::ExpiredToken) => Self::DeviceCodeExpired,
            Some(OAuthErrorCode::AccessDenied) => Self::AuthorizationDenied,
            _ => self,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
