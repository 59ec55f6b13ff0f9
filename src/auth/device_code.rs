//! Device-code session types.

use strum::{Display, EnumString};

use super::Credential;

/// Per-attempt device-flow state. Never persisted.
///
/// # Example
/// ```no_run
/// use tokenkeeper::auth::DeviceFlowSession;
///
/// let session = DeviceFlowSession {
///     client_id: "client".to_string(),
///     code_verifier: "verifier".to_string(),
///     code_challenge: "challenge".to_string(),
///     device_code: "device-code".to_string(),
///     user_code: "ABCD-EFGH".to_string(),
///     verification_uri: "https://auth.example.com/device".to_string(),
///     verification_uri_complete: Some("https://auth.example.com/device?user_code=ABCD-EFGH".to_string()),
///     interval_secs: None,
///     expires_in_secs: None,
/// };
/// assert!(session.verification_url().ends_with("ABCD-EFGH"));
/// ```
#[derive(Clone)]
pub struct DeviceFlowSession {
    pub client_id: String,
    pub code_verifier: String,
    pub code_challenge: String,
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: Option<String>,
    pub interval_secs: Option<u64>,
    pub expires_in_secs: Option<u64>,
}

impl DeviceFlowSession {
    /// URL the user should open; prefers the one with the code pre-filled.
    pub fn verification_url(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.verification_uri)
    }
}

impl std::fmt::Debug for DeviceFlowSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceFlowSession")
            .field("client_id", &self.client_id)
            .field("code_verifier", &"..")
            .field("code_challenge", &self.code_challenge)
            .field("device_code", &"..")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("verification_uri_complete", &self.verification_uri_complete)
            .field("interval_secs", &self.interval_secs)
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}

/// Outcome of a single device-code exchange.
#[derive(Debug, Clone)]
pub enum DeviceCodePoll {
    Pending,
    SlowDown,
    Authorized { credential: Credential },
    AccessDenied,
    Expired,
}

/// Standard OAuth device-flow error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum OAuthErrorCode {
    AuthorizationPending,
    SlowDown,
    ExpiredToken,
    AccessDenied,
}

impl OAuthErrorCode {
    pub fn poll_outcome(self) -> DeviceCodePoll {
        match self {
            Self::AuthorizationPending => DeviceCodePoll::Pending,
            Self::SlowDown => DeviceCodePoll::SlowDown,
            Self::ExpiredToken => DeviceCodePoll::Expired,
            Self::AccessDenied => DeviceCodePoll::AccessDenied,
        }
    }
}
