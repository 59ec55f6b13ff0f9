//! Persisted OAuth credential and validity rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access tokens expiring within this window are treated as already expired.
pub const EXPIRY_SKEW_MS: i64 = 30_000;

/// OAuth credential persisted between invocations.
///
/// # Example
/// ```
/// use tokenkeeper::auth::Credential;
///
/// let credential = Credential {
///     access_token: "access".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     token_type: "Bearer".to_string(),
///     resource_url: Some("portal.example.com".to_string()),
///     expiry_date: 1_700_000_060_000,
/// };
/// assert!(credential.is_valid_at(1_700_000_000_000));
/// assert!(!credential.is_valid_at(1_700_000_030_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
    /// Absolute expiry, epoch milliseconds.
    pub expiry_date: i64,
}

impl Credential {
    /// Valid iff more than [`EXPIRY_SKEW_MS`] remain before `expiry_date`.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.expiry_date.saturating_sub(now_ms) > EXPIRY_SKEW_MS
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.expiry_date)
    }
}

/// Validity check over an optional credential; absent is never valid.
pub fn is_valid(credential: Option<&Credential>, now_ms: i64) -> bool {
    credential.is_some_and(|c| c.is_valid_at(now_ms))
}

/// Read-only view of the stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    Absent,
    Valid(Credential),
    Expired(Credential),
}

impl CredentialStatus {
    pub fn evaluate(credential: Option<Credential>, now_ms: i64) -> Self {
        match credential {
            None => Self::Absent,
            Some(c) if c.is_valid_at(now_ms) => Self::Valid(c),
            Some(c) => Self::Expired(c),
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Self::Absent => None,
            Self::Valid(c) | Self::Expired(c) => Some(c),
        }
    }
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn default_token_type() -> String {
    "Bearer".to_string()
}
