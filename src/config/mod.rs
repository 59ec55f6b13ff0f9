//! Configuration (defaults < `.env` < process environment < `with_*` overrides).

use std::path::PathBuf;

use crate::auth::error::AuthError;
use crate::auth::poll::PollPolicy;

pub const DEFAULT_BASE_URL: &str = "https://chat.qwen.ai";
pub const DEFAULT_CLIENT_ID: &str = "f0304373b74a44d2b584a3fb70ca9e56";
pub const DEFAULT_SCOPE: &str = "openid profile email model.completion";
pub const DEVICE_CODE_PATH: &str = "/api/v1/oauth2/device/code";
pub const TOKEN_PATH: &str = "/api/v1/oauth2/token";
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
pub const REFRESH_GRANT_TYPE: &str = "refresh_token";

const CREDENTIALS_DIR: &str = ".tokenkeeper";
const CREDENTIALS_FILE: &str = "oauth_creds.json";

const ENV_BASE_URL: &str = "TOKENKEEPER_BASE_URL";
const ENV_CLIENT_ID: &str = "TOKENKEEPER_CLIENT_ID";
const ENV_CREDENTIALS_FILE: &str = "TOKENKEEPER_CREDENTIALS_FILE";

/// Settings shared by the store, the device-flow client and the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    pub base_url: String,
    pub client_id: String,
    pub scope: String,
    pub credentials_path: PathBuf,
    pub poll: PollPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            credentials_path: default_credentials_path(),
            poll: PollPolicy::default(),
        }
    }
}

impl AuthConfig {
    /// Defaults overlaid with `.env` and process environment variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            self.client_id = client_id;
        }
        if let Some(path) = lookup(ENV_CREDENTIALS_FILE) {
            self.credentials_path = PathBuf::from(path);
        }
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Reject settings no request could succeed with.
    pub fn validate(&self) -> Result<(), AuthError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|err| {
            AuthError::Configuration(format!("invalid base URL {:?}: {err}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AuthError::Configuration(format!(
                "base URL must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.client_id.trim().is_empty() {
            return Err(AuthError::Configuration("client id is empty".to_string()));
        }
        if self.credentials_path.as_os_str().is_empty() {
            return Err(AuthError::Configuration("credentials path is empty".to_string()));
        }
        if self.poll.max_attempts == 0 {
            return Err(AuthError::Configuration(
                "poll policy needs at least one attempt".to_string(),
            ));
        }
        Ok(())
    }

    pub fn device_code_url(&self) -> String {
        format!("{}{DEVICE_CODE_PATH}", self.base_url.trim_end_matches('/'))
    }

    pub fn token_url(&self) -> String {
        format!("{}{TOKEN_PATH}", self.base_url.trim_end_matches('/'))
    }
}

/// `~/.tokenkeeper/oauth_creds.json`, or relative to the working directory
/// when no home directory is known.
pub fn default_credentials_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(CREDENTIALS_DIR))
        .unwrap_or_else(|| PathBuf::from(CREDENTIALS_DIR))
        .join(CREDENTIALS_FILE)
}
