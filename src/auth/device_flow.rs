//! HTTP client for the device authorization and token endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::credential::{now_millis, Credential};
use super::device_code::{DeviceCodePoll, DeviceFlowSession, OAuthErrorCode};
use super::error::AuthError;
use super::pkce::{compute_code_challenge, generate_code_verifier};
use crate::config::{AuthConfig, DEVICE_CODE_GRANT_TYPE, REFRESH_GRANT_TYPE};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authorization-server operations used by the poll loop and the manager.
#[async_trait]
pub trait DeviceAuthorization: Send + Sync {
    /// Start a device flow with a fresh PKCE pair.
    async fn initiate(&self) -> Result<DeviceFlowSession, AuthError>;

    /// Exchange the device code once; standard OAuth error codes come back
    /// as [`DeviceCodePoll`] outcomes, everything else as an error.
    async fn exchange_device_code(
        &self,
        session: &DeviceFlowSession,
    ) -> Result<DeviceCodePoll, AuthError>;

    /// Mint a new credential from the stored refresh token.
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;
}

/// Device-flow client backed by `reqwest`.
///
/// # Example
/// ```no_run
/// use tokenkeeper::auth::{DeviceAuthorization, DeviceFlowClient};
/// use tokenkeeper::config::AuthConfig;
///
/// # async fn example() -> Result<(), tokenkeeper::auth::AuthError> {
/// let client = DeviceFlowClient::new(&AuthConfig::from_env());
/// let session = client.initiate().await?;
/// println!("Visit {} and enter {}", session.verification_url(), session.user_code);
/// # Ok(())
/// # }
/// ```
pub struct DeviceFlowClient {
    client: reqwest::Client,
    client_id: String,
    scope: String,
    device_code_url: String,
    token_url: String,
}

impl DeviceFlowClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            scope: config.scope.clone(),
            device_code_url: config.device_code_url(),
            token_url: config.token_url(),
        }
    }

    async fn post_token_form(
        &self,
        form: &[(&str, &str)],
    ) -> Result<(StatusCode, String), reqwest::Error> {
        let resp = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(form)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl DeviceAuthorization for DeviceFlowClient {
    async fn initiate(&self) -> Result<DeviceFlowSession, AuthError> {
        let code_verifier = generate_code_verifier();
        let code_challenge = compute_code_challenge(&code_verifier);
        tracing::debug!(url = %self.device_code_url, "Requesting device code");
        let resp = self
            .client
            .post(&self.device_code_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("scope", self.scope.as_str()),
                ("code_challenge", code_challenge.as_str()),
                ("code_challenge_method", "S256"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| AuthError::DeviceAuthorization(err.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| AuthError::DeviceAuthorization(err.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::DeviceAuthorization(format!(
                "Device code request failed with status {status}: {}",
                describe_error_body(&body)
            )));
        }
        let payload: DeviceCodeResponse = serde_json::from_str(&body).map_err(|err| {
            AuthError::DeviceAuthorization(format!("Malformed device code response: {err}"))
        })?;
        payload.into_session(&self.client_id, code_verifier, code_challenge)
    }

    async fn exchange_device_code(
        &self,
        session: &DeviceFlowSession,
    ) -> Result<DeviceCodePoll, AuthError> {
        let (status, body) = self
            .post_token_form(&[
                ("grant_type", DEVICE_CODE_GRANT_TYPE),
                ("client_id", session.client_id.as_str()),
                ("device_code", session.device_code.as_str()),
                ("code_verifier", session.code_verifier.as_str()),
            ])
            .await?;
        interpret_exchange(status, &body, now_millis())
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AuthError::Refresh("no refresh token stored".to_string()))?;
        tracing::debug!(url = %self.token_url, "Refreshing access token");
        let (status, body) = self
            .post_token_form(&[
                ("grant_type", REFRESH_GRANT_TYPE),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
            ])
            .await
            .map_err(|err| AuthError::Refresh(err.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::Refresh(format!(
                "status {status}: {}",
                describe_error_body(&body)
            )));
        }
        let payload: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| AuthError::Refresh(format!("malformed token response: {err}")))?;
        payload
            .into_credential(now_millis(), Some(credential))
            .map_err(AuthError::Refresh)
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: Option<String>,
    user_code: Option<String>,
    verification_uri: Option<String>,
    verification_uri_complete: Option<String>,
    expires_in: Option<u64>,
    interval: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

impl DeviceCodeResponse {
    fn into_session(
        self,
        client_id: &str,
        code_verifier: String,
        code_challenge: String,
    ) -> Result<DeviceFlowSession, AuthError> {
        let device_code = match non_empty(self.device_code) {
            Some(code) => code,
            None => {
                let reason = match (self.error, self.error_description) {
                    (Some(code), Some(desc)) => format!("{code}: {desc}"),
                    (Some(code), None) => code,
                    (None, Some(desc)) => desc,
                    (None, None) => "no error details".to_string(),
                };
                return Err(AuthError::DeviceAuthorization(format!(
                    "Device code response missing device_code ({reason})"
                )));
            }
        };
        let user_code = non_empty(self.user_code).ok_or_else(|| {
            AuthError::DeviceAuthorization("Device code response missing user_code".to_string())
        })?;
        let verification_uri_complete = non_empty(self.verification_uri_complete);
        let verification_uri = non_empty(self.verification_uri)
            .or_else(|| verification_uri_complete.clone())
            .ok_or_else(|| {
                AuthError::DeviceAuthorization(
                    "Device code response missing verification URI".to_string(),
                )
            })?;
        Ok(DeviceFlowSession {
            client_id: client_id.to_string(),
            code_verifier,
            code_challenge,
            device_code,
            user_code,
            verification_uri,
            verification_uri_complete,
            interval_secs: self.interval,
            expires_in_secs: self.expires_in,
        })
    }
}

/// Token endpoint response body. Success and error fields share one shape
/// because some servers answer errors with HTTP 200.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub resource_url: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Normalize into a [`Credential`]; `refresh_token` and `resource_url`
    /// fall back to `previous` when the server omits them.
    pub fn into_credential(
        self,
        now_ms: i64,
        previous: Option<&Credential>,
    ) -> Result<Credential, String> {
        let access_token = non_empty(self.access_token)
            .ok_or_else(|| "token response missing access_token".to_string())?;
        let expires_in = self
            .expires_in
            .ok_or_else(|| "token response missing expires_in".to_string())?;
        Ok(Credential {
            access_token,
            refresh_token: non_empty(self.refresh_token)
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            token_type: non_empty(self.token_type).unwrap_or_else(|| "Bearer".to_string()),
            resource_url: non_empty(self.resource_url)
                .or_else(|| previous.and_then(|p| p.resource_url.clone())),
            expiry_date: now_ms.saturating_add(expires_in.saturating_mul(1000)),
        })
    }
}

fn interpret_exchange(
    status: StatusCode,
    body: &str,
    now_ms: i64,
) -> Result<DeviceCodePoll, AuthError> {
    let payload: TokenResponse = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(err) if status.is_success() => {
            return Err(AuthError::InvalidResponse(format!(
                "Malformed token response: {err}"
            )));
        }
        Err(_) => {
            return Err(AuthError::InvalidResponse(format!(
                "Token request failed with status {status}"
            )));
        }
    };
    if let Some(code) = payload.error.clone() {
        return match code.parse::<OAuthErrorCode>() {
            Ok(known) => Ok(known.poll_outcome()),
            Err(_) => Err(AuthError::OAuth {
                code,
                description: payload.error_description,
            }),
        };
    }
    if !status.is_success() {
        return Err(AuthError::InvalidResponse(format!(
            "Token request failed with status {status}"
        )));
    }
    if payload.access_token.is_none() {
        return Err(AuthError::InvalidResponse(
            "Token response missing access_token and error".to_string(),
        ));
    }
    let credential = payload
        .into_credential(now_ms, None)
        .map_err(AuthError::InvalidResponse)?;
    Ok(DeviceCodePoll::Authorized { credential })
}

fn describe_error_body(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        error_description: Option<String>,
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(code),
            error_description: Some(desc),
        }) => format!("{code}: {desc}"),
        Ok(ErrorBody {
            error: Some(code), ..
        }) => code,
        _ if body.trim().is_empty() => "empty body".to_string(),
        _ => "unparseable body".to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
