//! Refresh-vs-reauthenticate orchestration over the store and device flow.

use std::sync::Arc;

use super::credential::{now_millis, Credential, CredentialStatus};
use super::device_flow::{DeviceAuthorization, DeviceFlowClient};
use super::error::AuthError;
use super::poll::{PollEventSink, PollLoop, PollPolicy};
use super::presenter::{AuthPresenter, SilentPresenter};
use super::store::{CredentialStore, FileCredentialStore};
use crate::config::AuthConfig;

/// Single entry point for obtaining a usable credential.
///
/// All I/O decisions (printing, prompting, exit codes) belong to the caller
/// through [`AuthPresenter`]; the manager returns typed results and errors.
///
/// # Example
/// ```no_run
/// use tokenkeeper::auth::TokenLifecycleManager;
/// use tokenkeeper::config::AuthConfig;
///
/// # async fn example() -> Result<(), tokenkeeper::auth::AuthError> {
/// let manager = TokenLifecycleManager::from_config(&AuthConfig::from_env());
/// let credential = manager.get_valid_credential().await?;
/// println!("{}", credential.access_token);
/// # Ok(())
/// # }
/// ```
pub struct TokenLifecycleManager {
    store: Arc<dyn CredentialStore>,
    client: Arc<dyn DeviceAuthorization>,
    presenter: Arc<dyn AuthPresenter>,
    policy: PollPolicy,
}

impl TokenLifecycleManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        client: Arc<dyn DeviceAuthorization>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            store,
            client,
            presenter: Arc::new(SilentPresenter),
            policy,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            Arc::new(FileCredentialStore::new(config.credentials_path.clone())),
            Arc::new(DeviceFlowClient::new(config)),
            config.poll.clone(),
        )
    }

    pub fn with_presenter(mut self, presenter: Arc<dyn AuthPresenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Stored credential if still valid, else a refreshed one, else the
    /// result of a full device flow. A failed refresh falls back to the
    /// device flow once.
    pub async fn get_valid_credential(&self) -> Result<Credential, AuthError> {
        let stored = self.store.load();
        if let Some(credential) = stored.as_ref().filter(|c| c.is_valid_at(now_millis())) {
            tracing::debug!("Using stored credential");
            return Ok(credential.clone());
        }

        if let Some(credential) = stored.as_ref().filter(|c| c.has_refresh_token()) {
            match self.client.refresh(credential).await {
                Ok(refreshed) => {
                    self.store.save(&refreshed)?;
                    tracing::info!("Refreshed access token");
                    return Ok(refreshed);
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "Token refresh failed, starting device authorization"
                    );
                }
            }
        }

        self.authenticate().await
    }

    /// Run a full device flow regardless of what is stored.
    pub async fn authenticate(&self) -> Result<Credential, AuthError> {
        let session = self.client.initiate().await?;
        tracing::info!(user_code = %session.user_code, "Device authorization started");

        self.presenter.show_instructions(&session);
        if let Err(err) = self.presenter.open_browser(session.verification_url()) {
            tracing::warn!(error = %err, "Could not open browser");
        }

        let presenter = self.presenter.clone();
        let sink: PollEventSink = Arc::new(move |event| presenter.on_poll_event(event));
        let credential = PollLoop::new(self.client.as_ref(), self.policy.clone())
            .with_event_sink(sink)
            .run(&session)
            .await?;

        self.store.save(&credential)?;
        Ok(credential)
    }

    /// Inspect the stored credential without network calls or writes.
    pub fn check_status(&self) -> CredentialStatus {
        CredentialStatus::evaluate(self.store.load(), now_millis())
    }

    /// Remove the stored credential. Never fails; errors are logged.
    pub fn clear(&self) {
        if let Err(err) = self.store.delete() {
            tracing::warn!(error = %err, "Failed to remove stored credential");
        }
    }
}
