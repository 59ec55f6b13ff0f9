#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use tokenkeeper::auth::{
    AuthError, AuthPresenter, Credential, CredentialStore, DeviceFlowSession, PollEvent,
    PollPolicy,
};
use tokenkeeper::config::AuthConfig;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
    saves: Mutex<u32>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(credential: Credential) -> Self {
        let store = Self::default();
        *store.credential.lock().expect("store lock poisoned") = Some(credential);
        store
    }

    pub fn get(&self) -> Option<Credential> {
        self.credential.lock().expect("store lock poisoned").clone()
    }

    pub fn save_count(&self) -> u32 {
        *self.saves.lock().expect("store lock poisoned")
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Option<Credential> {
        self.get()
    }

    fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        *self.credential.lock().expect("store lock poisoned") = Some(credential.clone());
        *self.saves.lock().expect("store lock poisoned") += 1;
        Ok(())
    }

    fn delete(&self) -> Result<(), AuthError> {
        self.credential.lock().expect("store lock poisoned").take();
        Ok(())
    }
}

/// Presenter that records what the manager asked it to show.
#[derive(Default)]
pub struct RecordingPresenter {
    pub instructions: Mutex<Vec<String>>,
    pub opened: Mutex<Vec<String>>,
    pub events: Mutex<Vec<PollEvent>>,
    pub fail_browser: bool,
}

impl RecordingPresenter {
    pub fn failing_browser() -> Self {
        Self {
            fail_browser: true,
            ..Self::default()
        }
    }
}

impl AuthPresenter for RecordingPresenter {
    fn show_instructions(&self, session: &DeviceFlowSession) {
        self.instructions
            .lock()
            .expect("presenter lock poisoned")
            .push(session.user_code.clone());
    }

    fn open_browser(&self, url: &str) -> Result<(), AuthError> {
        self.opened
            .lock()
            .expect("presenter lock poisoned")
            .push(url.to_string());
        if self.fail_browser {
            return Err(AuthError::Io("no browser available".to_string()));
        }
        Ok(())
    }

    fn on_poll_event(&self, event: PollEvent) {
        self.events
            .lock()
            .expect("presenter lock poisoned")
            .push(event);
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn credential(access_token: &str, expiry_date: i64) -> Credential {
    Credential {
        access_token: access_token.to_string(),
        refresh_token: Some("old-refresh".to_string()),
        token_type: "Bearer".to_string(),
        resource_url: Some("old.example.com".to_string()),
        expiry_date,
    }
}

pub fn fast_policy() -> PollPolicy {
    PollPolicy::builder()
        .max_attempts(5)
        .initial_interval(Duration::from_millis(1))
        .max_interval(Duration::from_millis(2))
        .build()
}

pub fn test_config(base_url: &str) -> AuthConfig {
    AuthConfig::default()
        .with_base_url(base_url)
        .with_client_id("test-client")
        .with_poll_policy(fast_policy())
}
