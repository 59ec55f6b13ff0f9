//! OAuth device-code flow with PKCE, credential storage, and lifecycle
//! decisions.

pub mod credential;
pub mod device_code;
pub mod device_flow;
pub mod error;
pub mod manager;
pub mod pkce;
pub mod poll;
pub mod presenter;
pub mod store;

pub use credential::{is_valid, Credential, CredentialStatus, EXPIRY_SKEW_MS};
pub use device_code::{DeviceCodePoll, DeviceFlowSession, OAuthErrorCode};
pub use device_flow::{DeviceAuthorization, DeviceFlowClient, TokenResponse};
pub use error::AuthError;
pub use manager::TokenLifecycleManager;
pub use poll::{PollEvent, PollEventSink, PollLoop, PollPolicy, PollState};
pub use presenter::{AuthPresenter, SilentPresenter};
pub use store::{CredentialStore, FileCredentialStore};
