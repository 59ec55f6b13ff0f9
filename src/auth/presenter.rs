//! Display seam for the interactive part of the device flow.

use super::device_code::DeviceFlowSession;
use super::error::AuthError;
use super::poll::PollEvent;

/// Shows instructions to the user while the manager drives the flow.
///
/// The library never prints; the CLI supplies a console implementation.
pub trait AuthPresenter: Send + Sync {
    fn show_instructions(&self, session: &DeviceFlowSession);

    /// Best effort. Errors are logged by the caller, never fatal.
    fn open_browser(&self, url: &str) -> Result<(), AuthError>;

    fn on_poll_event(&self, _event: PollEvent) {}
}

/// Presenter that shows nothing and never opens a browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPresenter;

impl AuthPresenter for SilentPresenter {
    fn show_instructions(&self, _session: &DeviceFlowSession) {}

    fn open_browser(&self, _url: &str) -> Result<(), AuthError> {
        Ok(())
    }
}
