//! Bounded device-code polling with slow-down backoff.

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use strum::Display;

use super::credential::Credential;
use super::device_code::{DeviceCodePoll, DeviceFlowSession};
use super::device_flow::DeviceAuthorization;
use super::error::AuthError;

/// Polling limits. Defaults: 60 attempts, 5s start, ×1.5 on `slow_down`,
/// capped at 10s.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokenkeeper::auth::PollPolicy;
///
/// let policy = PollPolicy::builder()
///     .max_attempts(10)
///     .initial_interval(Duration::from_millis(10))
///     .build();
/// assert_eq!(policy.growth_factor, 1.5);
/// assert_eq!(policy.max_interval, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PollPolicy {
    #[builder(default = 60)]
    pub max_attempts: u32,
    #[builder(default = Duration::from_millis(5_000))]
    pub initial_interval: Duration,
    #[builder(default = 1.5)]
    pub growth_factor: f64,
    #[builder(default = Duration::from_millis(10_000))]
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PollPolicy {
    fn slowed(&self, interval: Duration) -> Duration {
        let grown = Duration::from_secs_f64(interval.as_secs_f64() * self.growth_factor);
        grown.min(self.max_interval.max(interval))
    }
}

/// Poll loop state; the last four are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PollState {
    Pending,
    Slowing,
    Succeeded,
    Denied,
    Expired,
    TimedOut,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Slowing)
    }
}

/// Progress notification. `wait` is the delay before the next attempt
/// (zero for terminal states).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollEvent {
    pub attempt: u32,
    pub state: PollState,
    pub wait: Duration,
}

pub type PollEventSink = Arc<dyn Fn(PollEvent) + Send + Sync>;

/// Drives `exchange_device_code` until a terminal outcome.
pub struct PollLoop<'a> {
    client: &'a dyn DeviceAuthorization,
    policy: PollPolicy,
    event_sink: Option<PollEventSink>,
}

impl<'a> PollLoop<'a> {
    pub fn new(client: &'a dyn DeviceAuthorization, policy: PollPolicy) -> Self {
        Self {
            client,
            policy,
            event_sink: None,
        }
    }

    pub fn with_event_sink(mut self, sink: PollEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Poll until the user approves, denies, the code expires, or
    /// `max_attempts` is exhausted.
    pub async fn run(&self, session: &DeviceFlowSession) -> Result<Credential, AuthError> {
        let max_attempts = self.policy.max_attempts;
        let mut interval = self.starting_interval(session);

        for attempt in 1..=max_attempts {
            let state = match self.client.exchange_device_code(session).await {
                Ok(DeviceCodePoll::Authorized { credential }) => {
                    tracing::info!(attempt, "Device authorization approved");
                    self.emit(attempt, PollState::Succeeded, Duration::ZERO);
                    return Ok(credential);
                }
                Ok(DeviceCodePoll::Pending) => PollState::Pending,
                Ok(DeviceCodePoll::SlowDown) => {
                    interval = self.policy.slowed(interval);
                    tracing::debug!(
                        attempt,
                        interval_ms = interval.as_millis() as u64,
                        "Server requested slow down"
                    );
                    PollState::Slowing
                }
                Ok(DeviceCodePoll::Expired) => {
                    return Err(self.terminate(attempt, AuthError::DeviceCodeExpired));
                }
                Ok(DeviceCodePoll::AccessDenied) => {
                    return Err(self.terminate(attempt, AuthError::AuthorizationDenied));
                }
                Err(err) if err.is_terminal() => {
                    return Err(self.terminate(attempt, err.into_terminal()));
                }
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "Transient device-code poll failure");
                    PollState::Pending
                }
            };

            if attempt == max_attempts {
                break;
            }
            self.emit(attempt, state, interval);
            tokio::time::sleep(interval).await;
        }

        self.emit(max_attempts, PollState::TimedOut, Duration::ZERO);
        Err(AuthError::AuthenticationTimeout {
            attempts: max_attempts,
        })
    }

    fn starting_interval(&self, session: &DeviceFlowSession) -> Duration {
        session
            .interval_secs
            .map(Duration::from_secs)
            .filter(|server| *server > self.policy.initial_interval)
            .unwrap_or(self.policy.initial_interval)
    }

    fn terminate(&self, attempt: u32, err: AuthError) -> AuthError {
        let state = match err {
            AuthError::DeviceCodeExpired => PollState::Expired,
            AuthError::AuthorizationDenied => PollState::Denied,
            _ => PollState::TimedOut,
        };
        tracing::info!(attempt, %state, "Device authorization ended");
        self.emit(attempt, state, Duration::ZERO);
        err
    }

    fn emit(&self, attempt: u32, state: PollState, wait: Duration) {
        if let Some(sink) = &self.event_sink {
            sink(PollEvent {
                attempt,
                state,
                wait,
            });
        }
    }
}
