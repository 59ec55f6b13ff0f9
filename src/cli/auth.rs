//! CLI handlers for authenticate, check, and clear.

use std::io::Write;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;

use super::Commands;
use crate::auth::{
    AuthError, AuthPresenter, Credential, CredentialStatus, DeviceFlowSession, PollEvent,
    TokenLifecycleManager,
};

/// Dispatch a parsed command.
pub async fn run(
    command: Commands,
    quiet: bool,
    manager: &TokenLifecycleManager,
) -> Result<ExitCode, AuthError> {
    match command {
        Commands::Authenticate => handle_authenticate(manager, quiet).await,
        Commands::Check => Ok(handle_check(manager, quiet)),
        Commands::Clear => Ok(handle_clear(manager, quiet)),
    }
}

/// Handle `tokenkeeper authenticate`.
pub async fn handle_authenticate(
    manager: &TokenLifecycleManager,
    quiet: bool,
) -> Result<ExitCode, AuthError> {
    let credential = manager.get_valid_credential().await?;
    println!("{}", render_authenticated(&credential, quiet));
    Ok(ExitCode::SUCCESS)
}

/// Handle `tokenkeeper check`. Exits non-zero without a valid credential.
pub fn handle_check(manager: &TokenLifecycleManager, quiet: bool) -> ExitCode {
    let status = manager.check_status();
    if let Some(line) = render_status(&status, quiet) {
        println!("{line}");
    }
    match status {
        CredentialStatus::Valid(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Handle `tokenkeeper clear`.
pub fn handle_clear(manager: &TokenLifecycleManager, quiet: bool) -> ExitCode {
    manager.clear();
    if !quiet {
        println!("✅ Stored credentials cleared");
    }
    ExitCode::SUCCESS
}

pub fn render_authenticated(credential: &Credential, quiet: bool) -> String {
    if quiet {
        return credential.access_token.clone();
    }
    let mut out = format!("✅ Authenticated (expires {})", format_expiry(credential));
    if let Some(resource) = &credential.resource_url {
        out.push_str(&format!("\n   Resource: {resource}"));
    }
    out.push_str(&format!("\n   Access token: {}", credential.access_token));
    out
}

pub fn render_status(status: &CredentialStatus, quiet: bool) -> Option<String> {
    match (status, quiet) {
        (CredentialStatus::Valid(credential), true) => Some(credential.access_token.clone()),
        (_, true) => None,
        (CredentialStatus::Absent, false) => Some("❌ No stored credentials".to_string()),
        (CredentialStatus::Valid(credential), false) => Some(format!(
            "✅ Valid (expires {})",
            format_expiry(credential)
        )),
        (CredentialStatus::Expired(credential), false) => {
            let refresh = if credential.has_refresh_token() {
                "refresh token available"
            } else {
                "no refresh token"
            };
            Some(format!(
                "⚠️  Expired at {} ({refresh})",
                format_expiry(credential)
            ))
        }
    }
}

fn format_expiry(credential: &Credential) -> String {
    credential
        .expires_at()
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Console presenter: instructions and progress go to stderr so stdout only
/// ever carries the result.
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    quiet: bool,
    progress_shown: AtomicBool,
}

impl ConsolePresenter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            progress_shown: AtomicBool::new(false),
        }
    }
}

impl AuthPresenter for ConsolePresenter {
    fn show_instructions(&self, session: &DeviceFlowSession) {
        // Shown even in quiet mode: the flow cannot finish without it.
        eprintln!("🔗 Visit: {}", session.verification_url());
        eprintln!("📋 Enter code: {}", session.user_code);
        if !self.quiet {
            eprintln!("⏳ Waiting for authorization...");
        }
    }

    fn open_browser(&self, url: &str) -> Result<(), AuthError> {
        open::that(url).map_err(|err| AuthError::Io(format!("cannot open {url}: {err}")))
    }

    fn on_poll_event(&self, event: PollEvent) {
        if self.quiet {
            return;
        }
        if event.state.is_terminal() {
            if self.progress_shown.swap(false, Ordering::Relaxed) {
                eprintln!();
            }
            return;
        }
        self.progress_shown.store(true, Ordering::Relaxed);
        eprint!(".");
        let _ = std::io::stderr().flush();
    }
}
