//! tokenkeeper CLI binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use tokenkeeper::auth::TokenLifecycleManager;
use tokenkeeper::cli::auth::ConsolePresenter;
use tokenkeeper::cli::Cli;
use tokenkeeper::config::AuthConfig;
use tracing_subscriber::EnvFilter;

const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing();

    let config = AuthConfig::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    let manager = TokenLifecycleManager::from_config(&config)
        .with_presenter(Arc::new(ConsolePresenter::new(cli.quiet)));

    // Dropping the flow on Ctrl+C aborts any in-flight wait; nothing partial
    // is persisted.
    tokio::select! {
        result = tokenkeeper::cli::auth::run(cli.command(), cli.quiet, &manager) => match result {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
