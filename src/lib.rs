//! tokenkeeper: OAuth 2.0 device-flow credentials, kept fresh.
//!
//! Obtains an access token through the Device Authorization Grant with PKCE,
//! persists it to a single JSON file, and on later runs reuses, refreshes, or
//! re-acquires it as needed.
//!
//! # Quick Start
//!
//! ```no_run
//! use tokenkeeper::auth::TokenLifecycleManager;
//! use tokenkeeper::config::AuthConfig;
//!
//! # async fn example() -> Result<(), tokenkeeper::auth::AuthError> {
//! let manager = TokenLifecycleManager::from_config(&AuthConfig::from_env());
//! let credential = manager.get_valid_credential().await?;
//! println!("Bearer {}", credential.access_token);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;

#[cfg(feature = "cli")]
pub mod cli;
