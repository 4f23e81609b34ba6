//! Command implementations.
//!
//! Every command opens its own [`Storefront`] from the environment, restores
//! the saved session and prints results to stdout. Diagnostics go through
//! `tracing` to stderr.

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use stealth_client::{
    AccountError, ApiError, CatalogError, CheckoutError, ClientConfig, ConfigError,
    FileSessionStore, SessionError, StoreError, Storefront,
};
use thiserror::Error;

pub mod account;
pub mod orders;
pub mod products;
pub mod system;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid command-line input.
    #[error("{0}")]
    Usage(String),

    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        Self::Store(e.into())
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        Self::Store(e.into())
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        Self::Store(e.into())
    }
}

impl From<AccountError> for CliError {
    fn from(e: AccountError) -> Self {
        Self::Store(e.into())
    }
}

impl From<CheckoutError> for CliError {
    fn from(e: CheckoutError) -> Self {
        Self::Store(e.into())
    }
}

/// Print the shopper-facing message for a failed command.
#[allow(clippy::print_stderr)]
pub fn report_failure(error: &CliError) {
    match error {
        CliError::Store(e) => eprintln!("Error: {}", e.user_message()),
        _ => eprintln!("Error: {error}"),
    }
}

/// Build a storefront from the environment and restore the saved session.
fn open_store() -> Result<Storefront, CliError> {
    let config = ClientConfig::from_env()?;
    tracing::debug!(base_url = %config.base_url, "Using backend");

    let session = Arc::new(FileSessionStore::new(&config.session_dir));
    let mut store = Storefront::new(&config, session)?;
    store.restore_session()?;
    Ok(store)
}

/// Fail unless a user is logged in.
fn require_login(store: &Storefront) -> Result<(), CliError> {
    if store.current_user().is_none() {
        return Err(CliError::Usage(
            "Not logged in. Run `stealth login -e <email> -p <password>` first.".to_string(),
        ));
    }
    Ok(())
}
