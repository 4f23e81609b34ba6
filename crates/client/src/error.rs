//! Error types surfaced by the [`crate::Storefront`] root.
//!
//! Each service has its own error enum; [`StoreError`] unifies them for
//! callers that drive the whole store, and [`StoreError::user_message`] picks
//! the text a shopper should see.

use thiserror::Error;

use crate::accounts::AccountError;
use crate::api::ApiError;
use crate::catalog::CatalogError;
use crate::session::SessionError;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please log in to place an order")]
    NotLoggedIn,

    #[error("Please complete the shipping address (missing: {})", .0.join(", "))]
    IncompleteAddress(Vec<&'static str>),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Any error from a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation needs a logged-in user.
    #[error("Not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl StoreError {
    /// Text suitable for showing to a shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e)
            | Self::Checkout(CheckoutError::Api(e))
            | Self::Account(AccountError::Api(e)) => e.user_message(),
            Self::Catalog(e) => match e.api_error() {
                Some(api) => format!("{}: {}", e.action(), api.user_message()),
                None => e.to_string(),
            },
            Self::Session(_) => "Could not access the saved session".to_string(),
            Self::NotLoggedIn
            | Self::Account(_)
            | Self::Checkout(_) => self.to_string(),
        }
    }
}
