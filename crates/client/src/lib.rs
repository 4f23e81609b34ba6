//! Stealth Commerce storefront client.
//!
//! A thin state-management layer over the storefront REST backend: login and
//! registration, product browsing, the cart, checkout and paginated order
//! history.
//!
//! # Modules
//!
//! - [`api`]: HTTP client, endpoint paths and lenient response decoding
//! - [`cart`]: in-memory cart with derived totals
//! - [`catalog`]: product fetching, filtering, search debounce, admin mutations
//! - [`orders`]: order submission and the history pagination state machine
//! - [`accounts`]: registration, login and profile
//! - [`session`]: persistence of the logged-in user
//! - [`events`]: typed change notifications
//! - [`state`]: the [`Storefront`] root that ties it together
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stealth_client::{ClientConfig, FileSessionStore, Storefront};
//!
//! let config = ClientConfig::from_env()?;
//! let session = Arc::new(FileSessionStore::new(&config.session_dir));
//! let mut store = Storefront::new(&config, session)?;
//! store.restore_session()?;
//! store.load_products().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod accounts;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod orders;
pub mod session;
pub mod state;

pub use accounts::{AccountError, AccountService};
pub use api::{ApiClient, ApiError};
pub use cart::{Cart, CartLine, SHIPPING_COST};
pub use catalog::{Catalog, CatalogError, CatalogService, ProductForm, ProductFormError};
pub use config::{ApiTarget, ClientConfig, ConfigError};
pub use error::{CheckoutError, StoreError};
pub use events::{EventBus, StoreEvent};
pub use orders::{OrderCreated, OrderHistory, OrderHistoryResponse, OrderService};
pub use session::{FileSessionStore, MemorySessionStore, SessionError, SessionStore};
pub use state::Storefront;
