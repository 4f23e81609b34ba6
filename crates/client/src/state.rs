//! Application state root.
//!
//! [`Storefront`] owns every piece of client state (session, cart, catalog,
//! order history) and the services that talk to the backend. It is built
//! once and passed explicitly; there are no globals.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use stealth_core::{CartLineId, ProductId};

use crate::accounts::AccountService;
use crate::api::{ApiClient, ApiError};
use crate::cart::{Cart, CartLine};
use crate::catalog::{Catalog, CatalogError, CatalogService, ProductForm};
use crate::config::ClientConfig;
use crate::error::{CheckoutError, StoreError};
use crate::events::{EventBus, StoreEvent};
use crate::models::{Address, HomeScreenData, Product, RegisterUser, UserRecord, UserUpdate};
use crate::orders::{OrderCreated, OrderHistory, OrderService};
use crate::session::{SessionError, SessionStore};

/// The storefront client.
#[derive(Debug)]
pub struct Storefront {
    api: ApiClient,
    accounts: AccountService,
    orders: OrderService,
    catalog: Catalog,
    cart: Cart,
    history: OrderHistory,
    session: Arc<dyn SessionStore>,
    current_user: Option<UserRecord>,
    admin: bool,
    events: EventBus,
}

impl Storefront {
    /// Create a storefront for `config`, persisting sessions to `session`.
    ///
    /// Nothing is loaded yet; call [`Self::restore_session`] to pick up a
    /// previous login.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(config)?;

        Ok(Self {
            accounts: AccountService::new(api.clone()),
            orders: OrderService::new(api.clone(), config.order_page_size),
            catalog: Catalog::new(CatalogService::new(api.clone())),
            cart: Cart::new(),
            history: OrderHistory::new(config.order_page_size),
            session,
            current_user: None,
            admin: false,
            events: EventBus::default(),
            api,
        })
    }

    /// The shared HTTP client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not answer with a success status.
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.api.ping().await
    }

    /// Receive [`StoreEvent`]s published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Load the persisted user, if any.
    ///
    /// A record that no longer decodes is discarded and treated as logged out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if storage cannot be accessed.
    pub fn restore_session(&mut self) -> Result<Option<&UserRecord>, SessionError> {
        let user = match self.session.load() {
            Ok(user) => user,
            Err(SessionError::Corrupt(e)) => {
                warn!(error = %e, "Discarding unreadable session");
                self.session.clear()?;
                None
            }
            Err(e) => return Err(e),
        };

        if let Some(user) = &user {
            info!(user_id = %user.id, "Restored session");
        }
        self.current_user = user;
        self.events.publish(StoreEvent::SessionChanged);
        Ok(self.current_user.as_ref())
    }

    /// Register a new account and log in as it.
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails or the session cannot be saved.
    pub async fn register(&mut self, registration: &RegisterUser) -> Result<&UserRecord, StoreError> {
        let user = self.accounts.register(registration).await?;
        self.start_session(user)
    }

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the session cannot
    /// be saved.
    pub async fn login(&mut self, email: &str, password: SecretString) -> Result<&UserRecord, StoreError> {
        let user = self.accounts.login(email, password).await?;
        self.start_session(user)
    }

    fn start_session(&mut self, user: UserRecord) -> Result<&UserRecord, StoreError> {
        self.session.save(&user)?;
        if self
            .current_user
            .as_ref()
            .is_some_and(|previous| previous.id != user.id)
        {
            self.history.reset();
        }
        self.current_user = Some(user);
        self.events.publish(StoreEvent::SessionChanged);
        self.current_user.as_ref().ok_or(StoreError::NotLoggedIn)
    }

    /// Forget the user: clears the stored session, the cart, the order
    /// history and the admin flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed. In-memory
    /// state is cleared regardless.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        let cleared = self.session.clear();

        if let Some(user) = self.current_user.take() {
            info!(user_id = %user.id, "Logged out");
        }
        self.admin = false;
        self.history.reset();
        self.cart.clear();

        self.events.publish(StoreEvent::SessionChanged);
        self.publish_cart();
        cleared
    }

    /// The logged-in user.
    #[must_use]
    pub const fn current_user(&self) -> Option<&UserRecord> {
        self.current_user.as_ref()
    }

    /// Whether the logged-in user may manage products.
    ///
    /// The backend's user record carries no role, so the flag is granted by
    /// the embedding application through [`Self::set_admin`].
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.admin && self.current_user.is_some()
    }

    /// Grant or revoke admin rights for the current session.
    pub fn set_admin(&mut self, admin: bool) {
        self.admin = admin;
    }

    /// Re-fetch the logged-in user from the backend and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotLoggedIn`] without a user, or any account or
    /// session error.
    pub async fn refresh_user(&mut self) -> Result<&UserRecord, StoreError> {
        let id = self.require_user()?.id.clone();
        let user = self.accounts.fetch_user(&id).await?;
        self.start_session(user)
    }

    /// Update the logged-in user's profile and persist the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotLoggedIn`] without a user, or any account or
    /// session error.
    pub async fn update_profile(&mut self, update: &UserUpdate) -> Result<&UserRecord, StoreError> {
        let id = self.require_user()?.id.clone();
        let user = self.accounts.update_user(&id, update).await?;
        self.start_session(user)
    }

    fn require_user(&self) -> Result<&UserRecord, StoreError> {
        self.current_user.as_ref().ok_or(StoreError::NotLoggedIn)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add `quantity` units of `product`, keeping the line within
    /// `[1, stock]` (at most 1 when stock is 0).
    ///
    /// Returns the affected line, or `None` if `quantity` is not positive.
    pub fn add_to_cart(&mut self, product: &Product, quantity: i64) -> Option<CartLineId> {
        if quantity <= 0 {
            return None;
        }
        let limit = stock_limit(product);
        let existing = self
            .cart
            .line_for_product(&product.id)
            .map_or(0, |line| i64::from(line.quantity));
        let allowed = quantity.min(limit - existing);

        if allowed <= 0 {
            // Already at the stock limit.
            return self.cart.line_for_product(&product.id).map(|line| line.id);
        }
        let id = self.cart.add(product, allowed);
        self.publish_cart();
        id
    }

    /// Set a line's quantity, clamped to `[1, stock]` (1 when stock is 0).
    ///
    /// Returns `false` if the line does not exist.
    pub fn update_quantity(&mut self, line_id: CartLineId, quantity: i64) -> bool {
        let Some(limit) = self.cart.line(line_id).map(|line| stock_limit(&line.product)) else {
            return false;
        };
        let updated = self.cart.update_quantity(line_id, quantity.clamp(1, limit));
        self.publish_cart();
        updated
    }

    /// Remove a line from the cart.
    pub fn remove_line(&mut self, line_id: CartLineId) -> Option<CartLine> {
        let removed = self.cart.remove(line_id);
        if removed.is_some() {
            self.publish_cart();
        }
        removed
    }

    fn publish_cart(&self) {
        self.events.publish(StoreEvent::CartChanged {
            item_count: self.cart.item_count(),
        });
    }

    /// Place an order for the cart's contents.
    ///
    /// The cart is cleared only once the server accepts the order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::IncompleteAddress`] or
    /// [`CheckoutError::NotLoggedIn`] before any request is made, or the
    /// server's error verbatim.
    #[instrument(skip(self, shipping_address), fields(lines = self.cart.lines().len()))]
    pub async fn checkout(&mut self, shipping_address: &Address) -> Result<OrderCreated, CheckoutError> {
        let missing = shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::IncompleteAddress(missing));
        }
        let user_id = self
            .current_user
            .as_ref()
            .map(|user| user.id.clone())
            .ok_or(CheckoutError::NotLoggedIn)?;

        let created = self
            .orders
            .create_order(&user_id, self.cart.lines(), shipping_address)
            .await?;

        self.cart.clear();
        self.publish_cart();
        self.events.publish(StoreEvent::OrderPlaced {
            order_id: created.order_id().clone(),
        });
        Ok(created)
    }

    // =========================================================================
    // Order history
    // =========================================================================

    #[must_use]
    pub const fn order_history(&self) -> &OrderHistory {
        &self.history
    }

    /// Reload the first page of the user's order history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotLoggedIn`] without a user, or the fetch error
    /// (also recorded in the history's phase).
    pub async fn refresh_orders(&mut self) -> Result<&OrderHistory, StoreError> {
        let user_id = self.require_user()?.id.clone();
        let request = self.history.begin_refresh();
        match self.orders.fetch_order_history(&user_id, request.page).await {
            Ok(response) => {
                self.history.apply(request, response);
                Ok(&self.history)
            }
            Err(e) => {
                self.history.fail(request, &e);
                Err(e.into())
            }
        }
    }

    /// Load the next page of order history.
    ///
    /// Returns `Ok(false)` without a request when there is no next page or a
    /// load is already in flight.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotLoggedIn`] without a user, or the fetch error.
    pub async fn load_next_orders_page(&mut self) -> Result<bool, StoreError> {
        let user_id = self.require_user()?.id.clone();
        let Some(request) = self.history.begin_next_page() else {
            return Ok(false);
        };
        match self.orders.fetch_order_history(&user_id, request.page).await {
            Ok(response) => Ok(self.history.apply(request, response)),
            Err(e) => {
                self.history.fail(request, &e);
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Mutable access for filter changes.
    pub const fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Fetch every product into the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Load`] if the fetch fails.
    pub async fn load_products(&mut self) -> Result<&[Product], CatalogError> {
        self.catalog.load().await
    }

    /// Fetch one category's products into the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Load`] if the fetch fails.
    pub async fn load_category(&mut self, category: &str) -> Result<&[Product], CatalogError> {
        self.catalog.load_category(category).await
    }

    /// Products matching `query` among those loaded.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Product> {
        self.catalog.search(query)
    }

    /// Products in `category` among those loaded.
    #[must_use]
    pub fn filter_by_category(&self, category: &str) -> Vec<&Product> {
        self.catalog.filter_by_category(category)
    }

    /// Sorted distinct categories of the loaded products.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.catalog.categories()
    }

    /// Validate and create a product.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request, or the server's error.
    pub async fn create_product(&mut self, form: &ProductForm) -> Result<Product, CatalogError> {
        self.catalog.create_product(form).await
    }

    /// Delete a product once the server confirms.
    ///
    /// # Errors
    ///
    /// Returns the server's error; the local list is then unchanged.
    pub async fn delete_product(&mut self, id: &ProductId) -> Result<(), CatalogError> {
        self.catalog.delete_product(id).await
    }

    /// Fetch the landing page aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Home`] if the fetch fails.
    pub async fn fetch_home(&self) -> Result<HomeScreenData, CatalogError> {
        self.catalog.fetch_home().await
    }
}

/// Upper bound for a line's quantity: the stock, but never below 1.
fn stock_limit(product: &Product) -> i64 {
    i64::from(product.stock.max(1))
}
