//! Product catalog: fetching, filtering and admin mutations.
//!
//! [`CatalogService`] is the stateless network half. [`Catalog`] owns the
//! fetched product list plus the active category and search text, and keeps
//! the list in step with successful admin mutations.

pub mod debounce;
pub mod filter;

use thiserror::Error;
use tracing::{info, instrument};

use stealth_core::{Price, ProductId};

use crate::api::decode::{ListShape, ObjectShape, decode_list, decode_object};
use crate::api::{ApiClient, ApiError, ApiRequest, endpoints};
use crate::models::{HomeScreenData, NewProduct, Product};

pub use debounce::{Debouncer, SEARCH_DEBOUNCE};

const PRODUCT_LIST_SHAPES: &[ListShape] = &[
    ListShape::Envelope("products"),
    ListShape::BareArray,
    ListShape::Empty,
];

const PRODUCT_SHAPES: &[ObjectShape] = &[ObjectShape::Envelope("product"), ObjectShape::Bare];

// =============================================================================
// Errors
// =============================================================================

/// A product form field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductFormError {
    #[error("Product name is required")]
    MissingName,
    #[error("Product description is required")]
    MissingDescription,
    #[error("Valid price is required")]
    InvalidPrice,
    #[error("Category is required")]
    MissingCategory,
    #[error("Valid stock quantity is required")]
    InvalidStock,
    #[error("Image URL is required")]
    MissingImageUrl,
}

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    InvalidForm(#[from] ProductFormError),

    #[error("failed to load products: {0}")]
    Load(#[source] ApiError),

    #[error("failed to create product: {0}")]
    Create(#[source] ApiError),

    #[error("failed to delete product: {0}")]
    Delete(#[source] ApiError),

    #[error("failed to load home screen: {0}")]
    Home(#[source] ApiError),
}

impl CatalogError {
    /// The underlying API error, if the failure came from the backend.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::InvalidForm(_) => None,
            Self::Load(e) | Self::Create(e) | Self::Delete(e) | Self::Home(e) => Some(e),
        }
    }

    /// Shopper-facing description of what was being attempted.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::InvalidForm(_) => "Invalid product",
            Self::Load(_) => "Failed to load products",
            Self::Create(_) => "Failed to create product",
            Self::Delete(_) => "Failed to delete product",
            Self::Home(_) => "Failed to load home screen",
        }
    }
}

// =============================================================================
// Product form
// =============================================================================

/// Raw admin input for a new product, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub stock: String,
    pub image_url: String,
}

impl ProductForm {
    /// Check every field and build the request body.
    ///
    /// Fields are checked in form order and the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the [`ProductFormError`] for the first invalid field.
    pub fn validate(&self) -> Result<NewProduct, ProductFormError> {
        let name = required(&self.name).ok_or(ProductFormError::MissingName)?;
        let description = required(&self.description).ok_or(ProductFormError::MissingDescription)?;
        let price = Price::parse(&self.price).map_err(|_| ProductFormError::InvalidPrice)?;
        let category = required(&self.category).ok_or(ProductFormError::MissingCategory)?;
        let stock = self
            .stock
            .trim()
            .parse::<u32>()
            .map_err(|_| ProductFormError::InvalidStock)?;
        let image_url = required(&self.image_url).ok_or(ProductFormError::MissingImageUrl)?;

        Ok(NewProduct {
            name,
            description,
            price,
            category,
            stock,
            image_url: Some(image_url),
        })
    }
}

fn required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// =============================================================================
// CatalogService
// =============================================================================

/// Network operations on products and the home aggregate.
#[derive(Debug, Clone)]
pub struct CatalogService {
    api: ApiClient,
}

impl CatalogService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /products`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        let raw = self
            .api
            .execute(ApiRequest::get([endpoints::PRODUCTS]))
            .await?;
        Ok(decode_list::<Product>(&raw.body, PRODUCT_LIST_SHAPES)?.items)
    }

    /// `GET /products?category=...`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn fetch_products_by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        let request = ApiRequest::get([endpoints::PRODUCTS]).query("category", category);
        let raw = self.api.execute(request).await?;
        Ok(decode_list::<Product>(&raw.body, PRODUCT_LIST_SHAPES)?.items)
    }

    /// `POST /products`, returning the stored product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not decode.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        let raw = self
            .api
            .execute(ApiRequest::post([endpoints::PRODUCTS]).json(product)?)
            .await?;
        let (created, _) = decode_object::<Product>(&raw.body, PRODUCT_SHAPES)?;
        Ok(created)
    }

    /// `DELETE /products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.api
            .send_empty(ApiRequest::delete([endpoints::PRODUCTS, id.as_str()]))
            .await
    }

    /// `GET /home`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn fetch_home(&self) -> Result<HomeScreenData, ApiError> {
        self.api.request(ApiRequest::get([endpoints::HOME])).await
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// The fetched product list and the shopper's current filters.
#[derive(Debug)]
pub struct Catalog {
    service: CatalogService,
    products: Vec<Product>,
    category: Option<String>,
    query: String,
    debouncer: Debouncer,
}

impl Catalog {
    #[must_use]
    pub fn new(service: CatalogService) -> Self {
        Self {
            service,
            products: Vec::new(),
            category: None,
            query: String::new(),
            debouncer: Debouncer::default(),
        }
    }

    /// The network half, for calls that do not touch local state.
    #[must_use]
    pub const fn service(&self) -> &CatalogService {
        &self.service
    }

    /// Replace the local list with every product.
    ///
    /// On failure the previous list is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Load`] if the fetch fails.
    pub async fn load(&mut self) -> Result<&[Product], CatalogError> {
        self.products = self
            .service
            .fetch_products()
            .await
            .map_err(CatalogError::Load)?;
        info!(count = self.products.len(), "Loaded products");
        Ok(&self.products)
    }

    /// Replace the local list with the products of one category, as filtered
    /// by the server.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Load`] if the fetch fails.
    pub async fn load_category(&mut self, category: &str) -> Result<&[Product], CatalogError> {
        self.products = self
            .service
            .fetch_products_by_category(category)
            .await
            .map_err(CatalogError::Load)?;
        info!(category, count = self.products.len(), "Loaded category");
        Ok(&self.products)
    }

    /// Every loaded product, unfiltered.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a loaded product.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Set or clear the active category filter.
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category.filter(|c| !c.trim().is_empty());
    }

    /// Set the active search text.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Set the search text from live input once it has stayed unchanged for
    /// [`SEARCH_DEBOUNCE`].
    ///
    /// Returns `false`, leaving the query as it was, if newer input arrived
    /// through [`Self::search_debouncer`] while waiting.
    pub async fn set_query_debounced(&mut self, query: impl Into<String>) -> bool {
        let debouncer = self.debouncer.clone();
        match debouncer.settle(query.into()).await {
            Some(query) => {
                self.query = query;
                true
            }
            None => false,
        }
    }

    /// Handle shared with [`Self::set_query_debounced`], for input sources
    /// that settle keystrokes on their own task.
    #[must_use]
    pub fn search_debouncer(&self) -> Debouncer {
        self.debouncer.clone()
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Loaded products matching the active category and search text.
    #[must_use]
    pub fn visible(&self) -> Vec<&Product> {
        filter::apply(&self.products, self.category.as_deref(), &self.query)
    }

    /// Loaded products matching `query`, ignoring the active filters.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Product> {
        filter::search(&self.products, query)
    }

    /// Loaded products in `category`, ignoring the active filters.
    #[must_use]
    pub fn filter_by_category(&self, category: &str) -> Vec<&Product> {
        filter::by_category(&self.products, category)
    }

    /// Distinct category tags of the loaded products, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        filter::categories(&self.products)
    }

    /// Validate `form`, create the product and append it to the local list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidForm`] without any network call if the
    /// form is invalid, or [`CatalogError::Create`] if the server rejects it.
    pub async fn create_product(&mut self, form: &ProductForm) -> Result<Product, CatalogError> {
        let new_product = form.validate()?;
        let created = self
            .service
            .create_product(&new_product)
            .await
            .map_err(CatalogError::Create)?;
        info!(product_id = %created.id, "Created product");
        self.products.push(created.clone());
        Ok(created)
    }

    /// Delete a product, removing it locally only once the server confirms.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Delete`] if the server rejects the delete; the
    /// local list is left untouched.
    pub async fn delete_product(&mut self, id: &ProductId) -> Result<(), CatalogError> {
        self.service
            .delete_product(id)
            .await
            .map_err(CatalogError::Delete)?;
        self.products.retain(|p| &p.id != id);
        info!(product_id = %id, "Deleted product");
        Ok(())
    }

    /// Fetch the landing page aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Home`] if the fetch fails.
    pub async fn fetch_home(&self) -> Result<HomeScreenData, CatalogError> {
        self.service.fetch_home().await.map_err(CatalogError::Home)
    }
}
