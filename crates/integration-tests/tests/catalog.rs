//! Catalog fetching, filtering and admin mutations against the fake backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::{Value, json};
use stealth_client::{CatalogError, ProductForm, ProductFormError};
use stealth_core::ProductId;
use stealth_integration_tests::{FakeBackend, Method};

fn products() -> Value {
    json!([
        {"_id": "p1", "name": "Trail Runner", "description": "Grippy outsole", "price": 89.99,
         "category": "Footwear", "stock": 4, "imageUrl": "https://img/p1.png"},
        {"_id": "p2", "name": "Rain Jacket", "description": "Packs into its pocket", "price": 120,
         "category": "Outerwear", "stock": 0},
        {"_id": "p3", "name": "Wool Socks", "description": "Warm for trail days", "price": 12.5,
         "category": "footwear", "stock": 30}
    ])
}

fn form() -> ProductForm {
    ProductForm {
        name: "Sun Hat".into(),
        description: "Wide brim".into(),
        price: "24.00".into(),
        category: "Accessories".into(),
        stock: "7".into(),
        image_url: "https://img/hat.png".into(),
    }
}

#[tokio::test]
async fn test_load_products_bare_array() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::GET, "/products", 200, products());

    let mut store = backend.storefront();
    let loaded = store.load_products().await.unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].image_url.as_deref(), Some("https://img/p1.png"));
}

#[tokio::test]
async fn test_load_products_envelope() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::GET, "/products", 200, json!({"products": products()}));

    let mut store = backend.storefront();
    assert_eq!(store.load_products().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_category_fetch_sends_query() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::GET, "/products", 200, json!([]));

    let mut store = backend.storefront();
    store.load_category("Home & Garden").await.unwrap();

    let request = &backend.requests_to(&Method::GET, "/products")[0];
    assert_eq!(request.query_param("category"), Some("Home & Garden"));
}

#[tokio::test]
async fn test_filter_and_search_compose() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::GET, "/products", 200, products());

    let mut store = backend.storefront();
    store.load_products().await.unwrap();

    assert_eq!(store.filter_by_category("FOOTWEAR").len(), 2);
    assert_eq!(store.search("trail").len(), 2);
    assert_eq!(store.categories(), vec!["Footwear", "Outerwear"]);

    let catalog = store.catalog_mut();
    catalog.set_category(Some("footwear".to_string()));
    catalog.set_query("SOCKS");
    let visible = store.catalog().visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, ProductId::new("p3"));
}

#[tokio::test]
async fn test_load_failure_keeps_previous_list() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::GET, "/products", 200, products());
    backend.on_json(Method::GET, "/products", 500, json!({"error": "Database unavailable"}));

    let mut store = backend.storefront();
    store.load_products().await.unwrap();
    let err = store.load_products().await.unwrap_err();

    assert!(matches!(err, CatalogError::Load(_)));
    assert_eq!(err.api_error().unwrap().server_message(), Some("Database unavailable"));
    assert_eq!(store.catalog().products().len(), 3);
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let backend = FakeBackend::start().await;
    let mut store = backend.storefront();

    let mut bad = form();
    bad.price = "-5".into();
    let err = store.create_product(&bad).await.unwrap_err();

    assert!(matches!(err, CatalogError::InvalidForm(ProductFormError::InvalidPrice)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_create_product_appends() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::GET, "/products", 200, products());
    backend.on_json(
        Method::POST,
        "/products",
        201,
        json!({"_id": "p9", "name": "Sun Hat", "description": "Wide brim", "price": 24,
               "category": "Accessories", "stock": 7, "imageUrl": "https://img/hat.png"}),
    );

    let mut store = backend.storefront();
    store.load_products().await.unwrap();
    let created = store.create_product(&form()).await.unwrap();

    assert_eq!(created.id, ProductId::new("p9"));
    assert_eq!(store.catalog().products().len(), 4);
    assert!(store.catalog().product(&ProductId::new("p9")).is_some());

    let body = backend.requests_to(&Method::POST, "/products")[0].json();
    assert_eq!(body["price"], 24.0);
    assert_eq!(body["stock"], 7);
    assert_eq!(body["imageUrl"], "https://img/hat.png");
}

#[tokio::test]
async fn test_delete_removes_only_after_confirmation() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::GET, "/products", 200, products());
    backend.on_json(Method::DELETE, "/products/p1", 403, json!({"error": "Forbidden"}));
    backend.on(Method::DELETE, "/products/p2", 204, "");

    let mut store = backend.storefront();
    store.load_products().await.unwrap();

    let err = store.delete_product(&ProductId::new("p1")).await.unwrap_err();
    assert!(matches!(err, CatalogError::Delete(_)));
    assert_eq!(store.catalog().products().len(), 3);

    store.delete_product(&ProductId::new("p2")).await.unwrap();
    assert_eq!(store.catalog().products().len(), 2);
    assert!(store.catalog().product(&ProductId::new("p2")).is_none());
}

#[tokio::test]
async fn test_fetch_home() {
    let backend = FakeBackend::start().await;
    backend.on_json(
        Method::GET,
        "/home",
        200,
        json!({
            "categories": [{"id": "footwear", "name": "Footwear", "imageUrl": "https://img/f.png"}],
            "heroCard": {"title": "New season", "imageUrl": "https://img/h.png", "linkTo": "footwear"}
        }),
    );

    let store = backend.storefront();
    let home = store.fetch_home().await.unwrap();
    assert_eq!(home.categories[0].name, "Footwear");
    assert_eq!(home.hero_card.unwrap().title, "New season");
}
