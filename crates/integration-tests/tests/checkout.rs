//! Login, session persistence and checkout against the fake backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::{Value, json};
use stealth_client::models::Address;
use stealth_client::{
    AccountError, CheckoutError, FileSessionStore, SessionStore, StoreError, StoreEvent, Storefront,
};
use stealth_core::{OrderId, Price, UserId};
use stealth_integration_tests::{FakeBackend, Method};

fn user_json() -> Value {
    json!({
        "_id": "u1",
        "email": "ada@example.com",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "__v": 0
    })
}

fn address() -> Address {
    Address::new("1 Main St", "Springfield", "IL", "62701")
}

fn products() -> Value {
    json!([
        {"_id": "p1", "name": "Cap", "price": 5, "category": "Hats", "stock": 10},
        {"_id": "p2", "name": "Tee", "price": 3.5, "category": "Shirts", "stock": 10}
    ])
}

async fn logged_in_with_cart(backend: &FakeBackend) -> Storefront {
    backend.on_json(Method::POST, "/users/login", 200, user_json());
    backend.on_json(Method::GET, "/products", 200, products());

    let mut store = backend.storefront();
    store
        .login("ada@example.com", SecretString::from("hunter2"))
        .await
        .unwrap();
    let loaded = store.load_products().await.unwrap().to_vec();
    store.add_to_cart(&loaded[0], 2);
    store.add_to_cart(&loaded[1], 1);
    store
}

#[tokio::test]
async fn test_login_teapot_is_invalid_credentials() {
    let backend = FakeBackend::start().await;
    backend.on(Method::POST, "/users/login", 418, "");

    let mut store = backend.storefront();
    let err = store
        .login("ada@example.com", SecretString::from("wrong"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::Account(AccountError::InvalidCredentials)
    ));
    assert_eq!(
        err.user_message(),
        "Authentication failed. Please check your credentials and try again."
    );
    assert!(store.current_user().is_none());
}

#[tokio::test]
async fn test_login_rejects_malformed_email_without_request() {
    let backend = FakeBackend::start().await;
    let mut store = backend.storefront();

    let err = store
        .login("not-an-email", SecretString::from("pw"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Account(AccountError::InvalidEmail(_))));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_login_persists_session_to_disk() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::POST, "/users/login", 200, json!({"user": user_json()}));
    let dir = tempfile::tempdir().unwrap();
    let session = Arc::new(FileSessionStore::new(dir.path()));

    let mut store = backend.storefront_with(session.clone());
    let user = store
        .login("ada@example.com", SecretString::from("hunter2"))
        .await
        .unwrap();
    assert_eq!(user.full_name(), "Ada Lovelace");

    let body = backend.requests_to(&Method::POST, "/users/login")[0].json();
    assert_eq!(body, json!({"email": "ada@example.com", "password": "hunter2"}));

    assert!(session.path().exists());
    let mut restored = backend.storefront_with(session.clone());
    let user = restored.restore_session().unwrap().unwrap();
    assert_eq!(user.id, UserId::new("u1"));

    restored.logout().unwrap();
    assert!(!session.path().exists());
    assert!(session.load().unwrap().is_none());
}

#[tokio::test]
async fn test_checkout_sends_order_and_clears_cart() {
    let backend = FakeBackend::start().await;
    let mut store = logged_in_with_cart(&backend).await;
    backend.on_json(Method::POST, "/orders", 201, json!({"id": "o42"}));
    assert_eq!(store.cart().total(), Price::parse("18.50").unwrap());

    let mut events = store.subscribe();
    let created = store.checkout(&address()).await.unwrap();

    assert_eq!(created.order_id(), &OrderId::new("o42"));
    assert!(store.cart().is_empty());
    assert_eq!(
        events.recv().await.unwrap(),
        StoreEvent::CartChanged { item_count: 0 }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        StoreEvent::OrderPlaced {
            order_id: OrderId::new("o42")
        }
    );

    let body = backend.requests_to(&Method::POST, "/orders")[0].json();
    assert_eq!(body["user"], "u1");
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["product"], "p1");
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["items"][0]["price"], 5.0);
    assert_eq!(body["shippingAddress"]["zipCode"], "62701");
    assert_eq!(body["totalAmount"], 18.5);
}

#[tokio::test]
async fn test_checkout_accepts_every_creation_shape() {
    let order = json!({
        "_id": "o1",
        "items": [{"product": {"_id": "p1", "name": "Cap", "price": 5}, "quantity": 2}],
        "totalAmount": 15,
        "status": "pending"
    });
    let cases = [
        (json!({"order": order}), "o1", None),
        (order.clone(), "o1", None),
        (json!({"_id": "o2", "message": "Order received"}), "o2", Some("Order received")),
        (json!({"id": "o3"}), "o3", None),
        (json!({"orderId": "o4", "message": "ok"}), "o4", Some("ok")),
    ];

    for (response, expected_id, expected_message) in cases {
        let backend = FakeBackend::start().await;
        let mut store = logged_in_with_cart(&backend).await;
        backend.on_json(Method::POST, "/orders", 200, response);

        let created = store.checkout(&address()).await.unwrap();
        assert_eq!(created.order_id().as_str(), expected_id);
        assert_eq!(created.message(), expected_message);
        assert!(store.cart().is_empty());
    }
}

#[tokio::test]
async fn test_envelope_order_keeps_server_total() {
    let backend = FakeBackend::start().await;
    let mut store = logged_in_with_cart(&backend).await;
    backend.on_json(
        Method::POST,
        "/orders",
        201,
        json!({"order": {"_id": "o9", "items": [], "totalAmount": 17.25}}),
    );

    let created = store.checkout(&address()).await.unwrap();
    assert_eq!(
        created.order().unwrap().total_amount,
        Price::parse("17.25").unwrap()
    );
}

#[tokio::test]
async fn test_server_rejection_keeps_cart() {
    let backend = FakeBackend::start().await;
    let mut store = logged_in_with_cart(&backend).await;
    backend.on_json(Method::POST, "/orders", 400, json!({"error": "Insufficient stock for Cap"}));

    let err = store.checkout(&address()).await.unwrap_err();

    let CheckoutError::Api(api) = &err else {
        panic!("expected API error, got {err:?}");
    };
    assert_eq!(api.status(), Some(400));
    assert_eq!(api.user_message(), "Insufficient stock for Cap");
    assert_eq!(store.cart().item_count(), 3);
}

#[tokio::test]
async fn test_unrecognized_creation_response_keeps_cart() {
    let backend = FakeBackend::start().await;
    let mut store = logged_in_with_cart(&backend).await;
    backend.on_json(Method::POST, "/orders", 200, json!({"status": "queued"}));

    let err = store.checkout(&address()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Api(_)));
    assert_eq!(store.cart().item_count(), 3);
}

#[tokio::test]
async fn test_empty_cart_is_left_to_server() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::POST, "/users/login", 200, user_json());
    backend.on_json(Method::POST, "/orders", 400, json!({"error": "Order has no items"}));

    let mut store = backend.storefront();
    store
        .login("ada@example.com", SecretString::from("hunter2"))
        .await
        .unwrap();
    let err = store.checkout(&address()).await.unwrap_err();

    assert_eq!(err.to_string(), "server error (400): Order has no items");
    let body = backend.requests_to(&Method::POST, "/orders")[0].json();
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["totalAmount"], 5.0);
}

#[tokio::test]
async fn test_incomplete_address_sends_nothing() {
    let backend = FakeBackend::start().await;
    let mut store = logged_in_with_cart(&backend).await;

    let err = store
        .checkout(&Address::new("1 Main St", "Springfield", " ", ""))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::IncompleteAddress(ref missing) if missing == &vec!["state", "zip code"]
    ));
    assert!(backend.requests_to(&Method::POST, "/orders").is_empty());
}
