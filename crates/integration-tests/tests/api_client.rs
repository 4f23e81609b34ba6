//! HTTP client behavior and account endpoints against the fake backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use stealth_client::api::{ApiRequest, endpoints};
use stealth_client::models::{Address, Product, UserUpdate};
use stealth_client::{AccountError, ApiClient, ApiError, StoreError};
use stealth_core::{Email, UserId};
use stealth_integration_tests::{FakeBackend, Method};

#[tokio::test]
async fn test_server_error_message_passes_through() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::GET, "/products", 422, json!({"error": "Category is unknown"}));
    let client = ApiClient::new(&backend.config()).unwrap();

    let err = client
        .request::<Vec<Product>>(ApiRequest::get([endpoints::PRODUCTS]))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.user_message(), "Category is unknown");
}

#[tokio::test]
async fn test_error_without_json_body() {
    let backend = FakeBackend::start().await;
    backend.on(Method::GET, "/products", 502, "<html>Bad gateway</html>");
    backend.on(Method::GET, "/home", 418, "");
    let client = ApiClient::new(&backend.config()).unwrap();

    let err = client
        .request::<Vec<Product>>(ApiRequest::get([endpoints::PRODUCTS]))
        .await
        .unwrap_err();
    assert_eq!(err.server_message(), None);
    assert_eq!(err.user_message(), "Server error: 502");

    let err = client
        .execute(ApiRequest::get([endpoints::HOME]))
        .await
        .unwrap_err();
    assert_eq!(err.server_message(), Some("I'm a teapot"));
}

#[tokio::test]
async fn test_unrecognized_body_is_decoding_error() {
    let backend = FakeBackend::start().await;
    backend.on(Method::GET, "/products", 200, "not json at all");
    let mut store = backend.storefront();

    let err = store.load_products().await.unwrap_err();
    assert!(matches!(err.api_error(), Some(ApiError::Decoding(_))));
}

#[tokio::test]
async fn test_request_times_out() {
    let backend = FakeBackend::start().await;
    backend.on_delayed(Method::GET, "/products", Duration::from_secs(5), json!([]));
    let mut config = backend.config();
    config.request_timeout = Duration::from_millis(200);
    let client = ApiClient::new(&config).unwrap();

    let err = client
        .request::<Vec<Product>>(ApiRequest::get([endpoints::PRODUCTS]))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.user_message(), "Request timed out. Please try again.");
}

#[tokio::test]
async fn test_ping() {
    let backend = FakeBackend::start().await;
    let store = backend.storefront();

    // Nothing scripted for the root: 404.
    let err = store.ping().await.unwrap_err();
    assert_eq!(err.user_message(), "Server returned status code: 404");

    backend.on(Method::GET, "/", 200, "");
    store.ping().await.unwrap();
}

#[tokio::test]
async fn test_ping_unreachable() {
    let config = stealth_client::ClientConfig::with_base_url("http://127.0.0.1:9/api").unwrap();
    let client = ApiClient::new(&config).unwrap();

    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn test_register_sends_camel_case_body() {
    let backend = FakeBackend::start().await;
    backend.on_json(
        Method::POST,
        "/users",
        201,
        json!({"_id": "u5", "email": "grace@example.com", "firstName": "Grace", "lastName": "Hopper"}),
    );
    let mut store = backend.storefront();

    let registration = stealth_client::models::RegisterUser {
        email: Email::parse("Grace@Example.com").unwrap(),
        password: SecretString::from("cobol"),
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        address: Address::new("1 Navy Way", "Arlington", "VA", "22202"),
    };
    let user = store.register(&registration).await.unwrap();
    assert_eq!(user.id, UserId::new("u5"));
    assert!(store.current_user().is_some());

    let body = backend.requests_to(&Method::POST, "/users")[0].json();
    assert_eq!(body["email"], "Grace@example.com");
    assert_eq!(body["password"], "cobol");
    assert_eq!(body["firstName"], "Grace");
    assert_eq!(body["address"]["zipCode"], "22202");
}

#[tokio::test]
async fn test_register_conflict_message() {
    let backend = FakeBackend::start().await;
    backend.on_json(Method::POST, "/users", 400, json!({"error": "Email already registered"}));
    let mut store = backend.storefront();

    let registration = stealth_client::models::RegisterUser {
        email: Email::parse("ada@example.com").unwrap(),
        password: SecretString::from("pw"),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        address: Address::default(),
    };
    let err = store.register(&registration).await.unwrap_err();

    assert_eq!(err.user_message(), "Email already registered");
    assert!(store.current_user().is_none());
}

#[tokio::test]
async fn test_profile_refresh_and_update() {
    let backend = FakeBackend::start().await;
    backend.on_json(
        Method::POST,
        "/users/login",
        200,
        json!({"_id": "u1", "email": "ada@example.com"}),
    );
    backend.on_json(
        Method::GET,
        "/users/u1",
        200,
        json!({"_id": "u1", "email": "ada@example.com", "firstName": "Ada"}),
    );
    backend.on_json(
        Method::PUT,
        "/users/u1",
        200,
        json!({"_id": "u1", "email": "ada@example.com", "firstName": "Ada", "lastName": "King"}),
    );

    let mut store = backend.storefront();
    store
        .login("ada@example.com", SecretString::from("hunter2"))
        .await
        .unwrap();

    assert_eq!(store.refresh_user().await.unwrap().first_name, "Ada");

    let update = UserUpdate {
        first_name: "Ada".into(),
        last_name: "King".into(),
        email: Email::parse("ada@example.com").unwrap(),
        address: Address::new("12 St James Sq", "London", "LDN", "SW1"),
    };
    assert_eq!(store.update_profile(&update).await.unwrap().full_name(), "Ada King");

    let body = backend.requests_to(&Method::PUT, "/users/u1")[0].json();
    assert_eq!(body["lastName"], "King");
    assert_eq!(body["address"]["city"], "London");
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let backend = FakeBackend::start().await;
    backend.on_json(
        Method::POST,
        "/users/login",
        200,
        json!({"_id": "u1", "email": "ada@example.com"}),
    );
    let mut store = backend.storefront();
    store
        .login("ada@example.com", SecretString::from("hunter2"))
        .await
        .unwrap();

    // Unscripted: the backend answers 404.
    let err = store.refresh_user().await.unwrap_err();
    assert!(matches!(err, StoreError::Account(AccountError::NotFound)));
    assert_eq!(err.user_message(), "User not found. Please check your account.");
}
