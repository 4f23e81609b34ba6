//! Endpoint path segments, relative to the configured base URL.

/// Product catalog (`GET`, `POST`, `DELETE /products/{id}`).
pub const PRODUCTS: &str = "products";

/// User accounts (`POST /users`, `GET`/`PUT /users/{id}`).
pub const USERS: &str = "users";

/// Login, nested under [`USERS`] (`POST /users/login`).
pub const LOGIN: &str = "login";

/// Orders (`GET /orders?user=&page=&limit=`, `POST /orders`).
pub const ORDERS: &str = "orders";

/// Landing page aggregate (`GET /home`).
pub const HOME: &str = "home";
