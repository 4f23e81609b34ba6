//! Wire and domain types for the storefront backend.
//!
//! Field names follow the backend's JSON (`_id`, `camelCase`, `__v`) through
//! serde attributes; the Rust side uses snake case throughout.

mod address;
mod home;
mod order;
mod product;
mod user;

pub use address::Address;
pub use home::{Category, HeroCard, HomeScreenData};
pub use order::{Order, OrderLine, OrderRequest, OrderRequestLine, OrderUser, ProductSnapshot, UserSummary};
pub use product::{NewProduct, Product};
pub use user::{LoginRequest, RegisterUser, UserRecord, UserUpdate};
