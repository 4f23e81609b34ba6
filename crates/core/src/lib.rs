//! Stealth Commerce Core - Shared types library.
//!
//! This crate provides common types used across all Stealth Commerce components:
//! - `client` - Storefront API client and in-memory application state
//! - `cli` - Command-line driver for exercising a backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! storage. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
