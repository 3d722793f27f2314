//! # Solestore Shared Library
//!
//! Shared types and business logic for the Solestore storefront backend:
//! the identity and order-consistency core, plus the seams it consumes.
//!
//! ## Module Organization
//!
//! - `models`: document models (accounts, products, orders)
//! - `store`: document-store traits and the in-memory implementation
//! - `auth`: token codec, password hashing, bearer authentication
//! - `accounts`: registration, verification, login, password reset
//! - `addresses`: single-default-address invariant over the address book
//! - `orders`: order snapshots, inventory decrements, status state machine
//! - `mailer`: outbound email construction and delivery seam
//! - `error`: common error taxonomy

pub mod accounts;
pub mod addresses;
pub mod auth;
pub mod error;
pub mod mailer;
pub mod models;
pub mod orders;
pub mod store;

/// Current version of the Solestore shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
