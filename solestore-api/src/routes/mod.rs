/// HTTP route handlers
///
/// Thin translation layer: deserialize and validate the request, call the
/// manager, shape the response. Authorization decisions that depend on the
/// resolved [`Principal`](solestore_shared::auth::authenticator::Principal)
/// and the fetched document (ownership checks) live in the handlers; pure
/// role gates are middleware.

pub mod addresses;
pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
