/// Document models for the storefront
///
/// # Models
///
/// - `account`: user accounts, credentials, trust state, embedded address book
/// - `product`: catalog products with per-size inventory buckets
/// - `order`: orders with immutable cart snapshots and a status state machine

pub mod account;
pub mod order;
pub mod product;
