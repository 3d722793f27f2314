/// Document store abstraction
///
/// All durable state lives in an external document store; this module defines
/// the contract the managers consume. Persistence-engine choice is out of
/// scope, so the contract is an async trait per collection plus the operations
/// the core actually needs: find-by-id, find-by-filter, atomic update-by-id,
/// delete-by-id, create, and uniqueness enforcement on `Account.email`.
///
/// # Atomicity contract
///
/// Invariant-preserving mutations (address-list rewrite, size-bucket
/// decrement, single-use token clear, status transitions) go through
/// `update_with`: the store fetches the document, runs the caller's
/// [`Mutation`] closure, and commits the result while holding exclusive
/// access to that document. Validation happens inside the closure, so a
/// concurrent writer can never slip between the check and the write, and a
/// closure error aborts the call with nothing persisted.
///
/// `update` remains as whole-document replacement for callers that own the
/// full new state. An implementation must apply each trait call atomically
/// with respect to other calls touching the same document.
///
/// The in-tree [`memory::MemoryStore`] implements every trait under a single
/// lock acquisition per call and backs both the tests and the default server
/// wiring.

pub mod memory;

use crate::error::CoreError;
use crate::models::{account::Account, order::Order, product::Product};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert or update would violate the unique-email constraint
    #[error("email already exists: {0}")]
    DuplicateEmail(String),

    /// The store itself failed (connectivity, corruption, ...)
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// A guarded in-place document mutation
///
/// Runs while the store holds exclusive access to the document. Returning
/// `Err` aborts the update and nothing is persisted.
pub type Mutation<T> = Box<dyn FnOnce(&mut T) -> Result<(), CoreError> + Send>;

/// Error type for `update_with` calls
#[derive(Debug, Error)]
pub enum MutateError {
    /// No document with this ID
    #[error("document not found")]
    Missing,

    /// The mutation refused the update; nothing was persisted
    #[error(transparent)]
    Aborted(CoreError),

    /// The store itself failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MutateError {
    /// Collapses into a [`CoreError`], mapping `Missing` through `not_found`
    ///
    /// Callers supply the domain-specific not-found message; aborts and store
    /// failures pass through.
    pub fn or_not_found(self, not_found: impl FnOnce() -> CoreError) -> CoreError {
        match self {
            MutateError::Missing => not_found(),
            MutateError::Aborted(e) => e,
            MutateError::Store(e) => e.into(),
        }
    }
}

/// Account collection operations
///
/// Email uniqueness is enforced by the store on both insert and update,
/// matching case-sensitively on the exact string.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates a new account document
    ///
    /// Fails with [`StoreError::DuplicateEmail`] if the email is taken.
    async fn insert(&self, account: Account) -> StoreResult<()>;

    /// Finds an account by ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Finds an account by exact email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Atomically replaces the document with the same ID
    ///
    /// Returns `false` if no such document exists. Fails with
    /// [`StoreError::DuplicateEmail`] if the new state takes another
    /// account's email.
    async fn update(&self, account: Account) -> StoreResult<bool>;

    /// Atomically mutates the document with this ID under exclusive access
    ///
    /// Returns the updated document. Uniqueness of the (possibly changed)
    /// email is enforced before commit.
    async fn update_with(&self, id: Uuid, mutation: Mutation<Account>)
        -> Result<Account, MutateError>;

    /// Deletes an account by ID, returning whether it existed
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Lists all accounts
    async fn list(&self) -> StoreResult<Vec<Account>>;
}

/// Product collection operations
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Creates a new product document
    async fn insert(&self, product: Product) -> StoreResult<()>;

    /// Finds a product by ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Product>>;

    /// Atomically replaces the document with the same ID
    ///
    /// Returns `false` if no such document exists.
    async fn update(&self, product: Product) -> StoreResult<bool>;

    /// Atomically mutates the document with this ID under exclusive access
    ///
    /// Returns the updated document.
    async fn update_with(&self, id: Uuid, mutation: Mutation<Product>)
        -> Result<Product, MutateError>;

    /// Deletes a product by ID, returning whether it existed
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Lists all products
    async fn list(&self) -> StoreResult<Vec<Product>>;
}

/// Order collection operations
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Creates a new order document
    async fn insert(&self, order: Order) -> StoreResult<()>;

    /// Finds an order by ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Order>>;

    /// Lists orders created by one principal
    async fn list_by_creator(&self, creator_id: &str) -> StoreResult<Vec<Order>>;

    /// Lists all orders
    async fn list(&self) -> StoreResult<Vec<Order>>;

    /// Atomically replaces the document with the same ID
    ///
    /// Returns `false` if no such document exists.
    async fn update(&self, order: Order) -> StoreResult<bool>;

    /// Atomically mutates the document with this ID under exclusive access
    ///
    /// Returns the updated document.
    async fn update_with(&self, id: Uuid, mutation: Mutation<Order>)
        -> Result<Order, MutateError>;

    /// Deletes an order by ID, returning whether it existed
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}
