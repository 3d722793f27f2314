/// In-memory document store
///
/// Backs the manager tests and the default server wiring. Each collection is
/// a `HashMap` behind a tokio `RwLock`; every trait call takes the lock once,
/// which gives the per-document atomicity the store contract requires.
///
/// # Example
///
/// ```
/// use solestore_shared::store::{memory::MemoryStore, AccountStore};
/// use solestore_shared::models::account::Account;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let account = Account::new(
///     "alice".to_string(),
///     "a@x.com".to_string(),
///     "$argon2id$fake".to_string(),
/// );
/// store.insert(account.clone()).await?;
/// assert!(store.find_by_email("a@x.com").await?.is_some());
/// # Ok(())
/// # }
/// ```

use crate::models::{account::Account, order::Order, product::Product};
use crate::store::{
    AccountStore, MutateError, Mutation, OrderStore, ProductStore, StoreError, StoreResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store over all three collections
///
/// Cheap to clone; clones share the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert(&self, account: Account) -> StoreResult<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail(account.email));
        }
        accounts.insert(account.id, account);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update(&self, account: Account) -> StoreResult<bool> {
        let mut accounts = self.accounts.write().await;
        if !accounts.contains_key(&account.id) {
            return Ok(false);
        }
        if accounts
            .values()
            .any(|a| a.id != account.id && a.email == account.email)
        {
            return Err(StoreError::DuplicateEmail(account.email));
        }
        accounts.insert(account.id, account);
        Ok(true)
    }

    async fn update_with(
        &self,
        id: Uuid,
        mutation: Mutation<Account>,
    ) -> Result<Account, MutateError> {
        let mut accounts = self.accounts.write().await;
        let entry = accounts.get(&id).ok_or(MutateError::Missing)?;

        // Mutate a draft so an aborted mutation leaves the map untouched
        let mut draft = entry.clone();
        mutation(&mut draft).map_err(MutateError::Aborted)?;
        if accounts
            .values()
            .any(|a| a.id != id && a.email == draft.email)
        {
            return Err(StoreError::DuplicateEmail(draft.email).into());
        }
        accounts.insert(id, draft.clone());
        Ok(draft)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.accounts.write().await.remove(&id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        Ok(self.accounts.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert(&self, product: Product) -> StoreResult<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update(&self, product: Product) -> StoreResult<bool> {
        let mut products = self.products.write().await;
        if !products.contains_key(&product.id) {
            return Ok(false);
        }
        products.insert(product.id, product);
        Ok(true)
    }

    async fn update_with(
        &self,
        id: Uuid,
        mutation: Mutation<Product>,
    ) -> Result<Product, MutateError> {
        let mut products = self.products.write().await;
        let entry = products.get(&id).ok_or(MutateError::Missing)?;

        let mut draft = entry.clone();
        mutation(&mut draft).map_err(MutateError::Aborted)?;
        products.insert(id, draft.clone());
        Ok(draft)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: Order) -> StoreResult<()> {
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_by_creator(&self, creator_id: &str) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.created_by == creator_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn list(&self) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn update(&self, order: Order) -> StoreResult<bool> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id) {
            return Ok(false);
        }
        orders.insert(order.id, order);
        Ok(true)
    }

    async fn update_with(
        &self,
        id: Uuid,
        mutation: Mutation<Order>,
    ) -> Result<Order, MutateError> {
        let mut orders = self.orders.write().await;
        let entry = orders.get(&id).ok_or(MutateError::Missing)?;

        let mut draft = entry.clone();
        mutation(&mut draft).map_err(MutateError::Aborted)?;
        orders.insert(id, draft.clone());
        Ok(draft)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }
}
