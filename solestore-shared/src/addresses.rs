/// Address book manager
///
/// Owns the invariant that a user's address collection has at most one entry
/// marked default: exactly 1 when the list is non-empty, 0 when it is empty.
/// Because the invariant spans the whole list, every mutation runs as an
/// `update_with` closure over the whole account document, validated and
/// committed while the store holds the document exclusively. Two concurrent
/// updates therefore serialize at the store; the invariant can never be
/// observed half-applied.

use crate::error::{CoreError, CoreResult};
use crate::models::account::Address;
use crate::store::AccountStore;
use std::sync::Arc;
use uuid::Uuid;

/// Fields for a new address entry
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
}

/// Manages the embedded address list of an account
#[derive(Clone)]
pub struct AddressBook {
    store: Arc<dyn AccountStore>,
}

impl AddressBook {
    /// Creates an address book over the account store
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        AddressBook { store }
    }

    /// Appends a new address and makes it the default
    ///
    /// All existing entries are demoted in the same write.
    pub async fn add_address(&self, account_id: Uuid, fields: NewAddress) -> CoreResult<Address> {
        let address = Address {
            id: Uuid::new_v4(),
            full_name: fields.full_name,
            phone: fields.phone,
            address: fields.address,
            is_default: true,
        };

        let new_entry = address.clone();
        self.store
            .update_with(
                account_id,
                Box::new(move |account| {
                    for entry in &mut account.addresses {
                        entry.is_default = false;
                    }
                    account.addresses.push(new_entry);
                    account.updated_at = chrono::Utc::now();
                    debug_assert!(account.default_count() <= 1);
                    Ok(())
                }),
            )
            .await
            .map_err(|e| {
                e.or_not_found(|| CoreError::NotFound(format!("no user with id {account_id}")))
            })?;

        Ok(address)
    }

    /// Makes exactly one entry the default, demoting all siblings
    ///
    /// # Errors
    ///
    /// `NotFound` if `address_id` does not belong to the account.
    pub async fn set_default(&self, account_id: Uuid, address_id: Uuid) -> CoreResult<()> {
        self.store
            .update_with(
                account_id,
                Box::new(move |account| {
                    if !account.addresses.iter().any(|a| a.id == address_id) {
                        return Err(CoreError::NotFound(format!(
                            "no address with id {address_id}"
                        )));
                    }

                    for entry in &mut account.addresses {
                        entry.is_default = entry.id == address_id;
                    }
                    account.updated_at = chrono::Utc::now();
                    debug_assert!(account.default_count() <= 1);
                    Ok(())
                }),
            )
            .await
            .map_err(|e| {
                e.or_not_found(|| CoreError::NotFound(format!("no user with id {account_id}")))
            })?;
        Ok(())
    }

    /// Removes an address
    ///
    /// If the removed entry was the default and others remain, the first
    /// remaining entry is promoted in the same write.
    ///
    /// # Errors
    ///
    /// `NotFound` if `address_id` does not belong to the account.
    pub async fn remove_address(&self, account_id: Uuid, address_id: Uuid) -> CoreResult<()> {
        self.store
            .update_with(
                account_id,
                Box::new(move |account| {
                    let position = account
                        .addresses
                        .iter()
                        .position(|a| a.id == address_id)
                        .ok_or_else(|| {
                            CoreError::NotFound(format!("no address with id {address_id}"))
                        })?;

                    let removed = account.addresses.remove(position);
                    if removed.is_default {
                        if let Some(first) = account.addresses.first_mut() {
                            first.is_default = true;
                        }
                    }
                    account.updated_at = chrono::Utc::now();
                    debug_assert!(account.default_count() <= 1);
                    Ok(())
                }),
            )
            .await
            .map_err(|e| {
                e.or_not_found(|| CoreError::NotFound(format!("no user with id {account_id}")))
            })?;
        Ok(())
    }

    /// Lists the account's addresses in insertion order
    pub async fn list_addresses(&self, account_id: Uuid) -> CoreResult<Vec<Address>> {
        Ok(self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("no user with id {account_id}")))?
            .addresses)
    }
}
