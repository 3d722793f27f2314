/// Order fulfillment manager
///
/// Owns checkout snapshots, the order-status state machine, and inventory
/// decrements against product size buckets. Checkout and stock adjustment
/// are deliberately decoupled calls with independent failure modes: an order
/// is persisted by [`OrderManager::create_order`] and inventory is reduced
/// by a separate [`OrderManager::apply_size_decrements`] call.
///
/// Decrements are all-or-nothing per call: the whole request runs as one
/// `update_with` closure, so validation and write happen while the store
/// holds the product exclusively. The call fails with nothing persisted if
/// any size is missing or short; a bucket can never go negative, even under
/// concurrent checkouts of the last unit.

use crate::error::{CoreError, CoreResult};
use crate::mailer::{EmailBuilder, EmailSender};
use crate::models::order::{CreateOrder, Order, OrderStatus};
use crate::models::product::Product;
use crate::store::{OrderStore, ProductStore};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// One requested decrement against a product's size bucket
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SizeDecrement {
    /// Size label to decrement
    pub size: String,

    /// Units to subtract
    pub quantity: u32,
}

/// Patch applied alongside a status transition
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    /// Target status; must be reachable from the current one
    pub status: Option<OrderStatus>,

    /// Carrier tracking code
    pub tracking_code: Option<String>,

    /// Payment recorded
    pub is_paid: Option<bool>,
}

/// Manages orders and the inventory they consume
#[derive(Clone)]
pub struct OrderManager {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    mailer: Arc<dyn EmailSender>,
    emails: EmailBuilder,
}

impl OrderManager {
    /// Creates a manager over explicit collaborators
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        mailer: Arc<dyn EmailSender>,
        emails: EmailBuilder,
    ) -> Self {
        OrderManager {
            orders,
            products,
            mailer,
            emails,
        }
    }

    /// Persists an order with its immutable cart snapshot
    ///
    /// The snapshot is the caller's cart exactly as presented; it is never
    /// re-derived from current product state. Inventory is not touched here.
    /// A confirmation email is built for `confirmation_to` when given;
    /// failure to hand it off does not undo the persisted order.
    pub async fn create_order(
        &self,
        created_by: &str,
        draft: CreateOrder,
        confirmation_to: Option<&str>,
    ) -> CoreResult<Order> {
        if draft.cart_items.is_empty() {
            return Err(CoreError::BadRequest(
                "please provide cart items".to_string(),
            ));
        }
        if draft.name.is_empty() || draft.address.is_empty() || draft.phone.is_empty() {
            return Err(CoreError::BadRequest(
                "please provide recipient name, address and phone".to_string(),
            ));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            created_by: created_by.to_string(),
            name: draft.name,
            address: draft.address,
            phone: draft.phone,
            amount: draft.amount,
            order_total: draft.order_total,
            cart_items: draft.cart_items,
            is_paid: false,
            status: OrderStatus::Pending,
            tracking_code: None,
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(order.clone()).await?;
        tracing::info!(order = %order.id, created_by, "order created");

        if let Some(to) = confirmation_to {
            let email = self.emails.order_confirmation_email(
                to,
                &order.name,
                &order.id.to_string(),
                order.order_total,
            );
            if let Err(e) = self.mailer.send(email).await {
                tracing::warn!(order = %order.id, error = %e, "order confirmation not sent");
            }
        }

        Ok(order)
    }

    /// Subtracts ordered quantities from a product's size buckets
    ///
    /// Validates every request against the current buckets and applies the
    /// decrements inside one `update_with` closure; a missing size or
    /// insufficient stock fails the whole call with `Conflict` and persists
    /// nothing. Two checkouts racing for the last unit serialize at the
    /// store, so only one can win.
    pub async fn apply_size_decrements(
        &self,
        product_id: Uuid,
        requests: &[SizeDecrement],
    ) -> CoreResult<Product> {
        let requests = requests.to_vec();
        let product = self
            .products
            .update_with(
                product_id,
                Box::new(move |product| {
                    for request in &requests {
                        let bucket = product.size_bucket(&request.size).ok_or_else(|| {
                            CoreError::Conflict(format!(
                                "product {} has no size {}",
                                product.id, request.size
                            ))
                        })?;
                        if bucket.quantity < request.quantity {
                            return Err(CoreError::Conflict(format!(
                                "insufficient stock for size {}: have {}, need {}",
                                request.size, bucket.quantity, request.quantity
                            )));
                        }
                    }

                    for request in &requests {
                        if let Some(bucket) =
                            product.sizes.iter_mut().find(|b| b.size == request.size)
                        {
                            bucket.quantity -= request.quantity;
                        }
                    }
                    product.updated_at = Utc::now();
                    Ok(())
                }),
            )
            .await
            .map_err(|e| {
                e.or_not_found(|| CoreError::NotFound(format!("no product with id {product_id}")))
            })?;

        Ok(product)
    }

    /// Applies a status transition and related fulfillment fields
    ///
    /// The transition must be an edge of the state machine on
    /// [`OrderStatus`]; anything else is a `Conflict` naming both states.
    /// Tracking code and payment flags may be updated with or without a
    /// transition.
    pub async fn update_status(&self, order_id: Uuid, update: StatusUpdate) -> CoreResult<Order> {
        let StatusUpdate {
            status,
            tracking_code,
            is_paid,
        } = update;

        let order = self
            .orders
            .update_with(
                order_id,
                Box::new(move |order| {
                    if let Some(target) = status {
                        // Checked under the lock: two admins racing the same
                        // order cannot both take the same edge
                        if !order.status.can_transition_to(target) {
                            return Err(CoreError::Conflict(format!(
                                "cannot move order from {} to {target}",
                                order.status
                            )));
                        }
                        tracing::info!(order = %order.id, from = %order.status, to = %target, "order status change");
                        order.status = target;
                    }
                    if let Some(tracking_code) = tracking_code {
                        order.tracking_code = Some(tracking_code);
                    }
                    if let Some(is_paid) = is_paid {
                        order.is_paid = is_paid;
                    }
                    order.updated_at = Utc::now();
                    Ok(())
                }),
            )
            .await
            .map_err(|e| {
                e.or_not_found(|| CoreError::NotFound(format!("no order with id {order_id}")))
            })?;

        Ok(order)
    }

    /// Fetches one order
    pub async fn get_order(&self, order_id: Uuid) -> CoreResult<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("no order with id {order_id}")))
    }

    /// Lists orders created by one principal
    pub async fn list_orders_for(&self, creator_id: &str) -> CoreResult<Vec<Order>> {
        Ok(self.orders.list_by_creator(creator_id).await?)
    }

    /// Lists every order (admin surface)
    pub async fn list_all_orders(&self) -> CoreResult<Vec<Order>> {
        Ok(self.orders.list().await?)
    }

    /// Hard-deletes an order
    pub async fn delete_order(&self, order_id: Uuid) -> CoreResult<()> {
        if !self.orders.delete(order_id).await? {
            return Err(CoreError::NotFound(format!("no order with id {order_id}")));
        }
        Ok(())
    }
}
