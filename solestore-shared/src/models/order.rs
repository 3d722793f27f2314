/// Order model with immutable cart snapshot and status state machine
///
/// An order captures the cart as it existed at checkout. The snapshot is
/// never re-derived from current product state; price or inventory changes
/// after checkout do not touch existing orders.
///
/// # Status transitions
///
/// ```text
/// Pending ──> Shipping ──> Delivered
///    │            │
///    └────────────┴──────> Cancelled
/// ```
///
/// `Delivered` and `Cancelled` are terminal. Updates that are not edges of
/// this graph are rejected; arbitrary status writes are not accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order fulfillment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether `target` is reachable from `self` in one step
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Shipping) | (Pending, Cancelled) | (Shipping, Delivered) | (Shipping, Cancelled)
        )
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Shipping => write!(f, "Shipping"),
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A line item frozen at checkout time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product ID at checkout (informational; the snapshot is authoritative)
    pub product_id: Uuid,

    /// Product name at checkout
    pub name: String,

    /// Size label ordered
    pub size: String,

    /// Unit price at checkout
    pub price: f64,

    /// Units ordered
    pub quantity: u32,
}

/// Order document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID
    pub id: Uuid,

    /// Owning principal id (required; ownership checks key off this)
    ///
    /// A string rather than a UUID because externally authenticated
    /// principals carry provider-issued subject ids.
    pub created_by: String,

    /// Recipient name
    pub name: String,

    /// Recipient address
    pub address: String,

    /// Recipient phone number
    pub phone: String,

    /// Total item count
    pub amount: u32,

    /// Order total in currency units
    pub order_total: f64,

    /// Immutable snapshot of the cart at checkout
    pub cart_items: Vec<CartItem>,

    /// Whether payment has been recorded
    pub is_paid: bool,

    /// Fulfillment status
    pub status: OrderStatus,

    /// Carrier tracking code, set when shipping
    pub tracking_code: Option<String>,

    /// When the order was placed
    pub created_at: DateTime<Utc>,

    /// When the order was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new order
///
/// `cart_items` is copied into the order verbatim and becomes the permanent
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub amount: u32,
    pub order_total: f64,
    pub cart_items: Vec<CartItem>,
}
