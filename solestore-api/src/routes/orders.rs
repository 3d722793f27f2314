/// Order endpoints
///
/// Checkout, the user's order history, and the admin fulfillment surface.
/// `GET /orders/:id` is the one route where authorization depends on the
/// fetched document: owners and admins may read, anyone else gets 403.

use crate::app::AppState;
use crate::error::{validation_error, ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use solestore_shared::auth::authenticator::Principal;
use solestore_shared::models::order::{CartItem, CreateOrder, Order, OrderStatus};
use solestore_shared::orders::StatusUpdate;
use uuid::Uuid;
use validator::Validate;

/// Request body for `POST /orders`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100, message = "Recipient name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 300, message = "Delivery address is required"))]
    pub address: String,

    #[validate(length(min = 6, max = 20, message = "Phone number is required"))]
    pub phone: String,

    pub amount: u32,

    pub order_total: f64,

    #[validate(length(min = 1, message = "Cart must not be empty"))]
    pub cart_items: Vec<CartItem>,
}

/// Request body for `PATCH /orders/:id/status`
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<OrderStatus>,
    pub tracking_code: Option<String>,
    pub is_paid: Option<bool>,
}

/// `POST /api/v1/orders`
///
/// Persists the cart snapshot as presented; inventory is adjusted by the
/// separate decrement endpoint. The confirmation email goes to the calling
/// principal when it has an email address.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    req.validate().map_err(validation_error)?;

    let confirmation_to = (!principal.email.is_empty()).then_some(principal.email.as_str());
    let order = state
        .orders
        .create_order(
            &principal.id,
            CreateOrder {
                name: req.name,
                address: req.address,
                phone: req.phone,
                amount: req.amount,
                order_total: req.order_total,
                cart_items: req.cart_items,
            },
            confirmation_to,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /api/v1/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Value>> {
    let orders = state.orders.list_orders_for(&principal.id).await?;
    Ok(Json(json!({ "orders": orders })))
}

/// `GET /api/v1/orders/all` (admin)
pub async fn list_all_orders(
    State(state): State<AppState>,
    Extension(_principal): Extension<Principal>,
) -> ApiResult<Json<Value>> {
    let orders = state.orders.list_all_orders().await?;
    Ok(Json(json!({ "orders": orders })))
}

/// `GET /api/v1/orders/:id`
pub async fn get_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = state.orders.get_order(order_id).await?;

    if !principal.owns(&order.created_by) && !principal.is_admin() {
        return Err(ApiError::Forbidden(
            "you do not have access to this order".to_string(),
        ));
    }
    Ok(Json(order))
}

/// `PATCH /api/v1/orders/:id/status` (admin)
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .orders
        .update_status(
            order_id,
            StatusUpdate {
                status: req.status,
                tracking_code: req.tracking_code,
                is_paid: req.is_paid,
            },
        )
        .await?;
    Ok(Json(order))
}

/// `DELETE /api/v1/orders/:id` (admin)
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state.orders.delete_order(order_id).await?;
    Ok(Json(json!({ "msg": "Order deleted" })))
}
