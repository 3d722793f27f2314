/// Address book endpoints
///
/// All routes run behind the session middleware and operate on the calling
/// principal's own address list. External principals have no local account
/// document, so their non-UUID ids are rejected up front.

use crate::app::AppState;
use crate::error::{validation_error, ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use solestore_shared::addresses::NewAddress;
use solestore_shared::auth::authenticator::Principal;
use solestore_shared::models::account::Address;
use uuid::Uuid;
use validator::Validate;

/// Request body for `POST /addresses`
#[derive(Debug, Deserialize, Validate)]
pub struct AddAddressRequest {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,

    #[validate(length(min = 6, max = 20, message = "Phone number is required"))]
    pub phone: String,

    #[validate(length(min = 1, max = 300, message = "Address is required"))]
    pub address: String,
}

fn account_id(principal: &Principal) -> ApiResult<Uuid> {
    Uuid::parse_str(&principal.id)
        .map_err(|_| ApiError::Forbidden("a local account is required".to_string()))
}

/// `GET /api/v1/addresses`
pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Value>> {
    let addresses = state
        .address_book
        .list_addresses(account_id(&principal)?)
        .await?;
    Ok(Json(json!({ "addresses": addresses })))
}

/// `POST /api/v1/addresses`
///
/// The new entry always becomes the default.
pub async fn add_address(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<AddAddressRequest>,
) -> ApiResult<(StatusCode, Json<Address>)> {
    req.validate().map_err(validation_error)?;

    let address = state
        .address_book
        .add_address(
            account_id(&principal)?,
            NewAddress {
                full_name: req.full_name,
                phone: req.phone,
                address: req.address,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// `PUT /api/v1/addresses/:id/default`
pub async fn set_default(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(address_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state
        .address_book
        .set_default(account_id(&principal)?, address_id)
        .await?;
    Ok(Json(json!({ "msg": "Default address updated" })))
}

/// `DELETE /api/v1/addresses/:id`
pub async fn remove_address(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(address_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state
        .address_book
        .remove_address(account_id(&principal)?, address_id)
        .await?;
    Ok(Json(json!({ "msg": "Address removed" })))
}
