/// Product catalog endpoints
///
/// Reads are public. Writes are admin-only, except the size decrement that
/// checkout drives, which any authenticated principal may call.

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
use solestore_shared::error::CoreError;
use solestore_shared::models::product::{Brand, CreateProduct, Product, SizeBucket};
use solestore_shared::orders::SizeDecrement;
use solestore_shared::store::StoreError;
use uuid::Uuid;
use validator::Validate;

/// Request body for `POST /products`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Product name is required"))]
    pub name: String,

    #[validate(url(message = "Image must be a valid URL"))]
    pub image: String,

    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,

    #[validate(length(min = 1, message = "At least one size is required"))]
    pub sizes: Vec<SizeBucket>,

    pub description: Option<String>,
    pub brand: Option<Brand>,
    pub quality: Option<String>,
}

/// Request body for `PATCH /products/:id`; only present fields are applied
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Product name must not be empty"))]
    pub name: Option<String>,

    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,

    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,

    pub sizes: Option<Vec<SizeBucket>>,
    pub description: Option<String>,
    pub brand: Option<Brand>,
    pub quality: Option<String>,
    pub is_active: Option<bool>,
}

/// Request body for `POST /products/:id/sizes/decrement`
#[derive(Debug, Deserialize, Validate)]
pub struct DecrementRequest {
    #[validate(length(min = 1, message = "At least one decrement is required"))]
    pub decrements: Vec<SizeDecrement>,
}

fn store_err(err: StoreError) -> ApiError {
    ApiError::from(CoreError::from(err))
}

/// `GET /api/v1/products`
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let products = state.products.list().await.map_err(store_err)?;
    Ok(Json(json!({ "products": products })))
}

/// `GET /api/v1/products/:id`
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    let product = state
        .products
        .find_by_id(product_id)
        .await
        .map_err(store_err)?
        .ok_or_else(|| ApiError::NotFound(format!("no product with id {product_id}")))?;
    Ok(Json(product))
}

/// `POST /api/v1/products` (admin)
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    req.validate().map_err(validation_error)?;

    let product = CreateProduct {
        name: req.name,
        image: req.image,
        price: req.price,
        sizes: req.sizes,
        description: req.description,
        brand: req.brand,
        quality: req.quality,
    }
    .into_product();
    state
        .products
        .insert(product.clone())
        .await
        .map_err(store_err)?;

    tracing::info!(product = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PATCH /api/v1/products/:id` (admin)
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    req.validate().map_err(validation_error)?;

    let product = state
        .products
        .update_with(
            product_id,
            Box::new(move |product| {
                if let Some(name) = req.name {
                    product.name = name;
                }
                if let Some(image) = req.image {
                    product.image = image;
                }
                if let Some(price) = req.price {
                    product.price = price;
                }
                if let Some(sizes) = req.sizes {
                    product.sizes = sizes;
                }
                if let Some(description) = req.description {
                    product.description = Some(description);
                }
                if let Some(brand) = req.brand {
                    product.brand = Some(brand);
                }
                if let Some(quality) = req.quality {
                    product.quality = Some(quality);
                }
                if let Some(is_active) = req.is_active {
                    product.is_active = is_active;
                }
                product.updated_at = chrono::Utc::now();
                Ok(())
            }),
        )
        .await
        .map_err(|e| {
            ApiError::from(
                e.or_not_found(|| CoreError::NotFound(format!("no product with id {product_id}"))),
            )
        })?;
    Ok(Json(product))
}

/// `DELETE /api/v1/products/:id` (admin)
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    if !state
        .products
        .delete(product_id)
        .await
        .map_err(store_err)?
    {
        return Err(ApiError::NotFound(format!(
            "no product with id {product_id}"
        )));
    }
    Ok(Json(json!({ "msg": "Product deleted" })))
}

/// `POST /api/v1/products/:id/sizes/decrement`
///
/// All-or-nothing stock subtraction after checkout; a shortfall on any
/// requested size leaves every bucket untouched.
pub async fn decrement_sizes(
    State(state): State<AppState>,
    Extension(_principal): Extension<Principal>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<DecrementRequest>,
) -> ApiResult<Json<Product>> {
    req.validate().map_err(validation_error)?;

    let product = state
        .orders
        .apply_size_decrements(product_id, &req.decrements)
        .await?;
    Ok(Json(product))
}
