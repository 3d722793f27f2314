/// Account lifecycle endpoints
///
/// Registration, email verification, login, and the password-reset flow.
/// All of these are public routes; `PUT /reset-password` carries its
/// credential as a bearer reset token that the handler hands to the manager
/// for purpose and stored-token checks, so it does not go through the
/// session middleware.

use crate::app::AppState;
use crate::error::{validation_error, ApiError, ApiResult};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solestore_shared::accounts::Registration;
use solestore_shared::auth::authenticator::Principal;
use solestore_shared::models::account::{Account, Role};
use uuid::Uuid;
use validator::Validate;

/// Request body for `POST /register`
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 50, message = "Username must be 2-50 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Request body for `POST /login`
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Query string for `GET /verify-email`
#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

/// Request body for `POST /forgot-password`
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Request body for `PUT /reset-password`
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Response body for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// Sanitized account view for the admin listing; never carries the password
/// hash or any stored token.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for UserSummary {
    fn from(account: Account) -> Self {
        UserSummary {
            id: account.id,
            username: account.username,
            email: account.email,
            role: account.role,
            is_verified: account.is_verified,
            is_active: account.is_active,
            created_at: account.created_at,
        }
    }
}

/// `POST /api/v1/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    req.validate().map_err(validation_error)?;

    let outcome = state
        .accounts
        .register(&req.username, &req.email, &req.password)
        .await?;

    let msg = match outcome {
        Registration::Created => "Registered. Please check your email to verify your account",
        Registration::Updated => {
            "Registration refreshed. Please check your email to verify your account"
        }
    };
    Ok((StatusCode::CREATED, Json(json!({ "msg": msg }))))
}

/// `POST /api/v1/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(validation_error)?;

    let outcome = state.accounts.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        token: outcome.token,
        username: outcome.username,
        role: outcome.role,
    }))
}

/// `GET /api/v1/verify-email?token=...`
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> ApiResult<Json<Value>> {
    state.accounts.verify_email(&query.token).await?;
    Ok(Json(json!({ "msg": "Email verified" })))
}

/// `POST /api/v1/forgot-password`
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<Value>> {
    req.validate().map_err(validation_error)?;

    state.accounts.request_password_reset(&req.email).await?;
    Ok(Json(json!({ "msg": "Password reset email sent" })))
}

/// `PUT /api/v1/reset-password`
///
/// The bearer credential is the reset token from the email link, not a
/// session token.
pub async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    req.validate().map_err(validation_error)?;

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("no valid token provided".to_string()))?;

    state
        .accounts
        .reset_password(&req.email, token, &req.password)
        .await?;
    Ok(Json(json!({ "msg": "Password updated" })))
}

/// `GET /api/v1/users` (admin)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_principal): Extension<Principal>,
) -> ApiResult<Json<Value>> {
    let users: Vec<UserSummary> = state
        .accounts
        .list_accounts()
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(Json(json!({ "users": users })))
}
