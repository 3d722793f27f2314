/// Common error taxonomy for the storefront core
///
/// Every manager operation returns `Result<T, CoreError>`. The variants map
/// one-to-one onto transport-level responses at the API boundary, so managers
/// raise the typed failure at the point of detection and never retry.
///
/// # Variants
///
/// - `BadRequest`: malformed or missing input, invalid or expired token
/// - `Unauthenticated`: missing/invalid credential, wrong password, unverified account
/// - `Forbidden`: authenticated but not authorized for the target resource
/// - `NotFound`: referenced entity absent
/// - `Conflict`: would violate a uniqueness or state invariant
/// - `Internal`: store or collaborator failure not attributable to the caller

use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;
use crate::mailer::MailError;
use crate::store::StoreError;
use thiserror::Error;

/// Result alias used throughout the managers
pub type CoreResult<T> = Result<T, CoreError>;

/// Typed failure surfaced unmodified to the boundary layer
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or missing input, including invalid or expired tokens
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Credential missing, unverifiable, or rejected
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Principal resolved but not allowed to touch the target resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness or state-machine invariant would be violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// Store or collaborator failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Uniform credential-rejection error returned by login
    ///
    /// Unknown email, unverified account and wrong password must be
    /// indistinguishable to the client to prevent account enumeration.
    /// The concrete cause is logged internally before this is raised.
    pub fn invalid_credentials() -> Self {
        CoreError::Unauthenticated("invalid credentials".to_string())
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => {
                CoreError::Conflict("email already in use".to_string())
            }
            StoreError::Backend(msg) => CoreError::Internal(msg),
        }
    }
}

impl From<PasswordError> for CoreError {
    fn from(err: PasswordError) -> Self {
        CoreError::Internal(err.to_string())
    }
}

impl From<TokenError> for CoreError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::CreateError(msg) => CoreError::Internal(msg),
            _ => CoreError::BadRequest("invalid or expired token".to_string()),
        }
    }
}

impl From<MailError> for CoreError {
    fn from(err: MailError) -> Self {
        CoreError::Internal(err.to_string())
    }
}
