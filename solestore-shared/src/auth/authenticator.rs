/// Bearer-credential authentication for Axum
///
/// A request credential can be one of two token kinds, and the dispatch is a
/// tagged union rather than structural sniffing spread over call sites:
///
/// - [`BearerToken::External`]: an externally issued identity token whose
///   payload decodes and carries both a subject (`sub`) and a token
///   identifier (`jti`). **The signature is never checked** and no local
///   account lookup happens; any holder of a well-formed payload is accepted
///   as that identity. This inherited trust boundary lives in exactly this
///   variant so it stays auditable.
/// - [`BearerToken::Session`]: a locally signed session token, fully
///   verified (signature and expiry).
///
/// Either kind resolves to a uniform [`Principal`] that is attached to the
/// request extensions for downstream authorization: `role` for admin-only
/// routes, `id` for ownership checks.

use crate::auth::token::{ExternalClaims, SessionClaims, TokenCodec};
use crate::models::account::Role;
use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// The two kinds of accepted bearer tokens, classified by one entry point
#[derive(Debug, Clone)]
pub enum BearerToken {
    /// Externally issued identity token, payload decoded without verification
    External(ExternalClaims),

    /// Locally issued session token, signature and expiry verified
    Session(SessionClaims),
}

/// Resolved identity attached to a request after authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier
    ///
    /// For session principals this is the account UUID; for external
    /// principals it is the provider subject plus the `123` suffix the
    /// storefront has always appended to keep the two id spaces apart.
    pub id: String,

    /// Display name
    pub username: String,

    /// Email address
    pub email: String,

    /// Role for admin-only routes (external principals are plain users)
    pub role: Role,

    /// Whether the identity is active
    pub is_active: bool,
}

impl Principal {
    fn from_session(claims: SessionClaims) -> Self {
        Principal {
            id: claims.sub.to_string(),
            username: claims.username,
            email: claims.email,
            role: claims.role,
            is_active: true,
        }
    }

    fn from_external(claims: ExternalClaims) -> Option<Self> {
        let sub = claims.sub?;
        // jti is required for classification even though it is not kept
        claims.jti?;
        let email = claims.email.unwrap_or_default();
        let username = claims.name.unwrap_or_else(|| email.clone());
        Some(Principal {
            id: format!("{sub}123"),
            username,
            email,
            role: Role::User,
            is_active: true,
        })
    }

    /// Whether the principal may use admin-only routes
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the principal owns a document created by `creator_id`
    pub fn owns(&self, creator_id: &str) -> bool {
        self.id == creator_id
    }
}

/// Error type for the authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// No credential, or not bearer-schemed
    MissingCredentials,

    /// Credential present but not acceptable as either token kind
    InvalidToken,

    /// Authenticated but lacking the required role
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "no valid token provided").into_response()
            }
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token").into_response(),
            AuthError::Forbidden => {
                (StatusCode::FORBIDDEN, "admin role required").into_response()
            }
        }
    }
}

/// Classifies and resolves bearer credentials into principals
#[derive(Clone)]
pub struct Authenticator {
    codec: TokenCodec,
}

impl Authenticator {
    /// Creates an authenticator over the given codec
    pub fn new(codec: TokenCodec) -> Self {
        Authenticator { codec }
    }

    /// Classifies a raw bearer token into its kind
    ///
    /// External classification wins when the payload decodes and carries both
    /// `sub` and `jti`; everything else must pass full session verification.
    pub fn classify_bearer(&self, token: &str) -> Result<BearerToken, AuthError> {
        if let Ok(claims) = self.codec.decode_external_token(token) {
            if claims.sub.is_some() && claims.jti.is_some() {
                return Ok(BearerToken::External(claims));
            }
        }

        match self.codec.verify_session_token(token) {
            Ok(claims) => Ok(BearerToken::Session(claims)),
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Resolves an `Authorization` header value into a principal
    pub fn resolve(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        let header_value = authorization.ok_or(AuthError::MissingCredentials)?;
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingCredentials)?;

        match self.classify_bearer(token)? {
            BearerToken::External(claims) => {
                Principal::from_external(claims).ok_or(AuthError::InvalidToken)
            }
            BearerToken::Session(claims) => Ok(Principal::from_session(claims)),
        }
    }
}

/// Authentication middleware
///
/// Resolves the bearer credential and inserts the [`Principal`] into request
/// extensions. Handlers extract it with `Extension<Principal>`.
pub async fn auth_middleware(
    authenticator: Authenticator,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let principal = authenticator.resolve(authorization)?;
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Admin-gate middleware; must run after [`auth_middleware`]
pub async fn admin_middleware(req: Request, next: Next) -> Result<Response, AuthError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or(AuthError::MissingCredentials)?;

    if !principal.is_admin() {
        tracing::warn!(principal = %principal.id, "admin route rejected");
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(req).await)
}

/// Creates an authentication middleware closure capturing the authenticator
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use solestore_shared::auth::authenticator::{create_auth_middleware, Authenticator};
/// use solestore_shared::auth::token::{TokenCodec, TokenConfig};
///
/// let codec = TokenCodec::new(TokenConfig::new("session-secret", "purpose-secret"));
/// let app: Router = Router::new()
///     .route("/orders", get(|| async { "OK" }))
///     .layer(middleware::from_fn(create_auth_middleware(
///         Authenticator::new(codec),
///     )));
/// ```
pub fn create_auth_middleware(
    authenticator: Authenticator,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>
       + Clone {
    move |req, next| {
        let authenticator = authenticator.clone();
        Box::pin(auth_middleware(authenticator, req, next))
    }
}
