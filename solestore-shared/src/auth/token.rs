/// Token codec: session tokens, purpose tokens, external identity tokens
///
/// Three kinds of bearer material flow through the storefront:
///
/// - **Session tokens**: locally signed (HS256), time-bounded, carrying the
///   account id, username, role and email. Issued at login.
/// - **Purpose tokens**: short-lived signed tokens scoped to a single action.
///   Email verification carries `{account_id}` with a 1-day TTL; password
///   reset carries `{email}` with a 1-hour TTL. The two namespaces are
///   disjoint: claims are tagged with an explicit `purpose` discriminator and
///   carry different fields, so a verification token can never be accepted
///   where a reset token is expected.
/// - **External identity tokens**: opaque tokens minted by an outside
///   identity provider. [`TokenCodec::decode_external_token`] parses the
///   payload **without verifying the signature**; see the method docs for the
///   trust boundary this creates.
///
/// Signing secrets and TTLs come from [`TokenConfig`], passed in explicitly
/// so tests can run with distinct secrets per test.

use crate::models::account::Role;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to create token
    #[error("failed to create token: {0}")]
    CreateError(String),

    /// Signature, shape or claim validation failed
    #[error("invalid token")]
    Invalid,

    /// Token has expired
    #[error("token has expired")]
    Expired,

    /// A purpose token of the wrong kind was presented
    #[error("token issued for a different purpose")]
    WrongPurpose,

    /// Not parseable as a token at all
    #[error("malformed token")]
    Malformed,
}

/// Token result type alias
pub type TokenResult<T> = Result<T, TokenError>;

/// Signing secrets and TTLs for the codec
///
/// Session tokens and purpose tokens are signed with separate secrets, so a
/// leaked reset link can never be replayed as a session.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HS256 secret for session tokens
    pub session_secret: String,

    /// HS256 secret for purpose tokens (verification and reset)
    pub purpose_secret: String,

    /// Session token lifetime
    pub session_ttl: Duration,

    /// Email-verification token lifetime (1 day unless configured otherwise)
    pub verification_ttl: Duration,

    /// Password-reset token lifetime (1 hour unless configured otherwise)
    pub reset_ttl: Duration,
}

impl TokenConfig {
    /// Config with the standard TTLs and the given secrets
    pub fn new(session_secret: impl Into<String>, purpose_secret: impl Into<String>) -> Self {
        TokenConfig {
            session_secret: session_secret.into(),
            purpose_secret: purpose_secret.into(),
            session_ttl: Duration::hours(24),
            verification_ttl: Duration::days(1),
            reset_ttl: Duration::hours(1),
        }
    }
}

/// Claims embedded in a locally issued session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: account ID
    pub sub: Uuid,

    /// Display name at issue time
    pub username: String,

    /// Role at issue time
    pub role: Role,

    /// Email at issue time
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Single-action claim carried by a purpose token
///
/// The `purpose` tag and the disjoint field sets keep the verification and
/// reset namespaces from ever being interchangeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "purpose", rename_all = "snake_case")]
pub enum PurposeClaim {
    /// Email verification, bound to the account being verified
    VerifyEmail { account_id: Uuid },

    /// Password reset, bound to the email the reset was requested for
    ResetPassword { email: String },
}

/// Wire shape of a purpose token's payload
///
/// `jti` makes every issuance unique: re-issuing for the same claim within
/// the same second still mints a different token, so a stored-token match
/// can always tell a superseded token from the current one.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PurposeTokenClaims {
    #[serde(flatten)]
    claim: PurposeClaim,

    jti: Uuid,

    iat: i64,

    exp: i64,
}

/// Payload of an externally issued identity token
///
/// Only the claims the authenticator looks at are modeled; anything else in
/// the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalClaims {
    /// Subject identifier at the external provider
    pub sub: Option<String>,

    /// Token identifier; presence (with `sub`) is what marks a token as external
    pub jti: Option<String>,

    /// Display name, if the provider includes one
    pub name: Option<String>,

    /// Email, if the provider includes one
    pub email: Option<String>,
}

/// Creates and verifies the storefront's bearer tokens
#[derive(Clone)]
pub struct TokenCodec {
    config: TokenConfig,
}

impl TokenCodec {
    /// Creates a codec from explicit configuration
    pub fn new(config: TokenConfig) -> Self {
        TokenCodec { config }
    }

    /// Issues a signed session token for a logged-in account
    ///
    /// Pure function of its input and the configured secret and TTL; no store
    /// access and no side effects.
    pub fn issue_session_token(
        &self,
        account_id: Uuid,
        username: &str,
        role: Role,
        email: &str,
    ) -> TokenResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: account_id,
            username: username.to_string(),
            role,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.config.session_ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.session_secret.as_bytes()),
        )
        .map_err(|e| TokenError::CreateError(e.to_string()))
    }

    /// Verifies a session token's signature and expiry
    pub fn verify_session_token(&self, token: &str) -> TokenResult<SessionClaims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.config.session_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;
        Ok(data.claims)
    }

    /// Issues an email-verification token (TTL: `verification_ttl`)
    pub fn issue_verification_token(&self, account_id: Uuid) -> TokenResult<String> {
        self.issue_purpose_token(
            PurposeClaim::VerifyEmail { account_id },
            self.config.verification_ttl,
        )
    }

    /// Issues a password-reset token (TTL: `reset_ttl`)
    pub fn issue_reset_token(&self, email: &str) -> TokenResult<String> {
        self.issue_purpose_token(
            PurposeClaim::ResetPassword {
                email: email.to_string(),
            },
            self.config.reset_ttl,
        )
    }

    fn issue_purpose_token(&self, claim: PurposeClaim, ttl: Duration) -> TokenResult<String> {
        let now = Utc::now();
        let claims = PurposeTokenClaims {
            claim,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.purpose_secret.as_bytes()),
        )
        .map_err(|e| TokenError::CreateError(e.to_string()))
    }

    /// Verifies a verification token and returns the claimed account ID
    ///
    /// Rejects reset tokens with [`TokenError::WrongPurpose`].
    pub fn verify_verification_token(&self, token: &str) -> TokenResult<Uuid> {
        match self.verify_purpose_token(token)? {
            PurposeClaim::VerifyEmail { account_id } => Ok(account_id),
            PurposeClaim::ResetPassword { .. } => Err(TokenError::WrongPurpose),
        }
    }

    /// Verifies a reset token and returns the claimed email
    ///
    /// Rejects verification tokens with [`TokenError::WrongPurpose`].
    pub fn verify_reset_token(&self, token: &str) -> TokenResult<String> {
        match self.verify_purpose_token(token)? {
            PurposeClaim::ResetPassword { email } => Ok(email),
            PurposeClaim::VerifyEmail { .. } => Err(TokenError::WrongPurpose),
        }
    }

    fn verify_purpose_token(&self, token: &str) -> TokenResult<PurposeClaim> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<PurposeTokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.purpose_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;
        Ok(data.claims.claim)
    }

    /// Decodes an externally issued identity token's payload
    ///
    /// **The signature is not verified.** Any holder of a well-formed payload
    /// is accepted as that identity; the authenticator keeps this case in a
    /// distinct [`crate::auth::authenticator::BearerToken::External`] variant
    /// so the trust boundary stays auditable. Expiry and audience claims are
    /// likewise not checked here.
    pub fn decode_external_token(&self, token: &str) -> TokenResult<ExternalClaims> {
        let mut parts = token.split('.');
        let (_header, payload) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(_sig), None) => (h, p),
            _ => return Err(TokenError::Malformed),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
    }
}
