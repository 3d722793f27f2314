/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: session/purpose token codec and external-token decoding
/// - [`authenticator`]: bearer dispatch, principals, axum middleware
///
/// # Trust model
///
/// Locally issued tokens (session, verification, reset) are HS256-signed and
/// fully verified. Externally issued identity tokens are accepted on payload
/// shape alone, without signature verification; that boundary is confined to
/// `TokenCodec::decode_external_token` and the `BearerToken::External`
/// variant.

pub mod authenticator;
pub mod password;
pub mod token;
