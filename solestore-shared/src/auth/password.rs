/// Password hashing using Argon2id
///
/// Passwords are transformed before persistence and on every update where
/// they change; a clear password never reaches the store. Hashes are PHC
/// strings, so the parameters travel with the hash and verification needs no
/// extra configuration.
///
/// # Parameters
///
/// - Algorithm: Argon2id
/// - Memory: 64 MB, iterations: 3, parallelism: 4, output: 32 bytes
///
/// # Example
///
/// ```
/// use solestore_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("pw123456")?;
/// assert!(verify_password("pw123456", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("invalid password hash: {0}")]
    InvalidHash(String),
}

/// Hashes a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored hash
///
/// Constant-time comparison; `Ok(false)` means the password is wrong,
/// `Err` means the stored hash itself could not be used.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}
