/// Account model: identity, credentials and trust state
///
/// An account is created unverified at registration and may only authenticate
/// after its email has been verified. The password is stored as an Argon2id
/// hash, never in clear form; hashing happens before persistence and on every
/// update that changes the password.
///
/// The single-use purpose tokens (`email_verification_token`,
/// `reset_password_token`) are stored on the document and cleared immediately
/// after successful use. Single use is enforced by clearing, not by a
/// revocation list.
///
/// Addresses are embedded in the account document and are not independently
/// addressable. At most one address carries `is_default = true`; every
/// mutation of the list is performed as one whole-document write so the
/// invariant can never be observed half-applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role attached to an account, used for admin-only routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Shipping address embedded in an account document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Address entry ID, unique within the owning account
    pub id: Uuid,

    /// Recipient full name
    pub full_name: String,

    /// Contact phone number
    pub phone: String,

    /// Full address as a single string
    pub address: String,

    /// Whether this is the account's default address
    ///
    /// Invariant: at most one entry in an account's list is default.
    pub is_default: bool,
}

/// User account document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,

    /// Email address, globally unique, matched case-sensitively
    pub email: String,

    /// Display name
    pub username: String,

    /// Argon2id password hash (never plaintext)
    pub password_hash: String,

    /// Role for authorization checks
    pub role: Role,

    /// Whether the email address has been verified
    ///
    /// Only verified accounts may log in.
    pub is_verified: bool,

    /// Whether the account is active
    pub is_active: bool,

    /// Pending email-verification token, cleared after single use
    pub email_verification_token: Option<String>,

    /// Pending password-reset token, cleared after single use
    pub reset_password_token: Option<String>,

    /// Embedded address book
    pub addresses: Vec<Address>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a fresh, unverified account
    ///
    /// `password_hash` must already be hashed; this constructor never sees a
    /// clear password.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            email,
            username,
            password_hash,
            role: Role::default(),
            is_verified: false,
            is_active: true,
            email_verification_token: None,
            reset_password_token: None,
            addresses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the default address, if the list is non-empty
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }

    /// Counts entries marked default
    ///
    /// Used by tests and debug assertions; must be 0 for an empty list and
    /// exactly 1 otherwise.
    pub fn default_count(&self) -> usize {
        self.addresses.iter().filter(|a| a.is_default).count()
    }
}
