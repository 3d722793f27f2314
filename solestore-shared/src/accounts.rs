/// Account lifecycle manager
///
/// Owns registration, email verification, login, and the password-reset
/// flow. The trust rule it enforces everywhere: only a verified account may
/// authenticate.
///
/// # Registration semantics
///
/// Re-registering an email that exists but is still unverified overwrites
/// the username and password (with a fresh hash) and rotates the
/// verification token, so users who abandoned verification are not stranded.
/// Repeated registration is idempotent from the caller's perspective but
/// invalidates any previously sent verification link. Whether an unverified
/// account should be overwritable by anyone who knows the email is a
/// product-level decision; the behavior is kept and confined to
/// [`AccountManager::register`].
///
/// # Partial failure
///
/// Token and account state are persisted before the outbound email is handed
/// to the sender. A sender failure leaves the stored token valid; registering
/// again rotates it and retries the email.

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenCodec;
use crate::error::{CoreError, CoreResult};
use crate::mailer::{EmailBuilder, EmailSender};
use crate::models::account::{Account, Role};
use crate::store::AccountStore;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of a registration call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new unverified account was created
    Created,

    /// An existing unverified account was overwritten and re-tokened
    Updated,
}

/// Outcome of an email-verification call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The account is now verified
    Verified,

    /// The account was already verified; nothing changed
    AlreadyVerified,
}

/// Successful login result
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Signed session token
    pub token: String,

    /// Display name for the client
    pub username: String,

    /// Role for the client
    pub role: Role,
}

/// Patch for account updates
///
/// Only non-`None` fields are applied. A new password is re-hashed before
/// persistence.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccount {
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

/// Manages registration, verification, login and credential rotation
#[derive(Clone)]
pub struct AccountManager {
    store: Arc<dyn AccountStore>,
    codec: TokenCodec,
    mailer: Arc<dyn EmailSender>,
    emails: EmailBuilder,
}

impl AccountManager {
    /// Creates a manager over explicit collaborators
    ///
    /// Secrets and TTLs live in the codec; nothing here reads ambient
    /// process state.
    pub fn new(
        store: Arc<dyn AccountStore>,
        codec: TokenCodec,
        mailer: Arc<dyn EmailSender>,
        emails: EmailBuilder,
    ) -> Self {
        AccountManager {
            store,
            codec,
            mailer,
            emails,
        }
    }

    /// Registers a new account or refreshes an unverified one
    ///
    /// # Errors
    ///
    /// - `BadRequest` if any field is empty
    /// - `Conflict` if the email belongs to a verified account
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> CoreResult<Registration> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(CoreError::BadRequest(
                "please provide username, email and password".to_string(),
            ));
        }

        match self.store.find_by_email(email).await? {
            Some(existing) if existing.is_verified => {
                Err(CoreError::Conflict("email already in use".to_string()))
            }
            Some(existing) => {
                let hash = hash_password(password)?;
                let token = self.codec.issue_verification_token(existing.id)?;
                let new_username = username.to_string();
                let stored_token = token.clone();
                let existing = self
                    .store
                    .update_with(
                        existing.id,
                        Box::new(move |account| {
                            // Re-checked under the lock: a concurrent
                            // verification must not be overwritten
                            if account.is_verified {
                                return Err(CoreError::Conflict(
                                    "email already in use".to_string(),
                                ));
                            }
                            account.username = new_username;
                            account.password_hash = hash;
                            account.email_verification_token = Some(stored_token);
                            account.updated_at = chrono::Utc::now();
                            Ok(())
                        }),
                    )
                    .await
                    .map_err(|e| {
                        e.or_not_found(|| {
                            CoreError::NotFound(format!("no user with email {email}"))
                        })
                    })?;

                tracing::info!(account = %existing.id, "re-registration of unverified account");
                self.mailer
                    .send(self.emails.verification_email(email, username, &token))
                    .await?;
                Ok(Registration::Updated)
            }
            None => {
                let mut account =
                    Account::new(username.to_string(), email.to_string(), hash_password(password)?);
                let token = self.codec.issue_verification_token(account.id)?;
                account.email_verification_token = Some(token.clone());
                self.store.insert(account.clone()).await?;

                tracing::info!(account = %account.id, "account registered");
                self.mailer
                    .send(self.emails.verification_email(email, username, &token))
                    .await?;
                Ok(Registration::Created)
            }
        }
    }

    /// Consumes an email-verification token
    ///
    /// Single use is enforced by clearing the stored token; verifying twice
    /// with the same link reports `AlreadyVerified` only while the account
    /// stays verified.
    ///
    /// # Errors
    ///
    /// - `BadRequest` on an invalid or expired token
    /// - `NotFound` if the claimed account no longer exists
    pub async fn verify_email(&self, token: &str) -> CoreResult<Verification> {
        let account_id = self
            .codec
            .verify_verification_token(token)
            .map_err(|_| CoreError::BadRequest("invalid or expired token".to_string()))?;

        let account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("user not found".to_string()))?;

        if account.is_verified {
            return Ok(Verification::AlreadyVerified);
        }

        self.store
            .update_with(
                account_id,
                Box::new(|account| {
                    account.is_verified = true;
                    account.email_verification_token = None;
                    account.updated_at = chrono::Utc::now();
                    Ok(())
                }),
            )
            .await
            .map_err(|e| e.or_not_found(|| CoreError::NotFound("user not found".to_string())))?;

        tracing::info!(account = %account_id, "email verified");
        Ok(Verification::Verified)
    }

    /// Authenticates an email/password pair
    ///
    /// Unknown email, unverified account and wrong password all return the
    /// same `Unauthenticated` error so the response never reveals whether an
    /// email is registered. The concrete cause is logged.
    pub async fn login(&self, email: &str, password: &str) -> CoreResult<LoginOutcome> {
        if email.is_empty() || password.is_empty() {
            return Err(CoreError::BadRequest(
                "please provide email and password".to_string(),
            ));
        }

        let account = match self.store.find_by_email(email).await? {
            Some(account) => account,
            None => {
                tracing::debug!(email, "login rejected: unknown email");
                return Err(CoreError::invalid_credentials());
            }
        };

        if !account.is_verified {
            tracing::debug!(account = %account.id, "login rejected: unverified account");
            return Err(CoreError::invalid_credentials());
        }

        if !verify_password(password, &account.password_hash)? {
            tracing::debug!(account = %account.id, "login rejected: password mismatch");
            return Err(CoreError::invalid_credentials());
        }

        let token = self.codec.issue_session_token(
            account.id,
            &account.username,
            account.role,
            &account.email,
        )?;

        Ok(LoginOutcome {
            token,
            username: account.username,
            role: account.role,
        })
    }

    /// Issues and persists a 1-hour password-reset token
    ///
    /// The token is stored on the account, embedded in the reset email, and
    /// returned to the caller.
    ///
    /// # Errors
    ///
    /// `NotFound` if no account has this email.
    pub async fn request_password_reset(&self, email: &str) -> CoreResult<String> {
        let account = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("no user with email {email}")))?;

        let token = self.codec.issue_reset_token(email)?;
        let stored_token = token.clone();
        self.store
            .update_with(
                account.id,
                Box::new(move |account| {
                    account.reset_password_token = Some(stored_token);
                    account.updated_at = chrono::Utc::now();
                    Ok(())
                }),
            )
            .await
            .map_err(|e| {
                e.or_not_found(|| CoreError::NotFound(format!("no user with email {email}")))
            })?;

        self.mailer
            .send(self.emails.reset_email(email, &token))
            .await?;

        Ok(token)
    }

    /// Consumes a reset token and rotates the password
    ///
    /// The presented token must verify as a reset-purpose token for
    /// `email` **and** match the token stored on the account. Context alone
    /// is never trusted: a caller holding a structurally valid reset token
    /// that is not the currently stored one is rejected before any mutation.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` on purpose/claim/stored-token mismatch
    /// - `NotFound` if the account is gone
    pub async fn reset_password(
        &self,
        email: &str,
        presented_token: &str,
        new_password: &str,
    ) -> CoreResult<Account> {
        if new_password.is_empty() {
            return Err(CoreError::BadRequest(
                "please provide a new password".to_string(),
            ));
        }

        let claimed_email = self.codec.verify_reset_token(presented_token).map_err(|e| {
            tracing::debug!(error = %e, "reset rejected: token does not verify");
            CoreError::Unauthenticated("invalid reset token".to_string())
        })?;
        if claimed_email != email {
            tracing::warn!("reset rejected: token issued for a different email");
            return Err(CoreError::Unauthenticated(
                "invalid reset token".to_string(),
            ));
        }

        let account = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("no user with email {email}")))?;

        let hash = hash_password(new_password)?;
        let presented = presented_token.to_string();
        let account = self
            .store
            .update_with(
                account.id,
                Box::new(move |account| {
                    // Stored-token match is checked under the lock so a
                    // superseded token can never win the race
                    if account.reset_password_token.as_deref() != Some(presented.as_str()) {
                        tracing::warn!(account = %account.id, "reset rejected: stored token mismatch");
                        return Err(CoreError::Unauthenticated(
                            "invalid reset token".to_string(),
                        ));
                    }
                    account.password_hash = hash;
                    account.reset_password_token = None;
                    account.updated_at = chrono::Utc::now();
                    Ok(())
                }),
            )
            .await
            .map_err(|e| {
                e.or_not_found(|| CoreError::NotFound(format!("no user with email {email}")))
            })?;

        tracing::info!(account = %account.id, "password reset");
        Ok(account)
    }

    /// Fetches one account
    pub async fn get_account(&self, id: Uuid) -> CoreResult<Account> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("no user with id {id}")))
    }

    /// Lists every account (admin surface)
    pub async fn list_accounts(&self) -> CoreResult<Vec<Account>> {
        Ok(self.store.list().await?)
    }

    /// Applies a patch to an account, re-hashing any new password
    pub async fn update_account(&self, id: Uuid, patch: UpdateAccount) -> CoreResult<Account> {
        let UpdateAccount {
            username,
            password,
            is_active,
        } = patch;
        let hash = password.as_deref().map(hash_password).transpose()?;

        let account = self
            .store
            .update_with(
                id,
                Box::new(move |account| {
                    if let Some(username) = username {
                        account.username = username;
                    }
                    if let Some(hash) = hash {
                        account.password_hash = hash;
                    }
                    if let Some(is_active) = is_active {
                        account.is_active = is_active;
                    }
                    account.updated_at = chrono::Utc::now();
                    Ok(())
                }),
            )
            .await
            .map_err(|e| e.or_not_found(|| CoreError::NotFound(format!("no user with id {id}"))))?;

        Ok(account)
    }

    /// Hard-deletes an account
    pub async fn delete_account(&self, id: Uuid) -> CoreResult<()> {
        if !self.store.delete(id).await? {
            return Err(CoreError::NotFound(format!("no user with id {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenConfig;
    use crate::mailer::{MemoryMailer, SenderIdentity};
    use crate::store::memory::MemoryStore;

    struct Fixture {
        manager: AccountManager,
        store: MemoryStore,
        mailer: MemoryMailer,
        codec: TokenCodec,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mailer = MemoryMailer::new();
        let codec = TokenCodec::new(TokenConfig::new(
            "session-secret-for-tests-32-bytes!!",
            "purpose-secret-for-tests-32-bytes!!",
        ));
        let emails = EmailBuilder::new(
            SenderIdentity {
                name: "Solestore".to_string(),
                email: "noreply@solestore.example".to_string(),
            },
            "http://localhost:5000",
        );
        let manager = AccountManager::new(
            Arc::new(store.clone()),
            codec.clone(),
            Arc::new(mailer.clone()),
            emails,
        );
        Fixture {
            manager,
            store,
            mailer,
            codec,
        }
    }

    #[tokio::test]
    async fn test_register_creates_unverified_account_and_emails_token() {
        let f = fixture();

        let outcome = f
            .manager
            .register("alice", "a@x.com", "pw123456")
            .await
            .unwrap();
        assert_eq!(outcome, Registration::Created);

        let account = f.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(!account.is_verified);
        assert!(account.email_verification_token.is_some());
        assert_ne!(account.password_hash, "pw123456");

        let sent = f.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@x.com");
        assert!(sent[0].html.contains("verify-email?token="));
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let f = fixture();
        assert!(matches!(
            f.manager.register("", "a@x.com", "pw").await,
            Err(CoreError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_reregister_unverified_rotates_token_and_keeps_one_document() {
        let f = fixture();

        f.manager
            .register("alice", "a@x.com", "pw123456")
            .await
            .unwrap();
        let first = f.store.find_by_email("a@x.com").await.unwrap().unwrap();
        let first_token = first.email_verification_token.clone().unwrap();

        let outcome = f
            .manager
            .register("alice2", "a@x.com", "pw-other")
            .await
            .unwrap();
        assert_eq!(outcome, Registration::Updated);

        // Exactly one document for that email, identity preserved
        let accounts = f.store.list().await.unwrap();
        assert_eq!(accounts.len(), 1);
        let second = &accounts[0];
        assert_eq!(second.id, first.id);
        assert_eq!(second.username, "alice2");

        // Fresh verification token, rotated password hash
        let second_token = second.email_verification_token.clone().unwrap();
        assert_ne!(first_token, second_token);
        assert_ne!(first.password_hash, second.password_hash);
    }

    #[tokio::test]
    async fn test_register_verified_email_conflicts() {
        let f = fixture();
        f.manager
            .register("alice", "a@x.com", "pw123456")
            .await
            .unwrap();
        let account = f.store.find_by_email("a@x.com").await.unwrap().unwrap();
        f.manager
            .verify_email(&account.email_verification_token.unwrap())
            .await
            .unwrap();

        assert!(matches!(
            f.manager.register("mallory", "a@x.com", "pw").await,
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_email_sets_flag_and_clears_token() {
        let f = fixture();
        f.manager
            .register("alice", "a@x.com", "pw123456")
            .await
            .unwrap();
        let token = f
            .store
            .find_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap()
            .email_verification_token
            .unwrap();

        assert_eq!(
            f.manager.verify_email(&token).await.unwrap(),
            Verification::Verified
        );

        let account = f.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(account.is_verified);
        assert!(account.email_verification_token.is_none());

        // Replay is a no-op, not an error
        assert_eq!(
            f.manager.verify_email(&token).await.unwrap(),
            Verification::AlreadyVerified
        );
    }

    #[tokio::test]
    async fn test_verify_email_bad_token() {
        let f = fixture();
        assert!(matches!(
            f.manager.verify_email("garbage").await,
            Err(CoreError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_email_account_gone() {
        let f = fixture();
        let token = f
            .codec
            .issue_verification_token(Uuid::new_v4())
            .unwrap();
        assert!(matches!(
            f.manager.verify_email(&token).await,
            Err(CoreError::NotFound(_))
        ));
    }

    async fn register_and_verify(f: &Fixture) {
        f.manager
            .register("alice", "a@x.com", "pw123456")
            .await
            .unwrap();
        let token = f
            .store
            .find_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap()
            .email_verification_token
            .unwrap();
        f.manager.verify_email(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_scenario() {
        let f = fixture();

        // Before verification
        f.manager
            .register("alice", "a@x.com", "pw123456")
            .await
            .unwrap();
        assert!(matches!(
            f.manager.login("a@x.com", "pw123456").await,
            Err(CoreError::Unauthenticated(_))
        ));

        // After verification
        let token = f
            .store
            .find_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap()
            .email_verification_token
            .unwrap();
        f.manager.verify_email(&token).await.unwrap();

        let outcome = f.manager.login("a@x.com", "pw123456").await.unwrap();
        assert_eq!(outcome.username, "alice");
        assert_eq!(outcome.role, Role::User);
        assert!(!outcome.token.is_empty());

        // Wrong password
        assert!(matches!(
            f.manager.login("a@x.com", "wrong-pw").await,
            Err(CoreError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let f = fixture();
        register_and_verify(&f).await;

        let unknown = f.manager.login("nobody@x.com", "pw123456").await;
        let wrong = f.manager.login("a@x.com", "wrong").await;

        let unknown_msg = unknown.unwrap_err().to_string();
        let wrong_msg = wrong.unwrap_err().to_string();
        assert_eq!(unknown_msg, wrong_msg);
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let f = fixture();
        register_and_verify(&f).await;

        let token = f.manager.request_password_reset("a@x.com").await.unwrap();
        let stored = f
            .store
            .find_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap()
            .reset_password_token;
        assert_eq!(stored.as_deref(), Some(token.as_str()));

        f.manager
            .reset_password("a@x.com", &token, "new-pw-9999")
            .await
            .unwrap();

        // Token cleared, new password live
        let account = f.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(account.reset_password_token.is_none());
        assert!(f.manager.login("a@x.com", "new-pw-9999").await.is_ok());
        assert!(f.manager.login("a@x.com", "pw123456").await.is_err());
    }

    #[tokio::test]
    async fn test_reset_rejects_token_that_is_not_the_stored_one() {
        let f = fixture();
        register_and_verify(&f).await;

        // First token gets superseded by a second request
        let first = f.manager.request_password_reset("a@x.com").await.unwrap();
        let second = f.manager.request_password_reset("a@x.com").await.unwrap();
        assert_ne!(first, second);

        // The first token still verifies cryptographically, but it is no
        // longer the stored one
        assert!(matches!(
            f.manager.reset_password("a@x.com", &first, "new-pw").await,
            Err(CoreError::Unauthenticated(_))
        ));

        // The stored one works
        f.manager
            .reset_password("a@x.com", &second, "new-pw")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_rejects_verification_token() {
        let f = fixture();
        register_and_verify(&f).await;

        let account = f.store.find_by_email("a@x.com").await.unwrap().unwrap();
        let verification = f.codec.issue_verification_token(account.id).unwrap();

        assert!(matches!(
            f.manager
                .reset_password("a@x.com", &verification, "new-pw")
                .await,
            Err(CoreError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_unknown_email() {
        let f = fixture();
        assert!(matches!(
            f.manager.request_password_reset("nobody@x.com").await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_account_rehashes_password() {
        let f = fixture();
        register_and_verify(&f).await;
        let account = f.store.find_by_email("a@x.com").await.unwrap().unwrap();
        let old_hash = account.password_hash.clone();

        let updated = f
            .manager
            .update_account(
                account.id,
                UpdateAccount {
                    password: Some("rotated-pw".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_ne!(updated.password_hash, old_hash);
        assert!(!updated.password_hash.contains("rotated-pw"));
        assert!(f.manager.login("a@x.com", "rotated-pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_account() {
        let f = fixture();
        register_and_verify(&f).await;
        let account = f.store.find_by_email("a@x.com").await.unwrap().unwrap();

        f.manager.delete_account(account.id).await.unwrap();
        assert!(matches!(
            f.manager.delete_account(account.id).await,
            Err(CoreError::NotFound(_))
        ));
    }
}
