/// Configuration management for the API server
///
/// Loads configuration from environment variables into a typed struct once at
/// startup. Managers never read ambient process state; everything they need
/// (secrets, TTLs, the email link base URL) is handed to their constructors
/// from this struct, which also lets tests run with distinct secrets.
///
/// # Environment Variables
///
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 5000)
/// - `SESSION_TOKEN_SECRET`: HS256 secret for session tokens (required)
/// - `PURPOSE_TOKEN_SECRET`: HS256 secret for verification/reset tokens (required)
/// - `SESSION_TTL_HOURS`: session lifetime (default: 24)
/// - `VERIFICATION_TTL_HOURS`: verification-token lifetime (default: 24)
/// - `RESET_TTL_MINUTES`: reset-token lifetime (default: 60)
/// - `SERVICE_BASE_URL`: base URL for links embedded in emails (default: http://localhost:5000)
/// - `MAIL_SENDER_NAME` / `MAIL_SENDER_EMAIL`: outbound sender identity
/// - `ALLOWED_ORIGINS`: comma-separated CORS origins
/// - `RUST_LOG`: log filter (default: info)

use chrono::Duration;
use serde::{Deserialize, Serialize};
use solestore_shared::auth::token::TokenConfig;
use solestore_shared::mailer::SenderIdentity;
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Token signing configuration
    pub tokens: TokenSettings,

    /// Outbound mail configuration
    pub mail: MailConfig,

    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Token secrets and lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// HS256 secret for session tokens
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub session_secret: String,

    /// HS256 secret for purpose tokens; must differ from the session secret
    pub purpose_secret: String,

    /// Session token lifetime in hours
    pub session_ttl_hours: i64,

    /// Email-verification token lifetime in hours
    pub verification_ttl_hours: i64,

    /// Password-reset token lifetime in minutes
    pub reset_ttl_minutes: i64,
}

/// Outbound mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Sender display name
    pub sender_name: String,

    /// Verified sender address
    pub sender_email: String,

    /// Base URL for links embedded in emails
    pub base_url: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a secret is too
    /// short, or a numeric variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()?;

        let session_secret = env::var("SESSION_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_TOKEN_SECRET environment variable is required"))?;
        let purpose_secret = env::var("PURPOSE_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("PURPOSE_TOKEN_SECRET environment variable is required"))?;

        if session_secret.len() < 32 {
            anyhow::bail!("SESSION_TOKEN_SECRET must be at least 32 characters long");
        }
        if purpose_secret.len() < 32 {
            anyhow::bail!("PURPOSE_TOKEN_SECRET must be at least 32 characters long");
        }
        if session_secret == purpose_secret {
            anyhow::bail!("SESSION_TOKEN_SECRET and PURPOSE_TOKEN_SECRET must differ");
        }

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse::<i64>()?;
        let verification_ttl_hours = env::var("VERIFICATION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse::<i64>()?;
        let reset_ttl_minutes = env::var("RESET_TTL_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<i64>()?;

        let base_url =
            env::var("SERVICE_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
        let sender_name = env::var("MAIL_SENDER_NAME").unwrap_or_else(|_| "Solestore".to_string());
        let sender_email = env::var("MAIL_SENDER_EMAIL")
            .unwrap_or_else(|_| "noreply@solestore.example".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            api: ApiConfig { host, port },
            tokens: TokenSettings {
                session_secret,
                purpose_secret,
                session_ttl_hours,
                verification_ttl_hours,
                reset_ttl_minutes,
            },
            mail: MailConfig {
                sender_name,
                sender_email,
                base_url,
            },
            allowed_origins,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Builds the codec configuration from the loaded settings
    pub fn token_config(&self) -> TokenConfig {
        let mut config = TokenConfig::new(
            self.tokens.session_secret.clone(),
            self.tokens.purpose_secret.clone(),
        );
        config.session_ttl = Duration::hours(self.tokens.session_ttl_hours);
        config.verification_ttl = Duration::hours(self.tokens.verification_ttl_hours);
        config.reset_ttl = Duration::minutes(self.tokens.reset_ttl_minutes);
        config
    }

    /// Sender identity for outbound mail
    pub fn sender_identity(&self) -> SenderIdentity {
        SenderIdentity {
            name: self.mail.sender_name.clone(),
            email: self.mail.sender_email.clone(),
        }
    }
}
