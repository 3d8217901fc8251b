//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `JWT_SECRET` (required): symmetric secret used to sign and verify credentials
/// - `DATABASE_URL` (optional): PostgreSQL connection string. When unset the
///   server falls back to the in-memory account store.
/// - `SERVER_HOST` (optional): address to bind, defaults to 0.0.0.0
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `TOKEN_TTL_SECS` (optional): credential lifetime, defaults to 15000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
#[derive(Clone, Deserialize)]
pub struct Config {
    pub jwt_secret: String,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_host")]
    pub server_host: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_token_ttl() -> i64 {
    15_000
}

fn default_max_connections() -> u32 {
    5
}

/// Secrets shorter than this are accepted but logged as weak.
const RECOMMENDED_SECRET_LEN: usize = 32;

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or empty
    /// - Environment variable values cannot be parsed into expected types
    /// - `TOKEN_TTL_SECS` is not positive
    pub fn from_env() -> anyhow::Result<Self> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build a config from an explicit set of `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        // Field names are converted: jwt_secret -> JWT_SECRET
        let config = envy::from_iter::<_, Config>(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.jwt_secret.is_empty(), "JWT_SECRET must not be empty");
        anyhow::ensure!(self.token_ttl_secs > 0, "TOKEN_TTL_SECS must be positive");

        if self.jwt_secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = self.jwt_secret.len(),
                "JWT_SECRET is shorter than {RECOMMENDED_SECRET_LEN} bytes"
            );
        }

        Ok(())
    }

    /// Socket address string the HTTP listener binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

// Keeps the secret out of logs and panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("database_max_connections", &self.database_max_connections)
            .finish()
    }
}
