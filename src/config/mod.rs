//! Engine configuration.
//!
//! Everything the dispatcher consumes is injected through [`EngineConfig`]:
//! the user-facing error message and the expiration timeout. For host
//! processes that configure through the environment, [`EngineConfig::load`]
//! reads variables with the `COLLOQUY` prefix (`__` separates nested
//! values), loading a `.env` file first when one is present.

use serde::Deserialize;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration consumed by the dispatcher.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Sent to the user when a state fails and the conversation restarts.
    #[serde(default = "default_error_message")]
    pub error_message: String,

    /// How long a conversation may sit idle before the next dispatch
    /// redirects it to the expired state. `None` disables expiration.
    #[serde(default = "default_expired_timeout_secs")]
    pub expired_timeout_secs: Option<u64>,
}

fn default_error_message() -> String {
    "Sorry, something went wrong. We'll have to start over...".to_string()
}

fn default_expired_timeout_secs() -> Option<u64> {
    // 30 minutes
    Some(30 * 60)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            error_message: default_error_message(),
            expired_timeout_secs: default_expired_timeout_secs(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// - `COLLOQUY__ERROR_MESSAGE` -> `error_message`
    /// - `COLLOQUY__EXPIRED_TIMEOUT_SECS` -> `expired_timeout_secs`
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COLLOQUY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Overrides the user-facing error message.
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Sets the expiration timeout in seconds.
    pub fn with_expired_timeout_secs(mut self, secs: u64) -> Self {
        self.expired_timeout_secs = Some(secs);
        self
    }

    /// Disables expiration.
    pub fn without_expiration(mut self) -> Self {
        self.expired_timeout_secs = None;
        self
    }

    /// The expiration timeout as a duration, if enabled.
    pub fn expired_timeout(&self) -> Option<chrono::Duration> {
        self.expired_timeout_secs
            .map(|secs| chrono::Duration::seconds(secs as i64))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.error_message.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "error_message must not be empty".to_string(),
            ));
        }
        if self.expired_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "expired_timeout_secs must be positive; omit it to disable expiration"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
