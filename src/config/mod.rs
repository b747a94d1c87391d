use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HMAC signing secret for session tokens. There is no default:
    /// startup fails without it.
    pub token_secret: String,
    /// Session token lifetime in minutes.
    pub session_ttl_minutes: u64,
    /// Argon2 PHC hash of the global administrator passphrase. When unset,
    /// the global admin login endpoint rejects everything.
    pub admin_passphrase_hash: Option<String>,
    pub enable_cors: bool,
}

impl AppConfig {
    /// Load configuration from the environment. Fails rather than falling
    /// back to a weak built-in signing secret.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let token_secret = env::var("HEARTH_TOKEN_SECRET")
            .map_err(|_| ConfigError::Missing("HEARTH_TOKEN_SECRET"))?;
        if token_secret.trim().is_empty() {
            return Err(ConfigError::Missing("HEARTH_TOKEN_SECRET"));
        }

        let session_ttl_minutes = match env::var("SESSION_TTL_MINUTES") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("SESSION_TTL_MINUTES", v))?,
            Err(_) => 30,
        };

        Ok(Self {
            environment,
            security: SecurityConfig {
                token_secret,
                session_ttl_minutes,
                admin_passphrase_hash: env::var("HEARTH_ADMIN_PASSPHRASE_HASH").ok(),
                enable_cors: true,
            },
        })
    }
}

// Global singleton config - initialized once at startup
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Initialize the config singleton. Called once from main; returns an error
/// if required settings are absent.
pub fn init() -> Result<&'static AppConfig, ConfigError> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }
    let config = AppConfig::from_env()?;
    Ok(CONFIG.get_or_init(|| config))
}

/// Convenience accessor. Panics if `init` has not run.
pub fn config() -> &'static AppConfig {
    CONFIG.get().expect("config::init() must run at startup")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_parse_failure_is_reported() {
        let err = "abc".parse::<u64>();
        assert!(err.is_err());
    }

    #[test]
    fn environment_defaults_to_development() {
        std::env::remove_var("APP_ENV");
        std::env::set_var("HEARTH_TOKEN_SECRET", "unit-test-secret");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.environment, Environment::Development);
    }
}
