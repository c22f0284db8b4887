//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides.
//! The configuration file path defaults to `config.yaml` but can be specified via
//! `-f` flag or the `PIZZERIA_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override
//! earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `PIZZERIA_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For
//! example, `PIZZERIA_AUTH__SECRET_KEY=...` sets the `auth.secret_key` field.
//!
//! ## Example
//!
//! ```yaml
//! host: "0.0.0.0"
//! port: 8000
//! database:
//!   url: "sqlite://pizzeria.db"
//! admin_email: "admin@example.com"
//! admin_password: "change-me"
//! auth:
//!   secret_key: "a-long-random-string"
//!   algorithm: "HS256"
//!   access_token_expiry: "30m"
//!   refresh_token_expiry: "7d"
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PIZZERIA_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment
/// variables. All fields have sensible defaults defined in the `Default`
/// implementation; only `auth.secret_key` is required.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Special case: DATABASE_URL environment variable override for `database.url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Email address for the initial admin user (created on first startup if set)
    pub admin_email: Option<String>,
    /// Password for the initial admin user
    pub admin_password: Option<String>,
    /// Token signing and lifetime configuration
    pub auth: AuthConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection URL. The database file is created if missing.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pizzeria.db".to_string(),
        }
    }
}

/// Token signing configuration.
///
/// Constructed once at startup and passed by reference into the token
/// service - never read as ambient global state.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Secret key for JWT signing (required)
    pub secret_key: Option<String>,
    /// JWT signing algorithm name (e.g. "HS256")
    pub algorithm: String,
    /// Access token lifetime
    #[serde(with = "humantime_serde")]
    pub access_token_expiry: Duration,
    /// Refresh token lifetime
    #[serde(with = "humantime_serde")]
    pub refresh_token_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            algorithm: "HS256".to_string(),
            access_token_expiry: Duration::from_secs(30 * 60),          // 30 minutes
            refresh_token_expiry: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: None,
            database: DatabaseConfig::default(),
            admin_email: None,
            admin_password: None,
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // if database_url is set, use it
        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("PIZZERIA_").split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: auth.secret_key is not configured. \
                     Please set PIZZERIA_AUTH__SECRET_KEY or add auth.secret_key to the config file."
                    .to_string(),
            });
        }

        if self.auth.algorithm.parse::<jsonwebtoken::Algorithm>().is_err() {
            return Err(Error::Internal {
                operation: format!("Config validation: unknown JWT algorithm '{}'", self.auth.algorithm),
            });
        }

        if self.auth.access_token_expiry.as_secs() < 60 {
            return Err(Error::Internal {
                operation: "Config validation: access token expiry is too short (minimum 1 minute)".to_string(),
            });
        }

        if self.auth.refresh_token_expiry < self.auth.access_token_expiry {
            return Err(Error::Internal {
                operation: "Config validation: refresh token expiry must not be shorter than access token expiry".to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.auth.algorithm, "HS256");
        assert_eq!(config.auth.access_token_expiry, Duration::from_secs(1800));
        assert_eq!(config.auth.refresh_token_expiry, Duration::from_secs(7 * 24 * 3600));
    }

    #[test]
    fn test_validate_requires_secret_key() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let config = Config {
            auth: AuthConfig {
                secret_key: Some("test-secret".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_algorithm() {
        let config = Config {
            auth: AuthConfig {
                secret_key: Some("test-secret".to_string()),
                algorithm: "ROT13".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_refresh_shorter_than_access() {
        let config = Config {
            auth: AuthConfig {
                secret_key: Some("test-secret".to_string()),
                access_token_expiry: Duration::from_secs(3600),
                refresh_token_expiry: Duration::from_secs(600),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
