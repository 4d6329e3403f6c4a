//! Configuration loading
//!
//! Values come from an optional TOML file, overridden by `MEDIBOOK__`
//! environment variables (`MEDIBOOK__AUTH__JWT_SECRET` sets `auth.jwt_secret`).

use anyhow::{Context, Result, bail};
use config::{Environment, File, FileFormat};
use medibook_auth::{HashAlgorithm, PasswordPolicy};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Account created at startup when no administrator exists
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Token signing secret; required
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    #[serde(default = "default_max_concurrent_hashes")]
    pub max_concurrent_hashes: usize,
    #[serde(default = "default_hash_timeout_secs")]
    pub hash_timeout_secs: u64,
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            password_cost: default_password_cost(),
            token_ttl_days: default_token_ttl_days(),
            hash_algorithm: HashAlgorithm::default(),
            max_concurrent_hashes: default_max_concurrent_hashes(),
            hash_timeout_secs: default_hash_timeout_secs(),
            bootstrap_admin: None,
        }
    }
}

impl AuthConfig {
    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy {
            algorithm: self.hash_algorithm,
            cost: self.password_cost,
            max_concurrent: self.max_concurrent_hashes,
            timeout: Duration::from_secs(self.hash_timeout_secs),
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_ttl_days)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite:data/medibook.db".to_string()
}

fn default_password_cost() -> u32 {
    medibook_auth::password::DEFAULT_COST
}

fn default_token_ttl_days() -> i64 {
    medibook_auth::DEFAULT_TOKEN_TTL_DAYS
}

fn default_max_concurrent_hashes() -> usize {
    4
}

fn default_hash_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from an optional file plus the process environment
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load with an explicit environment map instead of the process environment
    pub fn load_with_env(path: &str, env: Option<HashMap<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("MEDIBOOK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let config: Config = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse configuration from {}", path))?;
        config.validate()?;

        info!("Loaded configuration (file: {})", path);
        Ok(config)
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            bail!("auth.jwt_secret must be set (or MEDIBOOK__AUTH__JWT_SECRET)");
        }
        if !(4..=31).contains(&self.auth.password_cost) {
            bail!(
                "auth.password_cost must be between 4 and 31, got {}",
                self.auth.password_cost
            );
        }
        if self.auth.token_ttl_days <= 0 {
            bail!("auth.token_ttl_days must be positive");
        }
        if self.auth.max_concurrent_hashes == 0 {
            bail!("auth.max_concurrent_hashes must be at least 1");
        }
        if self.auth.hash_timeout_secs == 0 {
            bail!("auth.hash_timeout_secs must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_missing_secret_fails_startup() {
        let err = Config::load_with_env("/nonexistent/medibook.toml", env(&[])).unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn test_file_values_and_defaults() {
        let file = write_config(
            r#"
            [server]
            port = 9090

            [auth]
            jwt_secret = "from-file"
            hash_algorithm = "argon2"

            [auth.bootstrap_admin]
            email = "root@x.com"
            password = "longenough1"

            [logging]
            format = "json"
            "#,
        );

        let config = Config::load_with_env(file.path().to_str().unwrap(), env(&[])).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.auth.jwt_secret, "from-file");
        assert_eq!(config.auth.password_cost, 12);
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.auth.hash_algorithm, HashAlgorithm::Argon2);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.auth.bootstrap_admin.map(|a| a.email),
            Some("root@x.com".to_string())
        );
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config(
            r#"
            [auth]
            jwt_secret = "from-file"
            password_cost = 10
            "#,
        );

        let config = Config::load_with_env(
            file.path().to_str().unwrap(),
            env(&[
                ("MEDIBOOK__AUTH__JWT_SECRET", "from-env"),
                ("MEDIBOOK__SERVER__PORT", "7000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.auth.password_cost, 10);
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_out_of_range_cost_is_rejected() {
        let file = write_config(
            r#"
            [auth]
            jwt_secret = "s"
            password_cost = 40
            "#,
        );

        assert!(Config::load_with_env(file.path().to_str().unwrap(), env(&[])).is_err());
    }

    #[test]
    fn test_password_policy_from_config() {
        let auth = AuthConfig {
            jwt_secret: "s".to_string(),
            hash_timeout_secs: 3,
            ..AuthConfig::default()
        };
        let policy = auth.password_policy();
        assert_eq!(policy.cost, 12);
        assert_eq!(policy.timeout, Duration::from_secs(3));
        assert_eq!(auth.token_ttl(), chrono::Duration::days(7));
    }
}
