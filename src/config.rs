// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Signing secrets are read once at startup and kept in memory.

use crate::time_utils::parse_duration;
use chrono::Duration;
use std::env;

/// Minimum Argon2 iteration count we accept.
const MIN_HASH_ITERATIONS: u32 = 2;

/// Longest lifetime accepted for any token.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// First tenant and administrator created at startup, if requested.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub tenant_name: String,
    pub tenant_domain: String,
    pub admin_email: String,
    pub admin_password: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    /// HMAC key for access tokens (raw bytes)
    pub jwt_access_secret: Vec<u8>,
    /// HMAC key for refresh tokens; never equal to the access key
    pub jwt_refresh_secret: Vec<u8>,
    /// `iss` claim stamped on and required from every token
    pub jwt_issuer: String,
    /// `aud` claim stamped on and required from every token
    pub jwt_audience: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub password_reset_ttl: Duration,

    /// Argon2id memory cost in KiB
    pub password_hash_memory_kib: u32,
    /// Argon2id iteration count
    pub password_hash_iterations: u32,

    pub bootstrap: Option<BootstrapConfig>,
}

impl Config {
    /// Deterministic configuration for tests (cheap password hashing).
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            jwt_access_secret: b"test_access_key_32_bytes_minimum!".to_vec(),
            jwt_refresh_secret: b"test_refresh_key_32_bytes_minimum".to_vec(),
            jwt_issuer: "academy-api".to_string(),
            jwt_audience: "academy-web".to_string(),
            access_token_ttl: Duration::days(7),
            refresh_token_ttl: Duration::days(30),
            password_reset_ttl: Duration::hours(1),
            password_hash_memory_kib: 1024,
            password_hash_iterations: MIN_HASH_ITERATIONS,
            bootstrap: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_access_secret = required("JWT_ACCESS_SECRET")?.into_bytes();
        let jwt_refresh_secret = required("JWT_REFRESH_SECRET")?.into_bytes();
        if jwt_access_secret == jwt_refresh_secret {
            return Err(ConfigError::Invalid(
                "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ".to_string(),
            ));
        }

        let password_hash_iterations =
            u32_var("PASSWORD_HASH_ITERATIONS")?.unwrap_or(MIN_HASH_ITERATIONS);
        if password_hash_iterations < MIN_HASH_ITERATIONS {
            return Err(ConfigError::Invalid(format!(
                "PASSWORD_HASH_ITERATIONS must be at least {MIN_HASH_ITERATIONS}"
            )));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_access_secret,
            jwt_refresh_secret,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "academy-api".to_string()),
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "academy-web".to_string()),
            access_token_ttl: duration_var("ACCESS_TOKEN_TTL", "7d")?,
            refresh_token_ttl: duration_var("REFRESH_TOKEN_TTL", "30d")?,
            password_reset_ttl: duration_var("PASSWORD_RESET_TTL", "1h")?,
            password_hash_memory_kib: u32_var("PASSWORD_HASH_MEMORY_KIB")?
                .unwrap_or(argon2::Params::DEFAULT_M_COST),
            password_hash_iterations,
            bootstrap: bootstrap_from_env(),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn u32_var(name: &'static str) -> Result<Option<u32>, ConfigError> {
    env::var(name)
        .ok()
        .map(|v| v.trim().parse::<u32>())
        .transpose()
        .map_err(|_| ConfigError::Invalid(name.to_string()))
}

fn duration_var(name: &'static str, default: &str) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_lifetime(name, &raw)
}

/// Parse a token lifetime, refusing anything longer than ten years.
fn parse_lifetime(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    parse_duration(raw)
        .filter(|ttl| *ttl <= Duration::days(MAX_TOKEN_TTL_DAYS))
        .ok_or_else(|| ConfigError::Invalid(format!("{name}={raw}")))
}

fn bootstrap_from_env() -> Option<BootstrapConfig> {
    let tenant_domain = env::var("BOOTSTRAP_TENANT_DOMAIN").ok()?;
    let admin_email = env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?;
    let admin_password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?;
    Some(BootstrapConfig {
        tenant_name: env::var("BOOTSTRAP_TENANT_NAME").unwrap_or_else(|_| tenant_domain.clone()),
        tenant_domain,
        admin_email,
        admin_password,
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // All cases share process-wide env vars, so they run in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_ACCESS_SECRET", "access_secret_for_tests");
        env::set_var("JWT_REFRESH_SECRET", "access_secret_for_tests");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));

        env::set_var("JWT_REFRESH_SECRET", "refresh_secret_for_tests");
        env::set_var("ACCESS_TOKEN_TTL", "15m");
        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_access_secret, b"access_secret_for_tests");
        assert_eq!(config.access_token_ttl, Duration::minutes(15));
        assert_eq!(config.refresh_token_ttl, Duration::days(30));
        assert_eq!(config.password_hash_iterations, MIN_HASH_ITERATIONS);
        assert_eq!(config.password_hash_memory_kib, argon2::Params::DEFAULT_M_COST);

        env::set_var("PASSWORD_HASH_MEMORY_KIB", "64MiB");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid(name)) if name == "PASSWORD_HASH_MEMORY_KIB"
        ));
        env::set_var("PASSWORD_HASH_MEMORY_KIB", "19456");
        assert_eq!(Config::from_env().unwrap().password_hash_memory_kib, 19456);
        env::remove_var("PASSWORD_HASH_MEMORY_KIB");

        env::set_var("REFRESH_TOKEN_TTL", "100000000w");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));
        env::remove_var("REFRESH_TOKEN_TTL");
        env::remove_var("ACCESS_TOKEN_TTL");
    }

    #[test]
    fn test_lifetime_bounds() {
        assert_eq!(
            parse_lifetime("ACCESS_TOKEN_TTL", "15m").unwrap(),
            Duration::minutes(15)
        );
        assert_eq!(
            parse_lifetime("REFRESH_TOKEN_TTL", "3650d").unwrap(),
            Duration::days(3650)
        );
        assert!(parse_lifetime("REFRESH_TOKEN_TTL", "3651d").is_err());
        assert!(parse_lifetime("REFRESH_TOKEN_TTL", "100000000w").is_err());
    }

    #[test]
    fn test_test_default_secrets_differ() {
        let config = Config::test_default();
        assert_ne!(config.jwt_access_secret, config.jwt_refresh_secret);
    }
}
