//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; handlers only ever see the cached
//! `Config` inside the shared state.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Path to the SQLite database file
    pub database_path: String,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Base URL of the external route recommendation service
    pub route_service_url: String,

    /// JWT signing key for access/refresh tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Access token lifetime in seconds (default 1 hour)
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds (default 14 days)
    pub refresh_token_ttl_secs: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/crewrun.db".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            route_service_url: env::var("ROUTE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            access_token_ttl_secs: parse_ttl("ACCESS_TOKEN_TTL_SECS", 60 * 60)?,
            refresh_token_ttl_secs: parse_ttl("REFRESH_TOKEN_TTL_SECS", 14 * 24 * 60 * 60)?,
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            database_path: ":memory:".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            route_service_url: "http://localhost:5000".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            access_token_ttl_secs: 60 * 60,
            refresh_token_ttl_secs: 14 * 24 * 60 * 60,
        }
    }
}

fn parse_ttl(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(var)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!!");
        env::remove_var("ACCESS_TOKEN_TTL_SECS");
        env::remove_var("REFRESH_TOKEN_TTL_SECS");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_ttl_secs, 3600);
        assert_eq!(config.refresh_token_ttl_secs, 14 * 24 * 60 * 60);
    }
}
