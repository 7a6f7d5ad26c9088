use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Prefix of the URLs handed out for uploaded images.
    pub media_base_url: String,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub max_upload_bytes: usize,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Defaults for everything but the signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            jwt_secret: jwt_secret.into(),
            token_ttl_hours: 24,
            media_base_url: "http://localhost:3000/media".into(),
            request_timeout_secs: 10,
            max_concurrent_requests: 256,
            max_upload_bytes: 5 * 1024 * 1024,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Reads the environment (after `.env` has been loaded).
    pub fn load() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        let defaults = Self::new(jwt_secret);

        Ok(Self {
            bind_addr: try_load("BIND_ADDR", defaults.bind_addr)?,
            token_ttl_hours: try_load("TOKEN_TTL_HOURS", defaults.token_ttl_hours)?,
            media_base_url: try_load("MEDIA_BASE_URL", defaults.media_base_url)?,
            request_timeout_secs: try_load("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            max_concurrent_requests: try_load(
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            )?,
            max_upload_bytes: try_load("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            bcrypt_cost: try_load("BCRYPT_COST", defaults.bcrypt_cost)?,
            jwt_secret: defaults.jwt_secret,
        })
    }

    /// Request body cap; images travel base64 encoded inside JSON.
    pub fn max_body_bytes(&self) -> usize {
        self.max_upload_bytes / 3 * 4 + 64 * 1024
    }
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                value,
                reason: e.to_string(),
            }
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
