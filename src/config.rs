use std::env;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};
use dotenvy::dotenv;

use crate::error::AppError;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_submit_per_min: u32,

    pub api_prefix: String,

    /// Offset of the office clock from UTC, decides the attendance date
    pub work_utc_offset_minutes: i32,
    pub shift_cache_ttl_secs: u64,

    pub log_dir: String,
    pub log_level: String,
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::Config(format!("{key} must be set")))
}

fn or_default<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let config = Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            db_max_connections: or_default("DB_MAX_CONNECTIONS", 10)?,

            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_submit_per_min: or_default("RATE_SUBMIT_PER_MIN", 30)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            work_utc_offset_minutes: or_default("WORK_UTC_OFFSET_MINUTES", 0)?,
            shift_cache_ttl_secs: or_default("SHIFT_CACHE_TTL_SECS", 60)?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        if FixedOffset::east_opt(config.work_utc_offset_minutes * 60).is_none() {
            return Err(AppError::Config(format!(
                "WORK_UTC_OFFSET_MINUTES out of range: {}",
                config.work_utc_offset_minutes
            )));
        }
        if config.jwt_secret.is_empty() {
            return Err(AppError::Config("JWT_SECRET must not be empty".to_string()));
        }

        Ok(config)
    }

    pub fn work_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.work_utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            db_max_connections: 1,
            rate_protected_per_min: 1000,
            rate_submit_per_min: 1000,
            api_prefix: "/api".to_string(),
            work_utc_offset_minutes: 0,
            shift_cache_ttl_secs: 60,
            log_dir: "logs".to_string(),
            log_level: "info".to_string(),
        }
    }
}
