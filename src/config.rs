use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub osrm_base_url: String,
    pub osrm_profile: String,
    pub osrm_timeout_secs: u64,
    pub default_max_minutes: f64,
    pub default_top_k: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            osrm_base_url: env::var("OSRM_BASE_URL")
                .unwrap_or_else(|_| "http://router.project-osrm.org".to_string())
                .trim_end_matches('/')
                .to_string(),
            osrm_profile: env::var("OSRM_PROFILE").unwrap_or_else(|_| "driving".to_string()),
            osrm_timeout_secs: parse_or_default("OSRM_TIMEOUT_SECS", 5)?,
            default_max_minutes: parse_or_default("OSRM_MAX_MINUTES", 20.0)?,
            default_top_k: parse_or_default("OSRM_TOP_K", 5)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
