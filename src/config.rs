use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub base_path: String,
    pub driver_id_segment: u8,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let driver_id_segment = parse_or_default("DRIVER_ID_SEGMENT", 33u8)?;
        if driver_id_segment > 99 {
            return Err(AppError::Internal(format!(
                "invalid DRIVER_ID_SEGMENT: {driver_id_segment} has more than two digits"
            )));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 8080)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            base_path: normalize_base_path(
                &env::var("BASE_PATH").unwrap_or_else(|_| "/logistics".to_string()),
            )?,
            driver_id_segment,
        })
    }
}

/// Strips trailing slashes; the root prefix becomes the empty string.
pub fn normalize_base_path(raw: &str) -> Result<String, AppError> {
    if !raw.starts_with('/') {
        return Err(AppError::Internal(format!(
            "invalid BASE_PATH: `{raw}` must start with '/'"
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
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
