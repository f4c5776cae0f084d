//! Extractors whose rejections come back as `AppError` JSON bodies, and
//! field deserializers that accept the loosely typed values form-backed
//! clients send (`"2.5"` for a number, `"true"` for a flag).

use axum::extract::{FromRequest, FromRequestParts};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Flag(bool),
    Number(f64),
    Text(String),
}

/// Accepts a JSON number or a numeric string. Blank strings count as absent.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Number(value)) => Ok(Some(value)),
        Some(Loose::Text(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Loose::Text(raw)) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("`{raw}` is not a number"))),
        Some(Loose::Flag(flag)) => Err(D::Error::custom(format!("`{flag}` is not a number"))),
    }
}

/// Accepts a JSON boolean or one of `true/false`, `1/0`, `yes/no`.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Flag(flag)) => Ok(Some(flag)),
        Some(Loose::Number(value)) if value == 1.0 => Ok(Some(true)),
        Some(Loose::Number(value)) if value == 0.0 => Ok(Some(false)),
        Some(Loose::Text(raw)) => match raw.trim() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!("`{raw}` is not a boolean"))),
        },
        Some(Loose::Number(value)) => Err(D::Error::custom(format!("`{value}` is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "lenient_f64")]
        weight: Option<f64>,
        #[serde(default, deserialize_with = "lenient_bool")]
        active: Option<bool>,
    }

    fn parse(value: serde_json::Value) -> Result<Payload, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn numbers_may_arrive_as_strings() {
        assert_eq!(parse(json!({ "weight": 2.5 })).unwrap().weight, Some(2.5));
        assert_eq!(parse(json!({ "weight": "2.5" })).unwrap().weight, Some(2.5));
        assert_eq!(parse(json!({ "weight": " " })).unwrap().weight, None);
        assert_eq!(parse(json!({})).unwrap().weight, None);
        assert!(parse(json!({ "weight": "heavy" })).is_err());
    }

    #[test]
    fn flags_may_arrive_as_strings() {
        assert_eq!(parse(json!({ "active": false })).unwrap().active, Some(false));
        assert_eq!(parse(json!({ "active": "true" })).unwrap().active, Some(true));
        assert_eq!(parse(json!({ "active": 0 })).unwrap().active, Some(false));
        assert_eq!(parse(json!({ "active": null })).unwrap().active, None);
        assert!(parse(json!({ "active": "maybe" })).is_err());
    }
}
