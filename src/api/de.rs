//! Lenient deserializers for the backend's loosely typed JSON.
//!
//! The PHP backend emits numeric columns either as numbers or as strings
//! depending on the endpoint, and uses empty strings for missing values.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `42` or `"42"` into `i64`.
pub fn int_from_any<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("expected integer, got {:?}", s))),
        Value::Bool(b) => Ok(b as i64),
        other => Err(D::Error::custom(format!("expected integer, got {}", other))),
    }
}

/// Optional [`int_from_any`]: `null` and `""` become `None`.
pub fn opt_int_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected integer, got {:?}", s))),
        Some(other) => Err(D::Error::custom(format!("expected integer, got {}", other))),
    }
}

/// Like [`opt_int_from_any`] but `0` also becomes `None`.
pub fn opt_nonzero_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_int_from_any(deserializer)?.filter(|n| *n != 0))
}

/// Any scalar into `String`; `null` becomes empty.
pub fn string_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(D::Error::custom(format!("expected scalar, got {}", other))),
    }
}

/// Any scalar into `Option<String>`; `null` and `""` become `None`.
pub fn opt_string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = string_from_any(deserializer)?;
    Ok(Some(value).filter(|s| !s.is_empty()))
}

/// Pagination cursor: string or number, `null`/`""` meaning no cursor.
pub fn opt_cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("unsupported cursor value: {}", other))),
    }
}
