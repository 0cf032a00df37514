//! Forgiving field decoders for upstream JSON.
//!
//! Both upstream services return loosely typed records: numbers arrive as
//! strings, strings arrive as null. These helpers apply the defaulting rules
//! at the deserialization boundary so the rest of the crate sees plain types.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::library::CatalogId;

/// `null` or missing becomes `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn unknown() -> String {
    "Unknown".to_string()
}

/// Missing, null or blank text becomes `"Unknown"`.
pub fn text_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(unknown))
}

/// Integer or numeric string. Anything else is `None`.
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_as_i64(&Value::deserialize(deserializer)?))
}

/// Positive identifier. Zero, negatives and junk are `None`.
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_as_i64(&Value::deserialize(deserializer)?)
        .filter(|n| *n > 0)
        .map(|n| n as u64))
}

/// Non-negative count. Unparseable values count as zero.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_as_i64(&Value::deserialize(deserializer)?)
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0))
}

/// Any number as `f64`; strings are parsed, everything else is zero.
pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Library catalog id. Unsigned integers and strings are kept as-is,
/// `null` and any other shape become `None`.
pub fn catalog_id<'de, D>(deserializer: D) -> Result<Option<CatalogId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().map(CatalogId::Numeric),
        Value::String(s) => Some(CatalogId::Text(s)),
        _ => None,
    })
}

pub(crate) fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
