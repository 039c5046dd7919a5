//! Lenient `expiry` parsing.

use chrono::{DateTime, Datelike as _, Utc};
use serde::Deserialize as _;

/// Parse an optional RFC 3339 timestamp, reading the zero time as absent.
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(value.filter(|expiry| expiry.year() > 1))
}
