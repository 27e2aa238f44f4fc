/// Lenient request field decoding
///
/// Browser forms post hours as strings and send empty strings for unset
/// dates. These helpers accept both shapes so handlers only see typed
/// values:
///
/// - hours: a JSON number or a numeric string, kept as an exact decimal
/// - dates: `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used
/// - clearable fields: absent means "leave unchanged", `null` means "clear"

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn parse_hours<E: de::Error>(value: NumberOrString) -> Result<Option<Decimal>, E> {
    // Shortest round-trip text of the float, so 0.1 stays 0.1
    let text = match value {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::Text(s) if s.trim().is_empty() => return Ok(None),
        NumberOrString::Text(s) => s.trim().to_string(),
    };

    text.parse::<Decimal>()
        .map(Some)
        .map_err(|_| E::custom(format!("invalid hours value: {:?}", text)))
}

/// Hours field that may be absent, null, a number or a numeric string
pub fn optional_hours<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(value) => parse_hours(value),
        None => Ok(None),
    }
}

fn parse_date<E: de::Error>(s: &str) -> Result<NaiveDate, E> {
    let s = s.trim();

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .map_err(|_| E::custom(format!("invalid date: {:?}", s)))
}

/// Date field that may be absent, null or blank
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => parse_date(&s).map(Some),
        _ => Ok(None),
    }
}

/// Clearable date: absent → None, null or blank → Some(None)
///
/// Use with `#[serde(default)]` so an absent field stays None.
pub fn nullable_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_date(deserializer).map(Some)
}

/// Clearable value: absent → None, null → Some(None)
///
/// Use with `#[serde(default)]` so an absent field stays None.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims a string, mapping blank to None
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
