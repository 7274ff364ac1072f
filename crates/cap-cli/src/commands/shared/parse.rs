use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;

/// Parse a `snake_case` enum value using serde deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Which end of a day a bare date resolves to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DayBound {
    Start,
    End,
}

/// Parse RFC 3339, or `YYYY-MM-DD` resolved to the start or end of that UTC day.
pub fn parse_datetime(raw: &str, field: &str, bound: DayBound) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|error| {
        anyhow::anyhow!("invalid {field} '{raw}': expected YYYY-MM-DD or RFC 3339 ({error})")
    })?;
    let time = match bound {
        DayBound::Start => NaiveTime::MIN,
        DayBound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
            .ok_or_else(|| anyhow::anyhow!("invalid end-of-day time"))?,
    };
    Ok(date.and_time(time).and_utc())
}

/// Parse a JSON object argument.
pub fn parse_json_object(raw: &str, field: &str) -> anyhow::Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|error| anyhow::anyhow!("invalid {field}: {error}"))?;
    if !value.is_object() {
        anyhow::bail!("invalid {field}: expected a JSON object");
    }
    Ok(value)
}
