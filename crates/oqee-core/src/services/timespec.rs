use chrono::{DateTime, Local, LocalResult, NaiveDateTime, NaiveTime, TimeZone};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeSpecError {
    #[error("unrecognized time format: {0:?} (expected \"HH:MM\" or \"MM/DD HH:MM\")")]
    InvalidFormat(String),
    #[error("unsupported time value: {0}")]
    InvalidInput(String),
}

/// A point in time as tools accept it: absent (now), an epoch second
/// count, or a clock/date string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSpec {
    Now,
    Epoch(i64),
    Text(String),
}

impl TimeSpec {
    pub fn from_value(value: Option<&Value>) -> Result<Self, TimeSpecError> {
        match value {
            None | Some(Value::Null) => Ok(Self::Now),
            Some(Value::Number(number)) => number
                .as_i64()
                .map(Self::Epoch)
                .ok_or_else(|| TimeSpecError::InvalidInput(number.to_string())),
            Some(Value::String(text)) => Ok(Self::Text(text.clone())),
            Some(other) => Err(TimeSpecError::InvalidInput(other.to_string())),
        }
    }

    /// Resolves against an explicit `now` so callers control the clock.
    ///
    /// Strings try `HH:MM` on today's date first, then `MM/DD HH:MM` in the
    /// current year. Calendar-impossible values (bad day of month, a DST
    /// gap) fail like any other malformed string.
    pub fn resolve_at(&self, now: DateTime<Local>) -> Result<DateTime<Local>, TimeSpecError> {
        match self {
            Self::Now => Ok(now),
            Self::Epoch(seconds) => match Local.timestamp_opt(*seconds, 0) {
                LocalResult::Single(instant) => Ok(instant),
                _ => Err(TimeSpecError::InvalidFormat(seconds.to_string())),
            },
            Self::Text(text) => resolve_text(text, now),
        }
    }
}

/// Resolves a raw tool argument to a local instant on the wall clock.
pub fn parse(value: Option<&Value>) -> Result<DateTime<Local>, TimeSpecError> {
    TimeSpec::from_value(value)?.resolve_at(Local::now())
}

/// Renders an epoch second count in local time, `None` if the timestamp
/// does not map to a representable instant.
pub fn format_local(seconds: i64, pattern: &str) -> Option<String> {
    DateTime::from_timestamp(seconds, 0)
        .map(|utc| utc.with_timezone(&Local).format(pattern).to_string())
}

fn resolve_text(text: &str, now: DateTime<Local>) -> Result<DateTime<Local>, TimeSpecError> {
    if let Ok(clock) = NaiveTime::parse_from_str(text, "%H:%M") {
        return into_local(now.date_naive().and_time(clock), text);
    }

    let with_year = format!("{}/{}", now.format("%Y"), text);
    if let Ok(stamp) = NaiveDateTime::parse_from_str(&with_year, "%Y/%m/%d %H:%M") {
        return into_local(stamp, text);
    }

    Err(TimeSpecError::InvalidFormat(text.to_string()))
}

fn into_local(stamp: NaiveDateTime, origin: &str) -> Result<DateTime<Local>, TimeSpecError> {
    match Local.from_local_datetime(&stamp) {
        LocalResult::Single(instant) => Ok(instant),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(TimeSpecError::InvalidFormat(origin.to_string())),
    }
}
