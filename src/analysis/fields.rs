//! Typed parsing of raw trip fields.
//!
//! Every conversion from export text to a number, date key or timestamp
//! goes through here so that failures surface as one [`ParseError`] type.

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

/// Timestamp layout used by the export, without the trailing zone name.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

const SECONDS_PER_DAY: i64 = 86_400;

/// A field value that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{field}: '{value}' is not a number")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field}: '{value}' does not match 'YYYY-MM-DD HH:MM:SS +HHMM ZONE'")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("{field} is missing")]
    MissingTimestamp { field: &'static str },

    #[error("Request Time: '{value}' has no year-month part")]
    MalformedRequestTime { value: String },
}

/// Parse an optional decimal amount. Missing or empty values are zero.
pub fn parse_amount(field: &'static str, raw: Option<&str>) -> Result<f64, ParseError> {
    let raw = match raw {
        None | Some("") => return Ok(0.0),
        Some(raw) => raw,
    };

    raw.trim()
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Split a request timestamp into its raw year and month segments.
///
/// The segments are not validated: `"abc-x"` yields `("abc", "x")`.
pub fn split_request_time(raw: &str) -> Result<(&str, &str), ParseError> {
    let mut parts = raw.split('-');
    match (parts.next(), parts.next()) {
        (Some(year), Some(month)) => Ok((year, month)),
        _ => Err(ParseError::MalformedRequestTime {
            value: raw.to_string(),
        }),
    }
}

/// Parse a trip timestamp such as `2023-07-15 10:04:10 +0300 EEST`.
///
/// The zone abbreviation must be present but is not interpreted; the
/// numeric offset carries the actual time zone. Any run of ASCII letters
/// is accepted as the zone name, not only `UTC`, `GMT` or the local zone.
pub fn parse_trip_timestamp(
    field: &'static str,
    raw: Option<&str>,
) -> Result<DateTime<FixedOffset>, ParseError> {
    let raw = raw.ok_or(ParseError::MissingTimestamp { field })?;
    let invalid = || ParseError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    };

    let (stamp, zone) = raw.rsplit_once(' ').ok_or_else(invalid)?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    DateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).map_err(|_| invalid())
}

/// Ride time between two timestamps, in whole seconds.
///
/// Only the residual within a single day is kept: whole days are dropped
/// and a negative difference wraps to `86400 - n`.
pub fn trip_duration_seconds(begin: DateTime<FixedOffset>, dropoff: DateTime<FixedOffset>) -> u64 {
    let delta = dropoff.signed_duration_since(begin).num_seconds();
    delta.rem_euclid(SECONDS_PER_DAY) as u64
}
