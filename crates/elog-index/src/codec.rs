//! Conversion between log entries and stored index documents.
//!
//! Encoding is total: a [`LogEntry`] always produces a [`LogDocument`].
//! Decoding is partial: a raw hit whose source is missing or malformed
//! yields `None` and the caller drops it from the page.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::transport::RawHit;
use crate::types::{LogDocument, LogEntry};

/// Converts a caller-facing entry into its stored form.
#[must_use]
pub fn to_document(entry: LogEntry) -> LogDocument {
    LogDocument {
        timestamp: entry.timestamp,
        level: entry.level,
        service: entry.service,
        message: entry.message,
        exception: entry.exception,
        trace_id: entry.trace_id,
        host: entry.host,
    }
}

/// Converts a stored document back into an entry.
#[must_use]
pub fn to_entry(document: LogDocument) -> LogEntry {
    LogEntry {
        timestamp: document.timestamp,
        level: document.level,
        service: document.service,
        message: document.message,
        exception: document.exception,
        trace_id: document.trace_id,
        host: document.host,
    }
}

/// Renders a document as the JSON record written to the index.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_source(document: &LogDocument) -> serde_json::Result<Value> {
    serde_json::to_value(document)
}

/// Decodes a raw search hit, or `None` if it carries no usable document.
#[must_use]
pub fn from_document(hit: &RawHit) -> Option<LogDocument> {
    let source = hit.source.as_ref()?;
    match LogDocument::deserialize(source) {
        Ok(document) => Some(document),
        Err(e) => {
            warn!(id = ?hit.id, error = %e, "dropping undecodable search hit");
            None
        }
    }
}

/// Serde adapter for the `timestamp` field.
///
/// Writes RFC 3339 in UTC. Reads what the index's
/// `strict_date_optional_time||epoch_millis` format accepts: an ISO-8601
/// date with optional time and zone (`2024`, `2024-03`, `2024-03-01T12`,
/// `2024-03-01T12:30:00.250+02:00`, zone-less taken as UTC), or epoch
/// milliseconds as an integer, a float or a numeric string.
pub mod timestamp_format {
    use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use serde_json::Value;
    use std::fmt;

    /// Largest magnitude of epoch millis accepted, roughly year 287 000.
    const MAX_EPOCH_MILLIS: f64 = 9.0e15;

    /// Serializes a timestamp as an RFC 3339 string.
    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    /// Deserializes a timestamp from a date string or epoch milliseconds.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }

    /// Reads a timestamp from any JSON value the index format accepts.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) => parse_str(s),
            Value::Number(n) => n
                .as_i64()
                .and_then(from_millis)
                .or_else(|| n.as_f64().and_then(from_millis_f64)),
            _ => None,
        }
    }

    /// Parses the string forms accepted for stored timestamps.
    #[must_use]
    pub fn parse_str(value: &str) -> Option<DateTime<Utc>> {
        let value = value.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
            return Some(ts.with_timezone(&Utc));
        }
        parse_iso(value)
            .or_else(|| value.parse::<i64>().ok().and_then(from_millis))
            .or_else(|| value.parse::<f64>().ok().and_then(from_millis_f64))
    }

    /// Converts epoch milliseconds into a timestamp.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Converts fractional epoch milliseconds into a timestamp.
    #[must_use]
    pub fn from_millis_f64(millis: f64) -> Option<DateTime<Utc>> {
        if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
            return None;
        }
        let whole = millis.floor();
        let nanos = ((millis - whole) * 1_000_000.0).round() as i64;
        from_millis(whole as i64).map(|ts| ts + Duration::nanoseconds(nanos))
    }

    /// `yyyy[-MM[-dd]][THH[:mm[:ss[.f]]][zone]]`
    fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
        let (date_part, time_part) = match value.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (value, None),
        };
        let date = parse_date(date_part)?;
        let Some(time_part) = time_part else {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        };

        let (clock, offset_secs) = split_zone(time_part)?;
        let local = date.and_time(parse_clock(clock)?).and_utc();
        Some(local - Duration::seconds(offset_secs))
    }

    fn digits(s: &str, len: usize) -> Option<u32> {
        if s.len() == len && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().ok()
        } else {
            None
        }
    }

    fn parse_date(s: &str) -> Option<NaiveDate> {
        let mut parts = s.split('-');
        let year = i32::try_from(digits(parts.next()?, 4)?).ok()?;
        let month = parts.next().map_or(Some(1), |m| digits(m, 2))?;
        let day = parts.next().map_or(Some(1), |d| digits(d, 2))?;
        if parts.next().is_some() {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Splits a trailing `Z`, `±HH`, `±HHmm` or `±HH:mm` off the clock.
    fn split_zone(time: &str) -> Option<(&str, i64)> {
        if let Some(clock) = time.strip_suffix('Z') {
            return Some((clock, 0));
        }
        let Some(pos) = time.rfind(['+', '-']) else {
            return Some((time, 0));
        };
        let zone = time[pos + 1..].replace(':', "");
        let (hours, minutes) = match zone.len() {
            2 => (digits(&zone, 2)?, 0),
            4 => (digits(&zone[..2], 2)?, digits(&zone[2..], 2)?),
            _ => return None,
        };
        let secs = i64::from(hours * 3600 + minutes * 60);
        let sign = if time[pos..].starts_with('-') { -1 } else { 1 };
        Some((&time[..pos], sign * secs))
    }

    fn parse_clock(clock: &str) -> Option<NaiveTime> {
        let (hms, fraction) = match clock.split_once(['.', ',']) {
            Some((hms, fraction)) => (hms, Some(fraction)),
            None => (clock, None),
        };
        let mut parts = hms.split(':');
        let hour = digits(parts.next()?, 2)?;
        let minute = parts.next().map_or(Some(0), |m| digits(m, 2))?;
        let second = parts.next().map_or(Some(0), |s| digits(s, 2))?;
        if parts.next().is_some() {
            return None;
        }
        let nanos = match fraction {
            None => 0,
            Some(f) if (1..=9).contains(&f.len()) => {
                digits(f, f.len())? * 10_u32.pow(9 - f.len() as u32)
            }
            Some(_) => return None,
        };
        NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
    }

    struct TimestampVisitor;

    impl Visitor<'_> for TimestampVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an ISO-8601 date-time string or epoch milliseconds")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            parse_str(value).ok_or_else(|| E::custom(format!("invalid timestamp: {value}")))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            from_millis(value).ok_or_else(|| E::custom(format!("epoch millis out of range: {value}")))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            let millis = i64::try_from(value)
                .map_err(|_| E::custom(format!("epoch millis out of range: {value}")))?;
            self.visit_i64(millis)
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            from_millis_f64(value)
                .ok_or_else(|| E::custom(format!("epoch millis out of range: {value}")))
        }
    }
}
