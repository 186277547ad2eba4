//! # Temporal Types
//!
//! Defines [`Timestamp`], a UTC-only timestamp that keeps nanosecond
//! precision.
//!
//! ## Serialized Form
//!
//! Timestamps always serialize as RFC 3339 with exactly nine fractional
//! digits and a `Z` suffix (`2026-10-19T08:30:00.000000000Z`). The fixed
//! width makes lexicographic order of the stored strings equal to
//! chronological order, which the store relies on when sorting trades by
//! creation date. That only holds for four-digit years, so
//! [`Timestamp::plus_secs`] refuses to step past the end of year 9999.
//!
//! ## Nonce Text
//!
//! [`Timestamp::nonce_text`] renders the fixed textual encoding from which
//! a trade's encryption nonce is derived: year, month, day, the literal
//! `A`, hour, minute, second, then nine nanosecond digits.

use chrono::{DateTime, Datelike, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

const MAX_YEAR: i32 = 9999;

/// A UTC timestamp with nanosecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap a `chrono::DateTime<Utc>`.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parse an RFC 3339 string, converting any offset to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string is not
    /// valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(dt.with_timezone(&Utc)))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// This instant shifted forward by `secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TimestampOutOfRange`] if the result would
    /// fall after `9999-12-31T23:59:59.999999999Z`, the last instant that
    /// survives the serialized form.
    pub fn plus_secs(&self, secs: u64) -> Result<Self, ValidationError> {
        i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .filter(|shifted| shifted.year() <= MAX_YEAR)
            .map(Self)
            .ok_or_else(|| ValidationError::TimestampOutOfRange {
                start: self.to_rfc3339(),
                secs,
            })
    }

    /// RFC 3339 with nine fractional digits and `Z` suffix.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Fixed textual encoding used for nonce derivation
    /// (e.g. `20261019A083000000000042`).
    pub fn nonce_text(&self) -> String {
        self.0.format("%Y%m%dA%H%M%S%9f").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
