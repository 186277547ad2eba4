//! # Properties
//!
//! The global singleton holding the two protocol durations:
//!
//! - **evaluation wait**: after both parties close a trade, how long before
//!   an unsubmitted rating is treated as zero.
//! - **reveal delay**: after both ratings are submitted, how long before
//!   they are meant to be revealed.
//!
//! Both are stored as whole seconds. Administrative input accepts a bare
//! integer (seconds) or an integer followed by one unit suffix: `s`, `m`,
//! `h` or `d`, up to [`MAX_DURATION`].

use serde::{Deserialize, Serialize};
use teval_core::PROPERTIES_KEY;
use teval_store::KeyedStore;

use crate::error::LedgerError;
use crate::record::Repository;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Longest accepted duration: one hundred 365-day years.
pub const MAX_DURATION: u64 = 100 * 365 * DAY;

/// Protocol durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    /// Grace period after both parties close before silence counts as zero.
    pub evaluation_wait: u64,
    /// Delay after both submissions before the reveal.
    pub reveal_delay: u64,
}

impl Properties {
    /// Store key of the singleton.
    pub const KEY: &'static str = PROPERTIES_KEY;

    /// Production durations: 14 days and 5 days.
    pub fn production() -> Self {
        Self {
            evaluation_wait: 14 * DAY,
            reveal_delay: 5 * DAY,
        }
    }

    /// Short durations for demonstrations: 120 s and 30 s.
    pub fn demo() -> Self {
        Self {
            evaluation_wait: 120,
            reveal_delay: 30,
        }
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self::production()
    }
}

/// Parse a duration: digits, optionally followed by `s`, `m`, `h` or `d`.
///
/// A missing suffix means seconds. Values above [`MAX_DURATION`] are
/// rejected so that every deadline derived from them stays storable.
pub fn parse_duration(text: &str) -> Result<u64, LedgerError> {
    let invalid = |reason: &str| LedgerError::InvalidDuration {
        value: text.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim();
    let (digits, unit) = match trimmed.char_indices().last() {
        None => return Err(invalid("empty duration")),
        Some((idx, c)) if c.is_ascii_alphabetic() => (&trimmed[..idx], c),
        Some(_) => (trimmed, 's'),
    };

    let multiplier = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => MINUTE,
        'h' => HOUR,
        'd' => DAY,
        _ => return Err(invalid("unit must be one of s, m, h, d")),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected a non-negative integer"));
    }
    let amount: u64 = digits.parse().map_err(|_| invalid("value out of range"))?;
    amount
        .checked_mul(multiplier)
        .filter(|secs| *secs <= MAX_DURATION)
        .ok_or_else(|| invalid("value out of range"))
}

/// Reads and writes the properties singleton.
pub struct PropertiesStore<'a, S: ?Sized> {
    repo: Repository<'a, S, Properties>,
}

impl<'a, S: KeyedStore + ?Sized> PropertiesStore<'a, S> {
    /// Bind to a store.
    pub fn new(store: &'a S) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    /// The current properties.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if never initialized.
    pub fn get(&self) -> Result<Properties, LedgerError> {
        self.repo.require(Properties::KEY)
    }

    /// Write `defaults` unless a record already exists; return the
    /// record in effect.
    pub fn initialize(&self, defaults: Properties) -> Result<Properties, LedgerError> {
        if let Some(existing) = self.repo.get(Properties::KEY)? {
            tracing::debug!("properties already initialized");
            return Ok(existing);
        }
        self.repo.put(&defaults)?;
        tracing::info!(
            evaluation_wait = defaults.evaluation_wait,
            reveal_delay = defaults.reveal_delay,
            "properties initialized"
        );
        Ok(defaults)
    }

    /// Update either duration. An empty (or blank) argument leaves that
    /// field unchanged.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if the record was never initialized,
    /// [`LedgerError::InvalidDuration`] for malformed input. Nothing is
    /// written unless both arguments are valid.
    pub fn set(&self, evaluation_wait: &str, reveal_delay: &str) -> Result<Properties, LedgerError> {
        let mut props = self.get()?;
        if !evaluation_wait.trim().is_empty() {
            props.evaluation_wait = parse_duration(evaluation_wait)?;
        }
        if !reveal_delay.trim().is_empty() {
            props.reveal_delay = parse_duration(reveal_delay)?;
        }
        self.repo.put(&props)?;
        tracing::info!(
            evaluation_wait = props.evaluation_wait,
            reveal_delay = props.reveal_delay,
            "properties updated"
        );
        Ok(props)
    }
}
