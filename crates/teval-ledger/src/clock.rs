//! # Clock
//!
//! Ledger operations stamp records with the current time (creation,
//! closing, reveal eligibility). The [`Clock`] trait lets hosts and tests
//! control that time.

use parking_lot::Mutex;
use teval_core::{Timestamp, ValidationError};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current UTC time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    /// Start at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump to `to`.
    pub fn set(&self, to: Timestamp) {
        *self.current.lock() = to;
    }

    /// Move forward by `secs` seconds and return the new time.
    ///
    /// # Errors
    ///
    /// [`ValidationError::TimestampOutOfRange`] past year 9999; the clock
    /// is left where it was.
    pub fn advance(&self, secs: u64) -> Result<Timestamp, ValidationError> {
        let mut guard = self.current.lock();
        *guard = guard.plus_secs(secs)?;
        Ok(*guard)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}
