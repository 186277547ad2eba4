//! # Ledger Configuration
//!
//! Seeds the properties record on `init`. Loaded from environment
//! variables, falling back to production defaults:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TEVAL_EVALUATION_WAIT` | `14d` |
//! | `TEVAL_REVEAL_DELAY` | `5d` |
//!
//! Values use the same syntax as `setProperties`: a bare number of seconds
//! or a number with an `s`, `m`, `h` or `d` suffix.

use crate::error::ConfigError;
use crate::properties::{parse_duration, Properties};

/// Environment variable for the evaluation wait.
pub const EVALUATION_WAIT_VAR: &str = "TEVAL_EVALUATION_WAIT";

/// Environment variable for the reveal delay.
pub const REVEAL_DELAY_VAR: &str = "TEVAL_REVEAL_DELAY";

/// Initial protocol durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Seconds after both parties close before silence counts as zero.
    pub evaluation_wait: u64,
    /// Seconds after both submissions before the reveal.
    pub reveal_delay: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::from_properties(Properties::production())
    }
}

impl LedgerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load through an arbitrary variable lookup. Unset or blank variables
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            evaluation_wait: env_duration(&lookup, EVALUATION_WAIT_VAR, defaults.evaluation_wait)?,
            reveal_delay: env_duration(&lookup, REVEAL_DELAY_VAR, defaults.reveal_delay)?,
        })
    }

    /// Short durations for demonstrations.
    pub fn demo() -> Self {
        Self::from_properties(Properties::demo())
    }

    fn from_properties(props: Properties) -> Self {
        Self {
            evaluation_wait: props.evaluation_wait,
            reveal_delay: props.reveal_delay,
        }
    }

    /// The properties record this configuration seeds.
    pub fn to_properties(&self) -> Properties {
        Properties {
            evaluation_wait: self.evaluation_wait,
            reveal_delay: self.reveal_delay,
        }
    }
}

fn env_duration(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => {
            parse_duration(&value).map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                value,
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}
