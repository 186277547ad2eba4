//! # Score Triples
//!
//! A rating is one integer per evaluation question. There are exactly
//! [`SCORE_QUESTIONS`] questions, so a rating is always a [`ScoreTriple`].
//!
//! ## Text Form
//!
//! The plaintext that gets encrypted into an escrow slot is the bracketed,
//! comma-separated list, e.g. `"[3,4,5]"`. [`ScoreTriple::to_text`] and
//! [`ScoreTriple::parse`] are the only producer and consumer of that form.
//!
//! ## Defaulted Ratings
//!
//! The all-zero triple doubles as the "no rating submitted" value once the
//! evaluation window lapses. Aggregation still sums it, but it does not
//! count as a settled rating (see [`ScoreTriple::is_defaulted`]).
//!
//! ## Range
//!
//! Every question score must lie within `-SCORE_LIMIT..=SCORE_LIMIT`.
//! Parsing and deserialization enforce this; triples built with
//! [`ScoreTriple::new`] are checked with [`ScoreTriple::validate`] before
//! they enter the ledger.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of evaluation questions in every rating.
pub const SCORE_QUESTIONS: usize = 3;

/// Largest accepted magnitude of a single question score.
pub const SCORE_LIMIT: i64 = 1_000_000_000;

/// One rating: a score for each of the three evaluation questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct ScoreTriple([i64; SCORE_QUESTIONS]);

impl ScoreTriple {
    /// The defaulted (all-zero) rating.
    pub const DEFAULTED: Self = Self([0; SCORE_QUESTIONS]);

    /// Build a triple from three question scores.
    pub fn new(values: [i64; SCORE_QUESTIONS]) -> Self {
        Self(values)
    }

    /// Build a triple from a slice, which must hold exactly three values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidScoreArity`] for any other length
    /// and [`ValidationError::ScoreOutOfRange`] for a value beyond
    /// [`SCORE_LIMIT`].
    pub fn from_slice(values: &[i64]) -> Result<Self, ValidationError> {
        let arr: [i64; SCORE_QUESTIONS] =
            values
                .try_into()
                .map_err(|_| ValidationError::InvalidScoreArity {
                    expected: SCORE_QUESTIONS,
                    actual: values.len(),
                })?;
        let triple = Self(arr);
        triple.validate()?;
        Ok(triple)
    }

    /// Check every question score against [`SCORE_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ScoreOutOfRange`] naming the first
    /// offending value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.0.iter().find(|v| !(-SCORE_LIMIT..=SCORE_LIMIT).contains(*v)) {
            Some(value) => Err(ValidationError::ScoreOutOfRange {
                value: *value,
                limit: SCORE_LIMIT,
            }),
            None => Ok(()),
        }
    }

    /// Parse the bracketed text form (`"[3,4,5]"`).
    ///
    /// Whitespace around each value is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidScoreText`] if the brackets are
    /// missing or a value is not an integer, and
    /// [`ValidationError::InvalidScoreArity`] if there are not exactly
    /// three values.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        let inner = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| ValidationError::InvalidScoreText {
                value: text.to_string(),
                reason: "expected enclosing brackets".to_string(),
            })?;

        let values = inner
            .split(',')
            .map(|token| {
                let token = token.trim();
                token
                    .parse::<i64>()
                    .map_err(|_| ValidationError::InvalidScoreText {
                        value: text.to_string(),
                        reason: format!("\"{token}\" is not an integer"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_slice(&values)
    }

    /// Render the bracketed text form.
    pub fn to_text(&self) -> String {
        let [a, b, c] = self.0;
        format!("[{a},{b},{c}]")
    }

    /// The per-question values.
    pub fn values(&self) -> [i64; SCORE_QUESTIONS] {
        self.0
    }

    /// Sum over all questions, saturating at the `i64` bounds.
    pub fn total(&self) -> i64 {
        self.0.iter().fold(0i64, |acc, v| acc.saturating_add(*v))
    }

    /// Whether this is the defaulted all-zero rating.
    pub fn is_defaulted(&self) -> bool {
        self.0.iter().all(|v| *v == 0)
    }
}

impl std::fmt::Display for ScoreTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl std::str::FromStr for ScoreTriple {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Vec<i64>> for ScoreTriple {
    type Error = ValidationError;

    fn try_from(values: Vec<i64>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
    }
}

impl From<ScoreTriple> for Vec<i64> {
    fn from(triple: ScoreTriple) -> Self {
        triple.0.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form_is_bracketed_list() {
        assert_eq!(ScoreTriple::new([3, 4, 5]).to_text(), "[3,4,5]");
        assert_eq!(ScoreTriple::new([-1, 0, 10]).to_text(), "[-1,0,10]");
    }

    #[test]
    fn parse_accepts_canonical_and_spaced_text() {
        assert_eq!(
            ScoreTriple::parse("[3,4,5]").unwrap(),
            ScoreTriple::new([3, 4, 5])
        );
        assert_eq!(
            ScoreTriple::parse(" [ 1, 2 ,3 ] ").unwrap(),
            ScoreTriple::new([1, 2, 3])
        );
    }

    #[test]
    fn parse_rejects_missing_brackets() {
        let err = ScoreTriple::parse("3,4,5").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidScoreText { .. }));
        assert!(ScoreTriple::parse("[3,4,5").is_err());
    }

    #[test]
    fn parse_rejects_non_integer_token() {
        let err = ScoreTriple::parse("[3,x,5]").unwrap_err();
        assert!(format!("{err}").contains("\"x\" is not an integer"));
        assert!(ScoreTriple::parse("[3,4.5,5]").is_err());
        assert!(ScoreTriple::parse("[]").is_err());
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert_eq!(
            ScoreTriple::parse("[1,2]").unwrap_err(),
            ValidationError::InvalidScoreArity {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(
            ScoreTriple::parse("[1,2,3,4]").unwrap_err(),
            ValidationError::InvalidScoreArity {
                expected: 3,
                actual: 4
            }
        );
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(ScoreTriple::from_slice(&[1, 2, 3]).is_ok());
        assert!(ScoreTriple::from_slice(&[]).is_err());
        assert!(ScoreTriple::from_slice(&[1, 2, 3, 4]).is_err());
    }

    #[test]
    fn defaulted_detection() {
        assert!(ScoreTriple::DEFAULTED.is_defaulted());
        assert!(ScoreTriple::default().is_defaulted());
        assert!(!ScoreTriple::new([0, 0, 1]).is_defaulted());
    }

    #[test]
    fn total_sums_questions() {
        assert_eq!(ScoreTriple::new([5, 5, 5]).total(), 15);
        assert_eq!(ScoreTriple::DEFAULTED.total(), 0);
    }

    #[test]
    fn total_of_unchecked_extremes_saturates() {
        assert_eq!(ScoreTriple::new([i64::MAX, 1, 0]).total(), i64::MAX);
        assert_eq!(ScoreTriple::new([i64::MIN, -1, 0]).total(), i64::MIN);
    }

    #[test]
    fn values_beyond_limit_are_rejected() {
        assert_eq!(
            ScoreTriple::parse("[9223372036854775807,1,0]").unwrap_err(),
            ValidationError::ScoreOutOfRange {
                value: i64::MAX,
                limit: SCORE_LIMIT
            }
        );
        assert!(ScoreTriple::from_slice(&[0, -SCORE_LIMIT - 1, 0]).is_err());
        assert!(ScoreTriple::new([SCORE_LIMIT, -SCORE_LIMIT, 0]).validate().is_ok());
        assert!(ScoreTriple::new([0, 0, SCORE_LIMIT + 1]).validate().is_err());
        assert!(serde_json::from_str::<ScoreTriple>("[1,2,9223372036854775807]").is_err());
    }

    #[test]
    fn serializes_as_json_array() {
        let triple = ScoreTriple::new([4, 4, 4]);
        assert_eq!(serde_json::to_string(&triple).unwrap(), "[4,4,4]");
        let back: ScoreTriple = serde_json::from_str("[4,4,4]").unwrap();
        assert_eq!(back, triple);
        assert!(serde_json::from_str::<ScoreTriple>("[4,4]").is_err());
    }
}
