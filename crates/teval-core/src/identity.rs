//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers that key ledger records.
//! Each identifier is a distinct type: a [`UserToken`] cannot be passed
//! where a [`TradeId`] is expected.
//!
//! ## Validation
//!
//! All identifiers are caller-supplied strings. They must be non-empty and
//! free of control characters, because they are used verbatim as store keys.
//! Validation runs at construction and again on deserialization, so a
//! record read back from the store can never carry an invalid identifier.
//!
//! Users and trades share one key space with the ledger's own singleton
//! records, so a token or trade id may not name one of those keys.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Store key of the ledger-wide properties record.
pub const PROPERTIES_KEY: &str = "PROPERTIES";

fn validate(kind: &'static str, s: &str, reserved: &[&str]) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier { kind });
    }
    if s.chars().any(char::is_control) {
        return Err(ValidationError::InvalidIdentifier {
            kind,
            value: s.to_string(),
        });
    }
    if reserved.contains(&s) {
        return Err(ValidationError::ReservedIdentifier {
            kind,
            value: s.to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TradeId
// ---------------------------------------------------------------------------

/// Unique identifier of a trade, chosen by the caller at creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TradeId(String);

impl TradeId {
    /// Create a trade identifier, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdentifier`] or
    /// [`ValidationError::InvalidIdentifier`] for unusable input, and
    /// [`ValidationError::ReservedIdentifier`] for the properties or
    /// totals key.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate("trade id", &s, &[PROPERTIES_KEY, UserToken::TOTALS])?;
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TradeId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TradeId> for String {
    fn from(id: TradeId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// UserToken
// ---------------------------------------------------------------------------

/// Opaque token identifying a registered user.
///
/// [`UserToken::TOTALS`] addresses the global totals aggregate, which
/// shares the key space with users but is a separate record type.
/// [`PROPERTIES_KEY`] is never a valid token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserToken(String);

impl UserToken {
    /// The reserved token under which global totals are stored.
    pub const TOTALS: &'static str = "TOTAL_USER";

    /// Create a user token, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdentifier`] or
    /// [`ValidationError::InvalidIdentifier`] for unusable input, and
    /// [`ValidationError::ReservedIdentifier`] for the properties key.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate("user token", &s, &[PROPERTIES_KEY])?;
        Ok(Self(s))
    }

    /// The reserved global totals token.
    pub fn totals() -> Self {
        Self(Self::TOTALS.to_string())
    }

    /// Whether this is the reserved global totals token.
    pub fn is_totals(&self) -> bool {
        self.0 == Self::TOTALS
    }

    /// Access the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserToken {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserToken> for String {
    fn from(token: UserToken) -> Self {
        token.0
    }
}

// ---------------------------------------------------------------------------
// ServiceCode
// ---------------------------------------------------------------------------

/// Code of the service a trade was made under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceCode(String);

impl ServiceCode {
    /// Create a service code, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdentifier`] or
    /// [`ValidationError::InvalidIdentifier`] for unusable input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate("service code", &s, &[])?;
        Ok(Self(s))
    }

    /// Access the code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ServiceCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServiceCode> for String {
    fn from(code: ServiceCode) -> Self {
        code.0
    }
}
