//! Validation hooks run around table mutations.
//!
//! A [`Validator`] is attached to every [`Table`](crate::Table). Before-hooks
//! may veto a mutation; after-hooks are advisory and only logged.
//!
//! ```ignore
//! use sqltable::validate::{Validator, ValidationError, ValidationCode};
//! use sqltable::Value;
//!
//! struct NoEmptyNames;
//!
//! impl Validator for NoEmptyNames {
//!     fn before_update(&self, values: &[Value]) -> Result<(), ValidationError> {
//!         if values.iter().any(|v| v.as_str() == Some("")) {
//!             return Err(ValidationError::new("name", ValidationCode::Required, "name is required"));
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::log::db_log;
use crate::value::Value;
use serde::Serialize;
use std::fmt;

/// Why a hook rejected a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationCode {
    /// A value that must be present was missing or empty.
    Required,
    /// A value was present but not acceptable.
    Invalid,
    /// Application-defined code.
    Custom(String),
}

impl ValidationCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::Invalid => "invalid",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl Serialize for ValidationCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned by a validator hook.
///
/// Displays as its message, which is copied verbatim into the result envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub code: ValidationCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }

    /// A record-level error not tied to a field.
    pub fn record(message: impl Into<String>) -> Self {
        Self::new("", ValidationCode::Custom("record".to_string()), message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Hooks called around each mutating table operation.
///
/// Every method has a default: `before_insert` and `before_update` call
/// [`Validator::validate_record`], the rest accept.
pub trait Validator: Send + Sync {
    /// Record-level validation shared by the insert and update hooks.
    fn validate_record(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn before_insert(&self) -> Result<(), ValidationError> {
        self.validate_record()
    }

    /// Runs after the insert was attempted; an error is logged, never reported.
    fn after_insert(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Receives the new values before they are written.
    fn before_update(&self, values: &[Value]) -> Result<(), ValidationError> {
        let _ = values;
        self.validate_record()
    }

    /// Advisory; `false` is logged.
    fn after_update(&self) -> bool {
        true
    }

    fn before_delete(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Advisory; `false` is logged.
    fn after_delete(&self) -> bool {
        true
    }
}

/// Accepts everything and logs each hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl Validator for DefaultValidator {
    fn validate_record(&self) -> Result<(), ValidationError> {
        db_log!(debug, "validate record (default)");
        Ok(())
    }

    fn before_insert(&self) -> Result<(), ValidationError> {
        db_log!(debug, "before insert (default)");
        self.validate_record()
    }

    fn after_insert(&self) -> Result<(), ValidationError> {
        db_log!(debug, "after insert (default)");
        Ok(())
    }

    fn before_update(&self, values: &[Value]) -> Result<(), ValidationError> {
        db_log!(debug, value_count = values.len(), "before update (default)");
        self.validate_record()
    }

    fn after_update(&self) -> bool {
        db_log!(debug, "after update (default)");
        true
    }

    fn before_delete(&self) -> Result<(), ValidationError> {
        db_log!(debug, "before delete (default)");
        Ok(())
    }

    fn after_delete(&self) -> bool {
        db_log!(debug, "after delete (default)");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectAll;

    impl Validator for RejectAll {
        fn validate_record(&self) -> Result<(), ValidationError> {
            Err(ValidationError::record("record rejected"))
        }
    }

    #[test]
    fn default_validator_accepts() {
        let v = DefaultValidator;
        assert!(v.before_insert().is_ok());
        assert!(v.before_update(&[Value::Int(1)]).is_ok());
        assert!(v.before_delete().is_ok());
        assert!(v.after_update());
        assert!(v.after_delete());
    }

    #[test]
    fn before_hooks_delegate_to_validate_record() {
        let v = RejectAll;
        assert_eq!(v.before_insert().unwrap_err().to_string(), "record rejected");
        assert!(v.before_update(&[]).is_err());
        assert!(v.before_delete().is_ok());
    }

    #[test]
    fn error_serializes_code_as_string() {
        let err = ValidationError::new("email", ValidationCode::Invalid, "bad email");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "invalid");
        assert_eq!(json["field"], "email");

        let json = serde_json::to_value(ValidationError::record("nope")).unwrap();
        assert_eq!(json["code"], "record");
    }
}
