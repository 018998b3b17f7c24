//! Error types for record operations.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Result type for record operations.
pub type RecordsResult<T> = Result<T, RecordsError>;

/// Field-level validation messages, keyed by the name of the offending input field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding a single message for `field`.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns `Ok(())` when no messages were collected.
    pub fn into_result(self) -> RecordsResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RecordsError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    /// Input was rejected before reaching storage.
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl RecordsError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_collects_messages_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("name", "This field is required.");
        errors.add("name", "Second message.");
        errors.add("semester", "A valid integer is required.");

        assert_eq!(errors.get("name").map(<[String]>::len), Some(2));
        assert!(errors.contains("semester"));
        assert!(!errors.contains("roll_no"));
    }

    #[test]
    fn test_empty_field_errors_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());

        let err = FieldErrors::single("roll_no", "taken")
            .into_result()
            .unwrap_err();
        assert!(err.field_errors().is_some_and(|e| e.contains("roll_no")));
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let errors = FieldErrors::single("subject", "This field may not be blank.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["subject"][0], "This field may not be blank.");
    }

    #[test]
    fn test_not_found_display() {
        let err = RecordsError::not_found("student", 7);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "student with id 7 not found");
    }
}
