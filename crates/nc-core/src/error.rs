//! Core error types for NC Ops
//!
//! Every layer converts its own failures into [`NcError`] before they reach
//! the HTTP surface; contract failures travel as [`ValidationErrors`].

use std::collections::BTreeMap;
use thiserror::Error;

/// Core error type for all NC Ops operations
#[derive(Error, Debug)]
pub enum NcError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NcError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        NcError::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        NcError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        NcError::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        NcError::Conflict {
            message: message.into(),
        }
    }

    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        NcError::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Single base validation message, e.g. "Insufficient leave balance"
    pub fn invalid(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        NcError::Validation(errors)
    }

    pub fn status_code(&self) -> u16 {
        match self {
            NcError::NotFound { .. } => 404,
            NcError::Unauthorized { .. } => 401,
            NcError::Forbidden { .. } => 403,
            NcError::Validation(_) => 422,
            NcError::Conflict { .. } => 409,
            NcError::ExternalService { .. } => 502,
            NcError::Database(_) | NcError::Config(_) | NcError::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            NcError::NotFound { .. } => "not_found",
            NcError::Unauthorized { .. } => "unauthorized",
            NcError::Forbidden { .. } => "forbidden",
            NcError::Validation(_) => "validation_failed",
            NcError::Conflict { .. } => "conflict",
            NcError::Database(_) => "database_error",
            NcError::ExternalService { .. } => "external_service_error",
            NcError::Config(_) => "configuration_error",
            NcError::Internal(_) => "internal_error",
        }
    }
}

/// Validation errors collection
///
/// Field errors are kept in a sorted map so messages render deterministically.
#[derive(Error, Debug, Default, Clone, PartialEq, Eq)]
#[error("{}", self.full_messages().join(", "))]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "can't be blank");
        errors.add_base("Insufficient leave balance");

        assert!(errors.has_error("title"));
        assert_eq!(
            errors.full_messages(),
            vec!["Insufficient leave balance", "title can't be blank"]
        );
    }

    #[test]
    fn test_merge_and_into_result() {
        let mut a = ValidationErrors::new();
        assert!(a.clone().into_result().is_ok());

        let mut b = ValidationErrors::new();
        b.add("end_date", "must not precede start date");
        a.merge(b);

        let err = a.into_result().unwrap_err();
        assert_eq!(err.get("end_date").map(Vec::len), Some(1));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(NcError::not_found("Task", "id", 7).status_code(), 404);
        assert_eq!(NcError::invalid("nope").status_code(), 422);
        assert_eq!(NcError::conflict("decided").error_code(), "conflict");
        assert_eq!(NcError::external("llm", "down").status_code(), 502);
    }
}
