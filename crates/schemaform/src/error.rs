//! Error types for schema ingestion, submission validation and response decoding.
//!
//! Nothing in this crate panics on bad input. Every failure a caller can
//! provoke is one of the enums below.

use thiserror::Error;

use crate::model::{AttributeKind, Cardinality};

/// Error while loading a schema snapshot into a registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("schema payload is not valid JSON: {0}")]
    InvalidPayload(String),

    #[error("duplicate schema kind {kind:?}")]
    DuplicateKind { kind: String },

    #[error("duplicate schema name {name:?}")]
    DuplicateName { name: String },

    #[error("schema {schema:?} declares field {field:?} more than once")]
    DuplicateField { schema: String, field: String },

    #[error("schema {schema:?} has an empty {what}")]
    EmptyIdentifier { schema: String, what: &'static str },
}

/// A submitted form value that does not fit the schema's shape.
///
/// Validation errors are always keyed by the field they concern so the
/// rendering layer can attach them next to the right input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("field {field:?} is required")]
    Required { field: String },

    #[error("field {field:?} expects a {expected:?} value")]
    TypeMismatch { field: String, expected: AttributeKind },

    #[error("field {field:?} is not one of the allowed choices")]
    NotAChoice { field: String },

    #[error("relationship {field:?} has cardinality {expected:?}")]
    CardinalityMismatch { field: String, expected: Cardinality },

    #[error("input key {key:?} does not name a form field")]
    MalformedInput { key: String },
}

impl ValidationError {
    /// Returns the field name (or raw input key) this error is attached to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TypeMismatch { field, .. }
            | ValidationError::NotAChoice { field }
            | ValidationError::CardinalityMismatch { field, .. } => field,
            ValidationError::MalformedInput { key } => key,
        }
    }
}

/// Rejected transition of a two-step reference selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("type {0:?} is not offered by this selector")]
    UnknownType(String),

    #[error("no {kind} instance with id {id:?} is offered")]
    UnknownInstance { kind: String, id: String },

    #[error("an instance cannot be chosen before a type")]
    NoTypeChosen,
}

/// Error building an execution context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    #[error("branch name must not be empty")]
    EmptyBranch,

    #[error("branch name {0:?} contains whitespace or control characters")]
    InvalidBranch(String),

    #[error("invalid point-in-time timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

/// Error decoding a transport response into engine types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseError {
    #[error("response is missing {path}")]
    MissingField { path: String },

    #[error("response field {path} should be {expected}")]
    UnexpectedShape { path: String, expected: &'static str },
}

/// Error loading an object through a transport.
#[derive(Debug, Error)]
pub enum FetchError<E: std::error::Error + 'static> {
    // === Transport failures are passed through untouched ===
    #[error("transport failed: {0}")]
    Transport(#[source] E),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_field() {
        let err = ValidationError::Required { field: "name".to_string() };
        assert_eq!(err.field(), "name");

        let err = ValidationError::MalformedInput { key: "name.colour".to_string() };
        assert_eq!(err.field(), "name.colour");
    }

    #[test]
    fn test_error_messages() {
        let err = SchemaError::DuplicateField {
            schema: "Device".to_string(),
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "schema \"Device\" declares field \"name\" more than once");

        let err = ValidationError::CardinalityMismatch {
            field: "site".to_string(),
            expected: Cardinality::One,
        };
        assert_eq!(err.to_string(), "relationship \"site\" has cardinality One");

        let err = SelectorError::UnknownInstance {
            kind: "Team".to_string(),
            id: "t9".to_string(),
        };
        assert_eq!(err.to_string(), "no Team instance with id \"t9\" is offered");
    }
}
