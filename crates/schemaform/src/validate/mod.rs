//! Submission validation.
//!
//! Checks a [`Submission`] against the schema before it is diffed. Problems
//! come back as a list of [`ValidationError`]s keyed by field name so the
//! renderer can show them next to the inputs; validation never aborts a form.
//!
//! Fields the schema does not declare are not reported here. The diff engine
//! ignores them.

use crate::error::ValidationError;
use crate::form::FormMode;
use crate::model::{
    check_shape, is_empty_value, values_equal, AttributeDef, Cardinality, FieldInput, RelationshipDef, SchemaRef,
    Submission,
};

/// Validates every declared field of a submission.
///
/// In create mode a mandatory field must be present and non-empty. In edit
/// mode a missing field is untouched and only an explicit clear of a
/// non-optional field is reported.
pub fn validate_submission(schema: SchemaRef<'_>, submitted: &Submission, mode: FormMode) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for attribute in schema.attributes() {
        validate_attribute(attribute, submitted.get(&attribute.name), mode, &mut errors);
    }
    for relationship in schema.relationships() {
        validate_relationship(relationship, submitted.get(&relationship.name), mode, &mut errors);
    }
    errors
}

/// Validates one non-empty attribute value (independent of requiredness).
pub fn validate_value(attribute: &AttributeDef, value: &serde_json::Value) -> Option<ValidationError> {
    if is_empty_value(value) {
        return None;
    }
    if check_shape(&attribute.kind, value).is_some() {
        return Some(ValidationError::TypeMismatch {
            field: attribute.name.clone(),
            expected: attribute.kind.clone(),
        });
    }
    if !attribute.choices.is_empty() && !attribute.choices.iter().any(|c| values_equal(c, value)) {
        return Some(ValidationError::NotAChoice {
            field: attribute.name.clone(),
        });
    }
    None
}

fn validate_attribute(
    attribute: &AttributeDef,
    input: Option<&FieldInput>,
    mode: FormMode,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(input) = input {
        if input.id.is_some() {
            errors.push(malformed(&attribute.name, "id"));
        }
        if input.list.is_some() {
            errors.push(malformed(&attribute.name, "list"));
        }
    }

    let value = input.and_then(|i| i.value.as_ref());
    let missing = match mode {
        FormMode::Create => attribute.is_mandatory() && !attribute.read_only && value.is_none_or(is_empty_value),
        FormMode::Edit => !attribute.optional && value.is_some_and(is_empty_value),
    };
    if missing {
        errors.push(ValidationError::Required {
            field: attribute.name.clone(),
        });
        return;
    }
    if let Some(error) = value.and_then(|v| validate_value(attribute, v)) {
        errors.push(error);
    }
}

fn validate_relationship(
    relationship: &RelationshipDef,
    input: Option<&FieldInput>,
    mode: FormMode,
    errors: &mut Vec<ValidationError>,
) {
    let mismatched = input.is_some_and(|i| match relationship.cardinality {
        Cardinality::One => i.list.is_some(),
        Cardinality::Many => i.id.is_some(),
    });
    if mismatched {
        errors.push(ValidationError::CardinalityMismatch {
            field: relationship.name.clone(),
            expected: relationship.cardinality,
        });
        return;
    }
    if relationship.optional {
        return;
    }

    // None: not submitted. Some(false): submitted empty.
    let linked = input.and_then(|i| match relationship.cardinality {
        Cardinality::One => i.id.as_ref().map(Option::is_some),
        Cardinality::Many => i.list.as_ref().map(|ids| ids.iter().any(|id| !id.is_empty())),
    });
    let missing = match mode {
        FormMode::Create => linked != Some(true),
        FormMode::Edit => linked == Some(false),
    };
    if missing {
        errors.push(ValidationError::Required {
            field: relationship.name.clone(),
        });
    }
}

fn malformed(field: &str, slot: &str) -> ValidationError {
    ValidationError::MalformedInput {
        key: format!("{field}.{slot}"),
    }
}
