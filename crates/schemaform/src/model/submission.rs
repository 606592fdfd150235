//! Form submissions: the field-keyed values a user sends back.
//!
//! Input keys follow the nested field names the form builder hands out:
//! `name.value` for attributes, `site.id` for cardinality-one relationships,
//! `tags.list` for cardinality-many relationships, and `name.is_protected`
//! or `site._relation__owner` for metadata. A field that does not appear in
//! a submission is "untouched"; a field that appears with an empty value is
//! "cleared". The distinction matters to the diff engine in edit mode.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ValidationError;
use crate::limits::RELATION_PREFIX;

/// Everything submitted for one field.
///
/// For the `Option<Option<_>>` slots the outer `None` means "not submitted"
/// and `Some(None)` means "submitted empty".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldInput {
    /// Attribute value; `Some(Value::Null)` when cleared.
    pub value: Option<Value>,
    /// Peer id of a cardinality-one relationship.
    pub id: Option<Option<String>>,
    /// Peer ids of a cardinality-many relationship, in submitted order.
    pub list: Option<Vec<String>>,
    pub is_visible: Option<bool>,
    pub is_protected: Option<bool>,
    pub source: Option<Option<String>>,
    pub owner: Option<Option<String>>,
}

impl FieldInput {
    /// Returns true if any metadata slot was submitted.
    pub fn has_metadata(&self) -> bool {
        self.is_visible.is_some()
            || self.is_protected.is_some()
            || self.source.is_some()
            || self.owner.is_some()
    }

    /// Returns true if nothing at all was submitted for the field.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.id.is_none() && self.list.is_none() && !self.has_metadata()
    }
}

/// A complete form submission, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    fields: BTreeMap<String, FieldInput>,
}

impl Submission {
    /// Creates an empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses flat `field.slot` keys as produced by form inputs.
    pub fn from_flat<I, K>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut submission = Self::new();
        for (key, value) in entries {
            let key = key.as_ref();
            let Some((field, slot)) = key.split_once('.') else {
                return Err(malformed(key));
            };
            if field.is_empty() {
                return Err(malformed(key));
            }
            submission.set_slot(field, slot, value, key)?;
        }
        Ok(submission)
    }

    /// Parses a nested object: `{"name": {"value": "sw1"}, "site": {"id": "s1"}}`.
    pub fn from_json(json: &Value) -> Result<Self, ValidationError> {
        let Some(object) = json.as_object() else {
            return Err(malformed("<root>"));
        };
        let mut submission = Self::new();
        for (field, slots) in object {
            let Some(slots) = slots.as_object() else {
                return Err(malformed(field));
            };
            for (slot, value) in slots {
                let key = format!("{field}.{slot}");
                submission.set_slot(field, slot, value.clone(), &key)?;
            }
        }
        Ok(submission)
    }

    fn set_slot(&mut self, field: &str, slot: &str, value: Value, key: &str) -> Result<(), ValidationError> {
        let input = self.fields.entry(field.to_string()).or_default();
        let slot = slot.strip_prefix(RELATION_PREFIX).unwrap_or(slot);
        match slot {
            "value" => input.value = Some(value),
            "id" => input.id = Some(reference_id(&value).ok_or_else(|| malformed(key))?),
            "list" => input.list = Some(id_list(&value).ok_or_else(|| malformed(key))?),
            "is_visible" => input.is_visible = Some(flag(&value).ok_or_else(|| malformed(key))?),
            "is_protected" => input.is_protected = Some(flag(&value).ok_or_else(|| malformed(key))?),
            "source" => input.source = Some(reference_id(&value).ok_or_else(|| malformed(key))?),
            "owner" => input.owner = Some(reference_id(&value).ok_or_else(|| malformed(key))?),
            _ => return Err(malformed(key)),
        }
        Ok(())
    }

    // =========================================================================
    // Fluent construction
    // =========================================================================

    /// Sets an attribute value.
    pub fn value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry(field).value = Some(value.into());
        self
    }

    /// Sets the peer of a cardinality-one relationship; `None` clears it.
    pub fn peer(mut self, field: impl Into<String>, id: Option<&str>) -> Self {
        self.entry(field).id = Some(id.map(str::to_string));
        self
    }

    /// Sets the peers of a cardinality-many relationship.
    pub fn peers<I, S>(mut self, field: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry(field).list = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn visible(mut self, field: impl Into<String>, visible: bool) -> Self {
        self.entry(field).is_visible = Some(visible);
        self
    }

    pub fn protected(mut self, field: impl Into<String>, protected: bool) -> Self {
        self.entry(field).is_protected = Some(protected);
        self
    }

    /// Sets the source reference; `None` clears it.
    pub fn source(mut self, field: impl Into<String>, id: Option<&str>) -> Self {
        self.entry(field).source = Some(id.map(str::to_string));
        self
    }

    /// Sets the owner reference; `None` clears it.
    pub fn owner(mut self, field: impl Into<String>, id: Option<&str>) -> Self {
        self.entry(field).owner = Some(id.map(str::to_string));
        self
    }

    fn entry(&mut self, field: impl Into<String>) -> &mut FieldInput {
        self.fields.entry(field.into()).or_default()
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Returns the input for a field, if it was submitted.
    pub fn get(&self, field: &str) -> Option<&FieldInput> {
        self.fields.get(field).filter(|input| !input.is_empty())
    }

    /// Iterates submitted fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldInput)> {
        self.fields
            .iter()
            .filter(|(_, input)| !input.is_empty())
            .map(|(name, input)| (name.as_str(), input))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn malformed(key: &str) -> ValidationError {
    ValidationError::MalformedInput { key: key.to_string() }
}

/// Accepts `"id"`, `{"id": "..."}`, or an empty form (`null`, `""`).
fn reference_id(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) if s.is_empty() => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        Value::Object(object) => match object.get("id") {
            None | Some(Value::Null) => Some(None),
            Some(id) => reference_id(id),
        },
        _ => None,
    }
}

fn id_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => Some(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| reference_id(item).and_then(|id| id))
            .collect(),
        _ => None,
    }
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s == "true" => Some(true),
        Value::String(s) if s == "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_flat() {
        let submission = Submission::from_flat([
            ("name.value", json!("sw1")),
            ("name.is_protected", json!(true)),
            ("site.id", json!("s1")),
            ("site._relation__owner", json!({"id": "team-1"})),
            ("interfaces.list", json!(["A", {"id": "B"}])),
        ])
        .unwrap();

        let name = submission.get("name").unwrap();
        assert_eq!(name.value, Some(json!("sw1")));
        assert_eq!(name.is_protected, Some(true));
        assert!(name.is_visible.is_none());

        let site = submission.get("site").unwrap();
        assert_eq!(site.id, Some(Some("s1".to_string())));
        assert_eq!(site.owner, Some(Some("team-1".to_string())));

        let interfaces = submission.get("interfaces").unwrap();
        assert_eq!(interfaces.list, Some(vec!["A".to_string(), "B".to_string()]));
        assert_eq!(submission.len(), 3);
    }

    #[test]
    fn test_cleared_slots() {
        let submission = Submission::from_flat([
            ("site.id", json!("")),
            ("name.source", Value::Null),
            ("tags.list", Value::Null),
        ])
        .unwrap();

        assert_eq!(submission.get("site").unwrap().id, Some(None));
        assert_eq!(submission.get("name").unwrap().source, Some(None));
        assert_eq!(submission.get("tags").unwrap().list, Some(Vec::new()));
    }

    #[test]
    fn test_malformed_keys() {
        let err = Submission::from_flat([("name", json!("x"))]).unwrap_err();
        assert_eq!(err.field(), "name");

        let err = Submission::from_flat([("name.colour", json!("x"))]).unwrap_err();
        assert_eq!(err, ValidationError::MalformedInput { key: "name.colour".to_string() });

        let err = Submission::from_flat([("name.is_visible", json!(3))]).unwrap_err();
        assert_eq!(err.field(), "name.is_visible");
    }

    #[test]
    fn test_from_json() {
        let submission = Submission::from_json(&json!({
            "name": {"value": "sw1", "is_visible": false},
            "site": {"id": null}
        }))
        .unwrap();

        assert_eq!(submission.get("name").unwrap().is_visible, Some(false));
        assert_eq!(submission.get("site").unwrap().id, Some(None));
        assert!(Submission::from_json(&json!(["name"])).is_err());
    }

    #[test]
    fn test_fluent() {
        let submission = Submission::new()
            .value("name", "sw1")
            .peer("site", None)
            .peers("interfaces", ["A", "B"])
            .owner("name", Some("team-1"));

        assert_eq!(submission.get("site").unwrap().id, Some(None));
        assert_eq!(submission.get("name").unwrap().owner, Some(Some("team-1".to_string())));
        assert!(submission.get("name").unwrap().has_metadata());
        assert!(submission.get("missing").is_none());
    }
}
