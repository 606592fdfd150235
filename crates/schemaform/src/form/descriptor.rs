//! Field descriptors handed to the rendering layer.
//!
//! Descriptors are rebuilt on every render and never persisted. The renderer
//! must submit values back under the exact `input_name` keys given here.

use serde::Serialize;
use serde_json::Value;

use crate::form::selector::ReferenceSelector;
use crate::model::{AttributeKind, Cardinality, Ref};

/// Widget a descriptor renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Number,
    Checkbox,
    Select,
    MultiSelect,
    Multiline,
    Password,
    DateTime,
    Json,
}

impl InputKind {
    /// Maps an attribute to its widget. Enumerated choices always win.
    pub fn for_attribute(kind: &AttributeKind, has_choices: bool) -> Self {
        if has_choices {
            return InputKind::Select;
        }
        match kind {
            AttributeKind::TextArea => InputKind::Multiline,
            AttributeKind::Number | AttributeKind::Integer => InputKind::Number,
            AttributeKind::Boolean => InputKind::Checkbox,
            AttributeKind::DateTime => InputKind::DateTime,
            AttributeKind::Password | AttributeKind::HashedPassword => InputKind::Password,
            AttributeKind::Json | AttributeKind::List | AttributeKind::Any => InputKind::Json,
            AttributeKind::Dropdown => InputKind::Select,
            _ => InputKind::Text,
        }
    }

    /// Maps a relationship to its widget.
    pub fn for_relationship(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::One => InputKind::Select,
            Cardinality::Many => InputKind::MultiSelect,
        }
    }
}

/// Pre-filled value of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Empty,
    Value(Value),
    Id(String),
    Ids(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Value(v) => crate::model::is_empty_value(v),
            FieldValue::Id(_) => false,
            FieldValue::Ids(ids) => ids.is_empty(),
        }
    }
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub label: String,
    /// Submitted value: the choice itself, or the peer id.
    pub value: Value,
    /// Kind of the referenced object, for relationship options.
    pub kind: Option<String>,
}

impl SelectOption {
    /// Option for an enumerated attribute choice.
    pub fn choice(value: &Value) -> Self {
        let label = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            label,
            value: value.clone(),
            kind: None,
        }
    }

    /// Option for a peer object.
    pub fn peer(peer: &Ref) -> Self {
        let label = if peer.display_label.is_empty() {
            peer.id.clone()
        } else {
            peer.display_label.clone()
        };
        Self {
            label,
            value: Value::String(peer.id.clone()),
            kind: Some(peer.typename.clone()).filter(|k| !k.is_empty()),
        }
    }

    /// Option for a schema kind (first step of a reference selector).
    pub fn schema(kind: &str, label: &str) -> Self {
        Self {
            label: label.to_string(),
            value: Value::String(kind.to_string()),
            kind: None,
        }
    }

    /// Returns the value as a string id or kind.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

/// Input constraints the renderer may enforce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldConfig {
    pub required: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub regex: Option<String>,
}

/// Which metadata slot a nested descriptor edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    IsVisible,
    IsProtected,
    Source,
    Owner,
}

impl MetadataField {
    pub const ALL: [MetadataField; 4] = [
        MetadataField::IsVisible,
        MetadataField::IsProtected,
        MetadataField::Source,
        MetadataField::Owner,
    ];

    /// Slot name as used in input keys.
    pub fn key(self) -> &'static str {
        match self {
            MetadataField::IsVisible => "is_visible",
            MetadataField::IsProtected => "is_protected",
            MetadataField::Source => "source",
            MetadataField::Owner => "owner",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetadataField::IsVisible => "Visible",
            MetadataField::IsProtected => "Protected",
            MetadataField::Source => "Source",
            MetadataField::Owner => "Owner",
        }
    }
}

/// Input of a metadata descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataInput {
    Toggle(bool),
    Reference(ReferenceSelector),
}

/// A nested descriptor editing one metadata slot of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataDescriptor {
    /// Input key, e.g. `name.is_visible` or `site._relation__owner`.
    pub input_name: String,
    pub field: MetadataField,
    pub label: &'static str,
    pub input: MetadataInput,
}

/// One form field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    /// Attribute or relationship name.
    pub field_name: String,
    /// Input key the value must be submitted under: `name.value`, `site.id`, `tags.list`.
    pub input_name: String,
    pub input_kind: InputKind,
    pub label: String,
    pub current_value: FieldValue,
    pub is_attribute: bool,
    pub is_relationship: bool,
    pub relationship_cardinality: Option<Cardinality>,
    pub options: Vec<SelectOption>,
    pub disabled: bool,
    pub config: FieldConfig,
    /// Edit mode only.
    pub metadata: Vec<MetadataDescriptor>,
}

impl FieldDescriptor {
    /// Returns the nested descriptor for one metadata slot.
    pub fn metadata_field(&self, field: MetadataField) -> Option<&MetadataDescriptor> {
        self.metadata.iter().find(|m| m.field == field)
    }

    /// Returns the option values as strings.
    pub fn option_values(&self) -> Vec<&str> {
        self.options.iter().filter_map(SelectOption::value_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_input_kind_for_attribute() {
        assert_eq!(InputKind::for_attribute(&AttributeKind::Text, false), InputKind::Text);
        assert_eq!(InputKind::for_attribute(&AttributeKind::Integer, false), InputKind::Number);
        assert_eq!(InputKind::for_attribute(&AttributeKind::Boolean, false), InputKind::Checkbox);
        assert_eq!(InputKind::for_attribute(&AttributeKind::TextArea, false), InputKind::Multiline);
        assert_eq!(InputKind::for_attribute(&AttributeKind::Text, true), InputKind::Select);
        assert_eq!(
            InputKind::for_attribute(&AttributeKind::Other("IPHost".into()), false),
            InputKind::Text
        );
    }

    #[test]
    fn test_select_option_labels() {
        assert_eq!(SelectOption::choice(&json!("edge")).label, "edge");
        assert_eq!(SelectOption::choice(&json!(100)).label, "100");

        let unlabeled = SelectOption::peer(&Ref::new("s1", "Site"));
        assert_eq!(unlabeled.label, "s1");
        assert_eq!(unlabeled.kind.as_deref(), Some("Site"));
        assert_eq!(unlabeled.value_str(), Some("s1"));
    }

    #[test]
    fn test_field_value_empty() {
        assert!(FieldValue::Empty.is_empty());
        assert!(FieldValue::Value(json!("")).is_empty());
        assert!(!FieldValue::Value(json!(false)).is_empty());
        assert!(FieldValue::Ids(Vec::new()).is_empty());
    }
}
