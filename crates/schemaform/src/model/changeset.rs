//! Change sets: the minimal set of field changes a mutation must carry.
//!
//! A change set is produced by [`crate::diff::compute_change_set`] and
//! consumed by [`crate::query::build_create_mutation`] and
//! [`crate::query::build_update_mutation`]. Entries are kept in schema field
//! order (attributes first, then relationships) so that the same inputs
//! always yield the same mutation text.

use serde::Serialize;
use serde_json::Value;

use crate::model::RelationMetadata;

/// Full metadata state to send for one field.
///
/// Built by merging the user's metadata edits over the original values, so
/// it always carries every slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataPatch {
    pub is_visible: bool,
    pub is_protected: bool,
    pub source: Option<String>,
    pub owner: Option<String>,
}

impl Default for MetadataPatch {
    fn default() -> Self {
        Self {
            is_visible: true,
            is_protected: false,
            source: None,
            owner: None,
        }
    }
}

impl From<&RelationMetadata> for MetadataPatch {
    fn from(metadata: &RelationMetadata) -> Self {
        Self {
            is_visible: metadata.is_visible,
            is_protected: metadata.is_protected,
            source: metadata.source.as_ref().map(|r| r.id.clone()),
            owner: metadata.owner.as_ref().map(|r| r.id.clone()),
        }
    }
}

/// Change to an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributePatch {
    /// New value. `None` leaves the value alone (metadata-only change);
    /// `Some(Value::Null)` unsets it.
    pub value: Option<Value>,
    pub metadata: Option<MetadataPatch>,
}

/// Change to a cardinality-one relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnePatch {
    /// New peer id; `None` unlinks the peer.
    pub id: Option<String>,
    pub metadata: Option<MetadataPatch>,
}

/// Replacement peer set of a cardinality-many relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManyPatch {
    pub ids: Vec<String>,
}

/// The change carried for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldPatch {
    Attribute(AttributePatch),
    One(OnePatch),
    Many(ManyPatch),
}

impl FieldPatch {
    /// Returns true if this patch changes anything besides metadata.
    pub fn changes_value(&self) -> bool {
        match self {
            FieldPatch::Attribute(patch) => patch.value.is_some(),
            FieldPatch::One(_) | FieldPatch::Many(_) => true,
        }
    }
}

/// One entry of a change set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub patch: FieldPatch,
}

/// Ordered, field-keyed set of changes for one object.
///
/// Never contains the object id; the update builder attaches it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a change. Callers push in schema order.
    pub fn push(&mut self, field: impl Into<String>, patch: FieldPatch) {
        self.changes.push(FieldChange {
            field: field.into(),
            patch,
        });
    }

    /// Returns the change for a field.
    pub fn get(&self, field: &str) -> Option<&FieldPatch> {
        self.changes.iter().find(|c| c.field == field).map(|c| &c.patch)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    /// Returns the changed field names in order.
    pub fn fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a FieldChange;
    type IntoIter = std::slice::Iter<'a, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_change_set_access() {
        let mut changes = ChangeSet::new();
        assert!(changes.is_empty());

        changes.push(
            "name",
            FieldPatch::Attribute(AttributePatch {
                value: Some(json!("sw2")),
                metadata: None,
            }),
        );
        changes.push("interfaces", FieldPatch::Many(ManyPatch { ids: vec!["A".into()] }));

        assert_eq!(changes.len(), 2);
        assert_eq!(changes.fields(), vec!["name", "interfaces"]);
        assert!(matches!(changes.get("interfaces"), Some(FieldPatch::Many(_))));
        assert!(changes.get("site").is_none());
    }

    #[test]
    fn test_changes_value() {
        let metadata_only = FieldPatch::Attribute(AttributePatch {
            value: None,
            metadata: Some(MetadataPatch::default()),
        });
        assert!(!metadata_only.changes_value());

        let unlink = FieldPatch::One(OnePatch { id: None, metadata: None });
        assert!(unlink.changes_value());
    }
}
