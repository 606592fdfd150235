//! Mutation synthesis from change sets.
//!
//! The object id is attached here and only here; change sets never carry it.
//!
//! Wire shape of each change-set entry inside `data`:
//! - attribute: `name: {value: .., is_protected: .., is_visible: .., source: "id", owner: "id"}`
//! - cardinality one: `site: {id: "s1", _relation__is_protected: .., ..}`, or `site: null` to unlink
//! - cardinality many: `tags: [{id: "a"}, {id: "b"}]`

use serde_json::Value;

use crate::error::ResponseError;
use crate::limits::RELATION_PREFIX;
use crate::model::snapshot::decode_ref;
use crate::model::{ChangeSet, FieldPatch, MetadataPatch, Ref, SchemaRef};
use crate::query::ast::{ArgValue, Document, Selection};
use crate::query::read::{ref_selection, unwrap_data};

/// The kind of write a mutation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    fn suffix(self) -> &'static str {
        match self {
            MutationKind::Create => "Create",
            MutationKind::Update => "Update",
            MutationKind::Delete => "Delete",
        }
    }
}

/// Returns the mutation field name, e.g. `DeviceCreate`.
pub fn mutation_name(kind: &str, mutation: MutationKind) -> String {
    format!("{kind}{}", mutation.suffix())
}

fn metadata_fields(metadata: &MetadataPatch, prefix: &str) -> Vec<(String, ArgValue)> {
    vec![
        (format!("{prefix}is_protected"), ArgValue::Bool(metadata.is_protected)),
        (format!("{prefix}is_visible"), ArgValue::Bool(metadata.is_visible)),
        (format!("{prefix}source"), ArgValue::from(metadata.source.clone())),
        (format!("{prefix}owner"), ArgValue::from(metadata.owner.clone())),
    ]
}

fn patch_value(patch: &FieldPatch) -> ArgValue {
    match patch {
        FieldPatch::Attribute(attribute) => {
            let mut fields = Vec::new();
            if let Some(value) = &attribute.value {
                fields.push(("value".to_string(), ArgValue::from(value)));
            }
            if let Some(metadata) = &attribute.metadata {
                fields.extend(metadata_fields(metadata, ""));
            }
            ArgValue::Object(fields)
        }
        FieldPatch::One(one) => match &one.id {
            Some(id) => {
                let mut fields = vec![("id".to_string(), ArgValue::from(id.as_str()))];
                if let Some(metadata) = &one.metadata {
                    fields.extend(metadata_fields(metadata, RELATION_PREFIX));
                }
                ArgValue::Object(fields)
            }
            None => ArgValue::Null,
        },
        FieldPatch::Many(many) => ArgValue::List(
            many.ids
                .iter()
                .map(|id| ArgValue::object([("id", ArgValue::from(id.as_str()))]))
                .collect(),
        ),
    }
}

fn data_fields(changes: &ChangeSet) -> Vec<(String, ArgValue)> {
    changes
        .iter()
        .map(|change| (change.field.clone(), patch_value(&change.patch)))
        .collect()
}

fn mutation(kind: &str, action: MutationKind, data: Vec<(String, ArgValue)>) -> Document {
    let mut field = Selection::field(mutation_name(kind, action))
        .arg("data", ArgValue::Object(data))
        .select(Selection::field("ok"));
    if action != MutationKind::Delete {
        field = field.select(ref_selection("object"));
    }
    Document::mutation(vec![field])
}

/// Builds `KindCreate(data: {...}) { ok object { id display_label __typename } }`.
///
/// An empty change set yields a create with empty `data`, letting the
/// server apply every default.
pub fn build_create_mutation(schema: SchemaRef<'_>, changes: &ChangeSet) -> Document {
    mutation(schema.kind(), MutationKind::Create, data_fields(changes))
}

/// Builds `KindUpdate(data: {id: .., ...}) { ok object {..} }`.
///
/// Returns `None` for an empty change set; there is nothing to send.
pub fn build_update_mutation(schema: SchemaRef<'_>, id: &str, changes: &ChangeSet) -> Option<Document> {
    if changes.is_empty() {
        return None;
    }
    let mut data = vec![("id".to_string(), ArgValue::from(id))];
    data.extend(data_fields(changes));
    Some(mutation(schema.kind(), MutationKind::Update, data))
}

/// Builds `KindDelete(data: {id: ..}) { ok }`.
pub fn build_delete_mutation(schema: SchemaRef<'_>, id: &str) -> Document {
    mutation(
        schema.kind(),
        MutationKind::Delete,
        vec![("id".to_string(), ArgValue::from(id))],
    )
}

/// Decoded result of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResult {
    pub ok: bool,
    /// The created or updated object; absent for deletes.
    pub object: Option<Ref>,
}

impl MutationResult {
    /// Decodes the response to a mutation built for `kind`.
    pub fn from_response(response: &Value, kind: &str, action: MutationKind) -> Result<Self, ResponseError> {
        let key = mutation_name(kind, action);
        let root = unwrap_data(response)
            .get(&key)
            .ok_or_else(|| ResponseError::MissingField { path: key.clone() })?;
        let ok = match root.get("ok") {
            Some(Value::Bool(ok)) => *ok,
            Some(_) => {
                return Err(ResponseError::UnexpectedShape {
                    path: format!("{key}.ok"),
                    expected: "a boolean",
                })
            }
            None => return Err(ResponseError::MissingField { path: format!("{key}.ok") }),
        };
        let object = decode_ref(root.get("object"), &format!("{key}.object"))?;
        Ok(Self { ok, object })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::builder::NodeSchemaBuilder;
    use crate::model::{AttributePatch, ManyPatch, NodeSchema, OnePatch};

    fn device() -> NodeSchema {
        NodeSchemaBuilder::new("device", "Device").build()
    }

    fn changes() -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.push(
            "name",
            FieldPatch::Attribute(AttributePatch {
                value: Some(json!("sw2")),
                metadata: None,
            }),
        );
        changes.push(
            "description",
            FieldPatch::Attribute(AttributePatch {
                value: None,
                metadata: Some(MetadataPatch {
                    is_protected: true,
                    owner: Some("team-1".to_string()),
                    ..MetadataPatch::default()
                }),
            }),
        );
        changes.push(
            "site",
            FieldPatch::One(OnePatch {
                id: Some("s1".to_string()),
                metadata: None,
            }),
        );
        changes.push("rack", FieldPatch::One(OnePatch { id: None, metadata: None }));
        changes.push(
            "interfaces",
            FieldPatch::Many(ManyPatch {
                ids: vec!["A".to_string(), "B".to_string()],
            }),
        );
        changes
    }

    #[test]
    fn test_update_mutation() {
        let schema = device();
        let doc = build_update_mutation(SchemaRef::Node(&schema), "123", &changes()).unwrap();
        assert_eq!(
            doc.to_string(),
            concat!(
                r#"mutation { DeviceUpdate(data: {id: "123", name: {value: "sw2"}, "#,
                r#"description: {is_protected: true, is_visible: true, source: null, owner: "team-1"}, "#,
                r#"site: {id: "s1"}, rack: null, interfaces: [{id: "A"}, {id: "B"}]}) "#,
                r#"{ ok object { id display_label __typename } } }"#
            )
        );
    }

    #[test]
    fn test_update_empty_change_set() {
        let schema = device();
        assert!(build_update_mutation(SchemaRef::Node(&schema), "123", &ChangeSet::new()).is_none());
    }

    #[test]
    fn test_create_and_delete() {
        let schema = device();
        let mut changes = ChangeSet::new();
        changes.push(
            "site",
            FieldPatch::One(OnePatch {
                id: Some("s1".to_string()),
                metadata: Some(MetadataPatch::default()),
            }),
        );

        let create = build_create_mutation(SchemaRef::Node(&schema), &changes);
        assert_eq!(
            create.to_string(),
            r#"mutation { DeviceCreate(data: {site: {id: "s1", _relation__is_protected: false, _relation__is_visible: true, _relation__source: null, _relation__owner: null}}) { ok object { id display_label __typename } } }"#
        );

        let delete = build_delete_mutation(SchemaRef::Node(&schema), "123");
        assert_eq!(delete.to_string(), r#"mutation { DeviceDelete(data: {id: "123"}) { ok } }"#);
    }

    #[test]
    fn test_mutation_result() {
        let response = json!({"data": {"DeviceCreate": {
            "ok": true,
            "object": {"id": "123", "display_label": "sw1", "__typename": "Device"}
        }}});
        let result = MutationResult::from_response(&response, "Device", MutationKind::Create).unwrap();
        assert!(result.ok);
        assert_eq!(result.object.unwrap().id, "123");

        let response = json!({"DeviceDelete": {"ok": false}});
        let result = MutationResult::from_response(&response, "Device", MutationKind::Delete).unwrap();
        assert!(!result.ok);
        assert!(result.object.is_none());

        assert!(MutationResult::from_response(&json!({}), "Device", MutationKind::Update).is_err());
    }
}
