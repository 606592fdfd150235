//! Object snapshots: the last-fetched state of one object.
//!
//! A snapshot is owned by the caller for one edit session and superseded by
//! every refetch or successful mutation. [`ObjectSnapshot::from_node`] decodes
//! the node shape produced by the read queries in [`crate::query`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ResponseError;
use crate::limits::RELATION_PREFIX;
use crate::model::{Cardinality, SchemaRef};

/// A reference to another object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ref {
    pub id: String,
    #[serde(default)]
    pub display_label: String,
    /// Kind of the referenced object (`__typename` on the wire).
    #[serde(default)]
    pub typename: String,
    /// Metadata of the relationship edge leading to this object, if fetched.
    #[serde(default)]
    pub relation: Option<Box<RelationMetadata>>,
}

impl Ref {
    /// Creates a reference with no label and no relation metadata.
    pub fn new(id: impl Into<String>, typename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_label: String::new(),
            typename: typename.into(),
            relation: None,
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.display_label = label.into();
        self
    }

    /// Attaches relation metadata.
    pub fn with_relation(mut self, relation: RelationMetadata) -> Self {
        self.relation = Some(Box::new(relation));
        self
    }
}

/// Provenance and access annotations shared by attribute values and relationship edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetadata {
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<Ref>,
    #[serde(default)]
    pub owner: Option<Ref>,
}

fn visible_by_default() -> bool {
    true
}

impl Default for RelationMetadata {
    fn default() -> Self {
        Self {
            is_protected: false,
            is_visible: true,
            updated_at: None,
            source: None,
            owner: None,
        }
    }
}

/// The fetched state of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub value: Value,
    #[serde(flatten)]
    pub metadata: RelationMetadata,
}

impl AttributeValue {
    /// Creates a visible, unprotected value with no provenance.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            metadata: RelationMetadata::default(),
        }
    }
}

/// The fetched state of one relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipValue {
    One(Option<Ref>),
    Many(Vec<Ref>),
}

impl RelationshipValue {
    /// Returns the peer ids in fetched order.
    pub fn ids(&self) -> Vec<&str> {
        match self {
            RelationshipValue::One(peer) => peer.iter().map(|p| p.id.as_str()).collect(),
            RelationshipValue::Many(peers) => peers.iter().map(|p| p.id.as_str()).collect(),
        }
    }
}

/// Last-fetched representation of one object instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub id: String,
    #[serde(default)]
    pub display_label: String,
    #[serde(default)]
    pub typename: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipValue>,
}

impl ObjectSnapshot {
    /// Creates an empty snapshot for the given object.
    pub fn new(id: impl Into<String>, typename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            typename: typename.into(),
            ..Self::default()
        }
    }

    /// Returns the fetched value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Returns the fetched value of a relationship.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipValue> {
        self.relationships.get(name)
    }

    /// Returns the peer of a cardinality-one relationship.
    pub fn peer(&self, name: &str) -> Option<&Ref> {
        match self.relationships.get(name)? {
            RelationshipValue::One(peer) => peer.as_ref(),
            RelationshipValue::Many(_) => None,
        }
    }

    /// Returns the peer ids of a relationship, empty if not fetched.
    pub fn peer_ids(&self, name: &str) -> Vec<&str> {
        self.relationships.get(name).map(|r| r.ids()).unwrap_or_default()
    }

    /// Decodes one `node` object of a read-query response.
    ///
    /// Only fields declared on `schema` are read; fields the query did not
    /// select are simply absent from the snapshot.
    pub fn from_node(schema: SchemaRef<'_>, node: &Value) -> Result<Self, ResponseError> {
        let object = as_object(node, "node")?;
        let mut snapshot = ObjectSnapshot {
            id: required_str(object, "id", "node.id")?,
            display_label: optional_str(object, "display_label"),
            typename: optional_str(object, "__typename"),
            ..Self::default()
        };

        for attribute in schema.attributes() {
            let Some(raw) = object.get(&attribute.name) else {
                continue;
            };
            let path = format!("node.{}", attribute.name);
            let fields = as_object(raw, &path)?;
            snapshot.attributes.insert(
                attribute.name.clone(),
                AttributeValue {
                    value: fields.get("value").cloned().unwrap_or(Value::Null),
                    metadata: decode_metadata(fields, "", &path)?,
                },
            );
        }

        for relationship in schema.relationships() {
            let Some(raw) = object.get(&relationship.name) else {
                continue;
            };
            let path = format!("node.{}", relationship.name);
            let value = match relationship.cardinality {
                Cardinality::One => RelationshipValue::One(decode_inline_peer(raw, &path)?),
                Cardinality::Many => RelationshipValue::Many(decode_edges(raw, &path)?),
            };
            snapshot.relationships.insert(relationship.name.clone(), value);
        }

        Ok(snapshot)
    }
}

fn as_object<'v>(value: &'v Value, path: &str) -> Result<&'v Map<String, Value>, ResponseError> {
    value.as_object().ok_or_else(|| ResponseError::UnexpectedShape {
        path: path.to_string(),
        expected: "an object",
    })
}

fn required_str(object: &Map<String, Value>, key: &str, path: &str) -> Result<String, ResponseError> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ResponseError::UnexpectedShape {
            path: path.to_string(),
            expected: "a string",
        }),
        None => Err(ResponseError::MissingField { path: path.to_string() }),
    }
}

fn optional_str(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Decodes an `{id display_label __typename}` reference, `null` meaning none.
pub(crate) fn decode_ref(value: Option<&Value>, path: &str) -> Result<Option<Ref>, ResponseError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => {
            let object = as_object(raw, path)?;
            Ok(Some(Ref {
                id: required_str(object, "id", &format!("{path}.id"))?,
                display_label: optional_str(object, "display_label"),
                typename: optional_str(object, "__typename"),
                relation: None,
            }))
        }
    }
}

/// Reads the metadata fields, optionally under the relation prefix.
fn decode_metadata(
    object: &Map<String, Value>,
    prefix: &str,
    path: &str,
) -> Result<RelationMetadata, ResponseError> {
    let flag = |name: &str, default: bool| {
        object
            .get(&format!("{prefix}{name}"))
            .and_then(Value::as_bool)
            .unwrap_or(default)
    };
    let updated_key = if prefix.is_empty() { "updated_at" } else { "_updated_at" };
    let source_key = format!("{prefix}source");
    let owner_key = format!("{prefix}owner");

    Ok(RelationMetadata {
        is_protected: flag("is_protected", false),
        is_visible: flag("is_visible", true),
        updated_at: decode_time(object.get(updated_key), &format!("{path}.{updated_key}"))?,
        source: decode_ref(object.get(&source_key), &format!("{path}.{source_key}"))?,
        owner: decode_ref(object.get(&owner_key), &format!("{path}.{owner_key}"))?,
    })
}

fn decode_time(value: Option<&Value>, path: &str) -> Result<Option<DateTime<Utc>>, ResponseError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| ResponseError::UnexpectedShape {
                path: path.to_string(),
                expected: "an RFC 3339 timestamp",
            }),
        Some(_) => Err(ResponseError::UnexpectedShape {
            path: path.to_string(),
            expected: "an RFC 3339 timestamp",
        }),
    }
}

fn decode_inline_peer(raw: &Value, path: &str) -> Result<Option<Ref>, ResponseError> {
    let Some(mut peer) = decode_ref(Some(raw), path)? else {
        return Ok(None);
    };
    let object = as_object(raw, path)?;
    if object.keys().any(|k| k.starts_with(RELATION_PREFIX) || k == "_updated_at") {
        peer.relation = Some(Box::new(decode_metadata(object, RELATION_PREFIX, path)?));
    }
    Ok(Some(peer))
}

/// Decodes `{count edges { node {...} }}` into the list of peers.
pub(crate) fn decode_edges(raw: &Value, path: &str) -> Result<Vec<Ref>, ResponseError> {
    if raw.is_null() {
        return Ok(Vec::new());
    }
    let object = as_object(raw, path)?;
    let edges_path = format!("{path}.edges");
    let edges = match object.get("edges") {
        Some(Value::Array(edges)) => edges,
        Some(_) => {
            return Err(ResponseError::UnexpectedShape {
                path: edges_path,
                expected: "a list",
            })
        }
        None => return Err(ResponseError::MissingField { path: edges_path }),
    };

    let mut peers = Vec::with_capacity(edges.len());
    for (i, edge) in edges.iter().enumerate() {
        let edge_path = format!("{edges_path}[{i}]");
        let edge = as_object(edge, &edge_path)?;
        let node_path = format!("{edge_path}.node");
        match decode_ref(edge.get("node"), &node_path)? {
            Some(peer) => peers.push(peer),
            None => return Err(ResponseError::MissingField { path: node_path }),
        }
    }
    Ok(peers)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::model::builder::NodeSchemaBuilder;
    use crate::model::{AttributeKind, RelationshipKind};

    fn device() -> crate::model::NodeSchema {
        NodeSchemaBuilder::new("device", "Device")
            .attribute("name", AttributeKind::Text, |a| a)
            .relationship("site", "Site", Cardinality::One, |r| r.kind(RelationshipKind::Attribute))
            .relationship("interfaces", "Interface", Cardinality::Many, |r| r)
            .build()
    }

    #[test]
    fn test_from_node() {
        let schema = device();
        let node = json!({
            "id": "123",
            "display_label": "sw1",
            "__typename": "Device",
            "name": {
                "value": "sw1",
                "updated_at": "2024-01-15T10:00:00Z",
                "is_protected": true,
                "is_visible": true,
                "source": {"id": "git-1", "display_label": "repo", "__typename": "Repository"},
                "owner": null
            },
            "site": {
                "id": "s1",
                "display_label": "Paris",
                "__typename": "Site",
                "_relation__is_visible": false,
                "_relation__is_protected": false,
                "_updated_at": "2024-01-15T10:00:00Z",
                "_relation__owner": {"id": "team-1", "display_label": "NetOps", "__typename": "Team"},
                "_relation__source": null
            },
            "interfaces": {
                "count": 2,
                "edges": [
                    {"node": {"id": "A", "display_label": "eth0", "__typename": "Interface"}},
                    {"node": {"id": "B", "display_label": "eth1", "__typename": "Interface"}}
                ]
            }
        });

        let snapshot = ObjectSnapshot::from_node(SchemaRef::Node(&schema), &node).unwrap();
        assert_eq!(snapshot.id, "123");
        assert_eq!(snapshot.typename, "Device");

        let name = snapshot.attribute("name").unwrap();
        assert_eq!(name.value, json!("sw1"));
        assert!(name.metadata.is_protected);
        assert_eq!(name.metadata.source.as_ref().unwrap().typename, "Repository");
        assert!(name.metadata.owner.is_none());
        assert_eq!(
            name.metadata.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap())
        );

        let site = snapshot.peer("site").unwrap();
        assert_eq!(site.id, "s1");
        let relation = site.relation.as_ref().unwrap();
        assert!(!relation.is_visible);
        assert_eq!(relation.owner.as_ref().unwrap().id, "team-1");

        assert_eq!(snapshot.peer_ids("interfaces"), vec!["A", "B"]);
    }

    #[test]
    fn test_from_node_partial_selection() {
        let schema = device();
        let node = json!({"id": "123", "display_label": "sw1", "site": null});

        let snapshot = ObjectSnapshot::from_node(SchemaRef::Node(&schema), &node).unwrap();
        assert!(snapshot.attribute("name").is_none());
        assert_eq!(snapshot.relationship("site"), Some(&RelationshipValue::One(None)));
        assert!(snapshot.relationship("interfaces").is_none());
    }

    #[test]
    fn test_from_node_errors() {
        let schema = device();

        let missing_id = json!({"display_label": "sw1"});
        assert_eq!(
            ObjectSnapshot::from_node(SchemaRef::Node(&schema), &missing_id),
            Err(ResponseError::MissingField { path: "node.id".to_string() })
        );

        let bad_edges = json!({"id": "1", "interfaces": {"count": 1, "edges": {}}});
        assert!(matches!(
            ObjectSnapshot::from_node(SchemaRef::Node(&schema), &bad_edges),
            Err(ResponseError::UnexpectedShape { expected: "a list", .. })
        ));

        let bad_time = json!({"id": "1", "name": {"value": "sw1", "updated_at": "yesterday"}});
        assert_eq!(
            ObjectSnapshot::from_node(SchemaRef::Node(&schema), &bad_time),
            Err(ResponseError::UnexpectedShape {
                path: "node.name.updated_at".to_string(),
                expected: "an RFC 3339 timestamp",
            })
        );
    }
}
