//! Read-query synthesis.
//!
//! Builds the document that fetches one object or a filtered, paginated
//! collection of objects, together with every selected field's metadata.
//!
//! Field expansion:
//! - attribute: `name { value updated_at is_protected is_visible source {..} owner {..} }`
//! - cardinality one: the peer inline, with `_relation__*` metadata fields
//! - cardinality many: `name { count edges { node { id display_label __typename } } }`

use std::collections::BTreeMap;

use log::warn;
use serde_json::Value;

use crate::classify::{FieldPolicy, ViewContext, DEFAULT_POLICY};
use crate::error::ResponseError;
use crate::limits::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, RELATION_PREFIX};
use crate::model::{AttributeDef, Cardinality, ObjectSnapshot, RelationshipDef, SchemaRef};
use crate::query::ast::{is_valid_name, ArgValue, Document, Selection};
use crate::query::context::ExecutionContext;

/// Tunables for read-query synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Request provenance and access metadata for every field.
    pub with_metadata: bool,
    /// Page size used when a collection query sets no limit.
    pub default_limit: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            with_metadata: true,
            default_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Single-object or collection read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadMode {
    Single {
        id: String,
    },
    Collection {
        filters: BTreeMap<String, ArgValue>,
        offset: u32,
        limit: Option<u32>,
    },
}

/// Parameters of a read query.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadParams {
    pub mode: ReadMode,
    pub context: ExecutionContext,
    pub options: QueryOptions,
}

impl ReadParams {
    /// Reads one object by id.
    pub fn single(id: impl Into<String>, context: ExecutionContext) -> Self {
        Self {
            mode: ReadMode::Single { id: id.into() },
            context,
            options: QueryOptions::default(),
        }
    }

    /// Reads the first page of a collection.
    pub fn collection(context: ExecutionContext) -> Self {
        Self {
            mode: ReadMode::Collection {
                filters: BTreeMap::new(),
                offset: 0,
                limit: None,
            },
            context,
            options: QueryOptions::default(),
        }
    }

    /// Adds a filter, e.g. `name__value`. Ignored in single-object mode.
    pub fn filter(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        if let ReadMode::Collection { filters, .. } = &mut self.mode {
            filters.insert(name.into(), value.into());
        }
        self
    }

    /// Sets the page window. Ignored in single-object mode.
    pub fn page(mut self, offset: u32, limit: u32) -> Self {
        if let ReadMode::Collection {
            offset: o, limit: l, ..
        } = &mut self.mode
        {
            *o = offset;
            *l = Some(limit);
        }
        self
    }

    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }
}

/// The fields a read query selects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSelection<'a> {
    pub attributes: Vec<&'a AttributeDef>,
    pub relationships: Vec<&'a RelationshipDef>,
}

impl<'a> FieldSelection<'a> {
    /// Selects the fields shown in `context` under the default policy.
    pub fn for_context(schema: SchemaRef<'a>, context: ViewContext) -> Self {
        Self::with_policy(&DEFAULT_POLICY, schema, context)
    }

    /// Selects the fields shown in `context` under `policy`.
    pub fn with_policy(policy: &FieldPolicy, schema: SchemaRef<'a>, context: ViewContext) -> Self {
        Self {
            attributes: policy.select_attributes(schema, context),
            relationships: policy.select_relationships(schema, context),
        }
    }

    /// Selects the fields an edit form needs.
    pub fn for_form(schema: SchemaRef<'a>) -> Self {
        Self::for_context(schema, ViewContext::Form)
    }

    /// Selects every declared field.
    pub fn all(schema: SchemaRef<'a>) -> Self {
        Self {
            attributes: schema.attributes().iter().collect(),
            relationships: schema.relationships().iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.relationships.is_empty()
    }
}

/// A synthesized read query and the context to execute it in.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadQuery {
    pub document: Document,
    pub context: ExecutionContext,
    /// Response key of the object selection; `None` for the placeholder.
    pub root: Option<String>,
}

/// One decoded page of a collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Total matching objects on the server, not the page length.
    pub count: u64,
    pub objects: Vec<ObjectSnapshot>,
}

impl ReadQuery {
    /// Returns true if the schema was absent and the placeholder was built.
    pub fn is_placeholder(&self) -> bool {
        self.root.is_none()
    }

    /// Decodes the response of a single-object query.
    ///
    /// Returns `Ok(None)` when the server returned no matching object.
    pub fn decode_single(
        &self,
        schema: SchemaRef<'_>,
        response: &Value,
    ) -> Result<Option<ObjectSnapshot>, ResponseError> {
        let edges = self.edges(response)?;
        match edges.first() {
            Some(edge) => {
                let node = edge.get("node").ok_or_else(|| ResponseError::MissingField {
                    path: format!("{}.edges[0].node", self.root_key()),
                })?;
                ObjectSnapshot::from_node(schema, node).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Decodes the response of a collection query.
    pub fn decode_collection(&self, schema: SchemaRef<'_>, response: &Value) -> Result<Page, ResponseError> {
        let root = self.root_value(response)?;
        let count = root.get("count").and_then(Value::as_u64).unwrap_or_default();
        let mut objects = Vec::new();
        for (i, edge) in self.edges(response)?.iter().enumerate() {
            let node = edge.get("node").ok_or_else(|| ResponseError::MissingField {
                path: format!("{}.edges[{i}].node", self.root_key()),
            })?;
            objects.push(ObjectSnapshot::from_node(schema, node)?);
        }
        Ok(Page { count, objects })
    }

    fn root_key(&self) -> &str {
        self.root.as_deref().unwrap_or("ok")
    }

    fn root_value<'v>(&self, response: &'v Value) -> Result<&'v Value, ResponseError> {
        let key = self.root_key();
        unwrap_data(response)
            .get(key)
            .ok_or_else(|| ResponseError::MissingField { path: key.to_string() })
    }

    fn edges<'v>(&self, response: &'v Value) -> Result<&'v Vec<Value>, ResponseError> {
        let root = self.root_value(response)?;
        let path = format!("{}.edges", self.root_key());
        match root.get("edges") {
            Some(Value::Array(edges)) => Ok(edges),
            Some(_) => Err(ResponseError::UnexpectedShape {
                path,
                expected: "a list",
            }),
            None if !root.is_object() => Err(ResponseError::UnexpectedShape {
                path: self.root_key().to_string(),
                expected: "an object",
            }),
            None => Err(ResponseError::MissingField { path }),
        }
    }
}

/// Transports may hand back the whole envelope or just its `data` member.
pub(crate) fn unwrap_data(response: &Value) -> &Value {
    response.get("data").filter(|d| d.is_object()).unwrap_or(response)
}

/// Builds a read query for `schema`, or the placeholder if it is absent.
pub fn build_read_query(schema: Option<SchemaRef<'_>>, fields: &FieldSelection<'_>, params: &ReadParams) -> ReadQuery {
    let Some(schema) = schema else {
        return ReadQuery {
            document: Document::placeholder(),
            context: params.context.clone(),
            root: None,
        };
    };

    let root = object_selection(schema.kind(), fields, &params.mode, &params.options);
    let key = root.response_key().to_string();
    ReadQuery {
        document: Document::query(vec![root]),
        context: params.context.clone(),
        root: Some(key),
    }
}

/// Builds the root selection for one kind: arguments, `count` and `edges.node`.
pub(crate) fn object_selection(
    kind: &str,
    fields: &FieldSelection<'_>,
    mode: &ReadMode,
    options: &QueryOptions,
) -> Selection {
    let mut root = Selection::field(kind);
    match mode {
        ReadMode::Single { id } => {
            root = root.arg("ids", ArgValue::List(vec![ArgValue::from(id.as_str())]));
        }
        ReadMode::Collection { filters, offset, limit } => {
            let limit = limit.unwrap_or(options.default_limit).min(MAX_PAGE_LIMIT);
            root = root.arg("offset", *offset).arg("limit", limit);
            for (name, value) in filters {
                if is_valid_name(name) {
                    root = root.arg(name.as_str(), value.clone());
                } else {
                    warn!("dropping filter with invalid name {name:?} on {kind}");
                }
            }
            root = root.select(Selection::field("count"));
        }
    }

    let mut node = Selection::field("node").select_all(Selection::fields(["id", "display_label", "__typename"]));
    node = node.select_all(fields.attributes.iter().map(|a| attribute_selection(a, options)));
    node = node.select_all(fields.relationships.iter().map(|r| relationship_selection(r, options)));

    root.select(Selection::field("edges").select(node))
}

/// `{id display_label __typename}` of a referenced object.
pub(crate) fn ref_selection(name: &str) -> Selection {
    Selection::field(name).select_all(Selection::fields(["id", "display_label", "__typename"]))
}

fn attribute_selection(attribute: &AttributeDef, options: &QueryOptions) -> Selection {
    let field = Selection::field(attribute.name.as_str()).select(Selection::field("value"));
    if !options.with_metadata {
        return field;
    }
    field
        .select_all(Selection::fields(["updated_at", "is_protected", "is_visible"]))
        .select(ref_selection("source"))
        .select(ref_selection("owner"))
}

fn relationship_selection(relationship: &RelationshipDef, options: &QueryOptions) -> Selection {
    match relationship.cardinality {
        Cardinality::One => {
            let field = ref_selection(&relationship.name);
            if !options.with_metadata {
                return field;
            }
            field
                .select(Selection::field(format!("{RELATION_PREFIX}is_visible")))
                .select(Selection::field(format!("{RELATION_PREFIX}is_protected")))
                .select(Selection::field("_updated_at"))
                .select(ref_selection(&format!("{RELATION_PREFIX}owner")))
                .select(ref_selection(&format!("{RELATION_PREFIX}source")))
        }
        Cardinality::Many => Selection::field(relationship.name.as_str())
            .select(Selection::field("count"))
            .select(Selection::field("edges").select(ref_selection("node"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::builder::NodeSchemaBuilder;
    use crate::model::{AttributeKind, NodeSchema, RelationshipKind};

    fn device() -> NodeSchema {
        NodeSchemaBuilder::new("device", "Device")
            .attribute("name", AttributeKind::Text, |a| a)
            .attribute("description", AttributeKind::TextArea, |a| a.optional())
            .relationship("site", "Site", Cardinality::One, |r| r.kind(RelationshipKind::Attribute))
            .relationship("interfaces", "Interface", Cardinality::Many, |r| r.kind(RelationshipKind::Attribute))
            .build()
    }

    fn head() -> ExecutionContext {
        ExecutionContext::branch("main").unwrap()
    }

    #[test]
    fn test_single_object_query() {
        let schema = device();
        let schema = SchemaRef::Node(&schema);
        let fields = FieldSelection::for_context(schema, ViewContext::Detail);
        let query = build_read_query(Some(schema), &fields, &ReadParams::single("123", head()));

        assert_eq!(query.root.as_deref(), Some("Device"));
        let root = query.document.root("Device").unwrap();
        assert_eq!(root.argument("ids"), Some(&ArgValue::List(vec![ArgValue::from("123")])));
        assert!(root.child("count").is_none());

        let node = root.path("edges.node").unwrap();
        assert!(node.child("id").is_some());
        assert!(node.child("display_label").is_some());

        let name = node.child("name").unwrap();
        let block: Vec<_> = name.selections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(block, vec!["value", "updated_at", "is_protected", "is_visible", "source", "owner"]);
        assert!(name.path("owner.__typename").is_some());

        let site = node.child("site").unwrap();
        assert!(site.child("_relation__is_protected").is_some());
        assert!(site.path("_relation__owner.display_label").is_some());

        let interfaces = node.child("interfaces").unwrap();
        assert!(interfaces.child("count").is_some());
        assert!(interfaces.path("edges.node.id").is_some());

        // Branch and time stay out of the body
        assert!(!query.document.to_string().contains("main"));
        assert_eq!(query.context.endpoint_path(), "/graphql/main");
    }

    #[test]
    fn test_collection_query() {
        let schema = device();
        let schema = SchemaRef::Node(&schema);
        let fields = FieldSelection::for_context(schema, ViewContext::List);
        let params = ReadParams::collection(head())
            .filter("name__value", "sw\"1")
            .filter("bad name", "x")
            .page(20, 5000);
        let query = build_read_query(Some(schema), &fields, &params);

        let text = query.document.to_string();
        assert!(text.starts_with(r#"query { Device(offset: 20, limit: 1000, name__value: "sw\"1") { count edges { node { id display_label __typename name { value"#));
        assert!(!text.contains("bad name"));
        assert!(!text.contains("description"));
    }

    #[test]
    fn test_default_limit_and_no_metadata() {
        let schema = device();
        let schema = SchemaRef::Node(&schema);
        let fields = FieldSelection::all(schema);
        let params = ReadParams::collection(head()).options(QueryOptions {
            with_metadata: false,
            default_limit: 25,
        });
        let query = build_read_query(Some(schema), &fields, &params);

        let root = query.document.root("Device").unwrap();
        assert_eq!(root.argument("limit"), Some(&ArgValue::Int(25)));
        let node = root.path("edges.node").unwrap();
        assert_eq!(node.child("name").unwrap().selections.len(), 1);
        assert_eq!(node.child("site").unwrap().selections.len(), 3);
    }

    #[test]
    fn test_placeholder_without_schema() {
        let query = build_read_query(None, &FieldSelection::default(), &ReadParams::single("123", head()));
        assert!(query.is_placeholder());
        assert_eq!(query.document.to_string(), "query { ok }");
    }

    #[test]
    fn test_decode_collection() {
        let schema = device();
        let schema = SchemaRef::Node(&schema);
        let query = build_read_query(Some(schema), &FieldSelection::all(schema), &ReadParams::collection(head()));

        let response = json!({"data": {"Device": {"count": 42, "edges": [
            {"node": {"id": "1", "display_label": "sw1"}},
            {"node": {"id": "2", "display_label": "sw2"}}
        ]}}});
        let page = query.decode_collection(schema, &response).unwrap();
        assert_eq!(page.count, 42);
        assert_eq!(page.objects.len(), 2);
        assert_eq!(page.objects[1].display_label, "sw2");

        assert_eq!(
            query.decode_collection(schema, &json!({})),
            Err(ResponseError::MissingField { path: "Device".to_string() })
        );
    }
}
