//! Peer option listings for relationship selects.
//!
//! A form needs, for every peer kind it links to, the list of objects a user
//! may pick. [`build_peer_options_query`] fetches those listings in one
//! document; [`build_edit_query`] additionally reads the edited object so an
//! edit form loads in a single round trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ResponseError;
use crate::model::snapshot::decode_edges;
use crate::model::{Ref, SchemaRef};
use crate::query::ast::{Document, Selection};
use crate::query::context::ExecutionContext;
use crate::query::read::{object_selection, ref_selection, unwrap_data, FieldSelection, ReadMode, ReadQuery, QueryOptions};
use crate::registry::SchemaRegistry;

/// Response key of the edited object in an edit query.
pub const EDIT_OBJECT_KEY: &str = "object";

/// Selectable objects per concrete kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerOptions {
    by_kind: BTreeMap<String, Vec<Ref>>,
}

impl PeerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the options for one kind, replacing earlier ones.
    pub fn with(mut self, kind: impl Into<String>, options: impl IntoIterator<Item = Ref>) -> Self {
        self.insert(kind, options);
        self
    }

    pub fn insert(&mut self, kind: impl Into<String>, options: impl IntoIterator<Item = Ref>) {
        self.by_kind.insert(kind.into(), options.into_iter().collect());
    }

    /// Returns the options for one concrete kind.
    pub fn get(&self, kind: &str) -> Option<&[Ref]> {
        self.by_kind.get(kind).map(Vec::as_slice)
    }

    /// Returns the kinds with options, in name order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.by_kind.keys().map(String::as_str)
    }

    /// Returns the options for a relationship peer.
    ///
    /// A generic peer yields the union over its implementers in `used_by`
    /// order, de-duplicated by id. Returns `None` when the registry cannot
    /// resolve the peer at all.
    pub fn for_peer(&self, registry: &SchemaRegistry, peer: &str) -> Option<Vec<Ref>> {
        registry.resolve(peer)?;
        let mut options: Vec<Ref> = Vec::new();
        for kind in registry.peer_kinds(peer) {
            for option in self.get(kind).unwrap_or_default() {
                if !options.iter().any(|o| o.id == option.id) {
                    options.push(option.clone());
                }
            }
        }
        Some(options)
    }

    /// Decodes the listings for `kinds` from a peer-options or edit response.
    ///
    /// A kind missing from the response is an error; an empty listing is not.
    pub fn from_response<S: AsRef<str>>(response: &Value, kinds: &[S]) -> Result<Self, ResponseError> {
        let data = unwrap_data(response);
        let mut options = Self::new();
        for kind in kinds {
            let kind = kind.as_ref();
            let raw = data
                .get(kind)
                .ok_or_else(|| ResponseError::MissingField { path: kind.to_string() })?;
            options.insert(kind, decode_edges(raw, kind)?);
        }
        Ok(options)
    }
}

fn listing(kind: &str) -> Selection {
    Selection::field(kind).select(Selection::field("edges").select(ref_selection("node")))
}

fn dedup<'k, S: AsRef<str>>(kinds: &'k [S]) -> Vec<&'k str> {
    let mut unique: Vec<&str> = Vec::new();
    for kind in kinds {
        if !unique.contains(&kind.as_ref()) {
            unique.push(kind.as_ref());
        }
    }
    unique
}

/// Builds one query listing `id display_label __typename` for each kind.
///
/// Returns the placeholder document when `kinds` is empty.
pub fn build_peer_options_query<S: AsRef<str>>(kinds: &[S]) -> Document {
    let selections: Vec<Selection> = dedup(kinds).into_iter().map(listing).collect();
    if selections.is_empty() {
        return Document::placeholder();
    }
    Document::query(selections)
}

/// Builds the combined read for an edit form: the object under
/// [`EDIT_OBJECT_KEY`] plus the listing of every peer kind.
///
/// Returns the placeholder when `schema` is absent.
pub fn build_edit_query<S: AsRef<str>>(
    schema: Option<SchemaRef<'_>>,
    id: &str,
    peer_kinds: &[S],
    context: &ExecutionContext,
) -> ReadQuery {
    let Some(schema) = schema else {
        return ReadQuery {
            document: Document::placeholder(),
            context: context.clone(),
            root: None,
        };
    };

    let fields = FieldSelection::for_form(schema);
    let mode = ReadMode::Single { id: id.to_string() };
    let object = object_selection(schema.kind(), &fields, &mode, &QueryOptions::default()).alias(EDIT_OBJECT_KEY);

    let mut selections = vec![object];
    selections.extend(dedup(peer_kinds).into_iter().map(listing));

    ReadQuery {
        document: Document::query(selections),
        context: context.clone(),
        root: Some(EDIT_OBJECT_KEY.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::builder::{GenericSchemaBuilder, NodeSchemaBuilder};
    use crate::model::{AttributeKind, Cardinality};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_parts(
            vec![
                NodeSchemaBuilder::new("account", "Account").inherits("DataOwner").build(),
                NodeSchemaBuilder::new("team", "Team").inherits("DataOwner").build(),
                NodeSchemaBuilder::new("device", "Device")
                    .attribute("name", AttributeKind::Text, |a| a)
                    .relationship("parent", "Device", Cardinality::One, |r| r)
                    .build(),
            ],
            vec![GenericSchemaBuilder::new("DataOwner").build()],
        )
        .unwrap()
    }

    #[test]
    fn test_for_peer_generic_union() {
        let registry = registry();
        let options = PeerOptions::new()
            .with("Account", [Ref::new("a1", "Account"), Ref::new("shared", "Account")])
            .with("Team", [Ref::new("shared", "Team"), Ref::new("t1", "Team")]);

        let ids: Vec<_> = options
            .for_peer(&registry, "DataOwner")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a1", "shared", "t1"]);

        assert_eq!(options.for_peer(&registry, "Device"), Some(Vec::new()));
        assert_eq!(options.for_peer(&registry, "Site"), None);
    }

    #[test]
    fn test_peer_options_query() {
        let doc = build_peer_options_query(&["Team", "Account", "Team"]);
        assert_eq!(
            doc.to_string(),
            "query { Team { edges { node { id display_label __typename } } } Account { edges { node { id display_label __typename } } } }"
        );
        assert!(build_peer_options_query::<&str>(&[]).is_placeholder());
    }

    #[test]
    fn test_edit_query_aliases_object() {
        let registry = registry();
        let schema = registry.resolve("Device").unwrap();
        let context = ExecutionContext::branch("main").unwrap();
        let query = build_edit_query(Some(schema), "123", &["Device"], &context);

        let text = query.document.to_string();
        assert!(text.starts_with(r#"query { object: Device(ids: ["123"]) { edges { node { id display_label __typename name {"#));
        assert!(text.ends_with("Device { edges { node { id display_label __typename } } } }"));

        let response = json!({
            "object": {"edges": [{"node": {"id": "123", "display_label": "sw1", "parent": null}}]},
            "Device": {"edges": [{"node": {"id": "123", "display_label": "sw1", "__typename": "Device"}}]}
        });
        let snapshot = query.decode_single(schema, &response).unwrap().unwrap();
        assert_eq!(snapshot.id, "123");

        let options = PeerOptions::from_response(&response, &["Device"]).unwrap();
        assert_eq!(options.get("Device").unwrap().len(), 1);
        assert!(PeerOptions::from_response(&response, &["Team"]).is_err());
    }
}
