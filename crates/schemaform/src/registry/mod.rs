//! Schema registry: resolves node and generic schemas for one (branch, time) context.
//!
//! A registry is built once from a schema snapshot and is immutable
//! afterwards; a schema reload builds a new one. Query and form synthesis
//! results may be memoized against a registry.
//!
//! Ingestion normalizes the payload:
//! - nodes and generics are sorted by name
//! - attribute and relationship lists are sorted by `order_weight`
//!   (stable, unweighted fields last)
//! - a generic's `used_by` is completed from the nodes' `inherit_from`

use std::collections::BTreeMap;

use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::SchemaError;
use crate::model::{GenericSchema, NodeSchema, SchemaRef, SchemaRoot};

/// Immutable index over one schema snapshot.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    nodes: Vec<NodeSchema>,
    generics: Vec<GenericSchema>,
    node_by_name: FxHashMap<String, usize>,
    node_by_kind: FxHashMap<String, usize>,
    generic_by_kind: FxHashMap<String, usize>,
    kind_names: BTreeMap<String, String>,
}

impl SchemaRegistry {
    /// Builds a registry from a parsed schema payload.
    pub fn new(root: SchemaRoot) -> Result<Self, SchemaError> {
        let SchemaRoot { nodes, generics, .. } = root;
        Self::from_parts(nodes, generics)
    }

    /// Parses the JSON schema payload (`{"nodes": [...], "generics": [...]}`).
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let root: SchemaRoot =
            serde_json::from_str(json).map_err(|e| SchemaError::InvalidPayload(e.to_string()))?;
        Self::new(root)
    }

    /// Builds a registry from node and generic lists.
    pub fn from_parts(
        mut nodes: Vec<NodeSchema>,
        mut generics: Vec<GenericSchema>,
    ) -> Result<Self, SchemaError> {
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        for node in &mut nodes {
            check_identifiers(&node.kind, &node.name)?;
            check_fields(
                &node.kind,
                node.attributes.iter().map(|a| &a.name),
                node.relationships.iter().map(|r| &r.name),
            )?;
            node.attributes.sort_by_key(|a| a.sort_weight());
            node.relationships.sort_by_key(|r| r.sort_weight());
        }

        for generic in &mut generics {
            if generic.name.is_empty() {
                generic.name = generic.kind.clone();
            }
            check_identifiers(&generic.kind, &generic.name)?;
            check_fields(
                &generic.kind,
                generic.attributes.iter().map(|a| &a.name),
                generic.relationships.iter().map(|r| &r.name),
            )?;
            generic.attributes.sort_by_key(|a| a.sort_weight());
            generic.relationships.sort_by_key(|r| r.sort_weight());
        }
        generics.sort_by(|a, b| a.name.cmp(&b.name));

        let mut registry = SchemaRegistry::default();
        let mut names = FxHashSet::default();

        for (i, node) in nodes.iter().enumerate() {
            if !names.insert(node.name.clone()) {
                return Err(SchemaError::DuplicateName { name: node.name.clone() });
            }
            if registry.node_by_kind.insert(node.kind.clone(), i).is_some() {
                return Err(SchemaError::DuplicateKind { kind: node.kind.clone() });
            }
            registry.node_by_name.insert(node.name.clone(), i);
            registry.kind_names.insert(node.kind.clone(), node.name.clone());
        }

        for (i, generic) in generics.iter().enumerate() {
            if !names.insert(generic.name.clone()) {
                return Err(SchemaError::DuplicateName { name: generic.name.clone() });
            }
            if registry.node_by_kind.contains_key(&generic.kind)
                || registry.generic_by_kind.insert(generic.kind.clone(), i).is_some()
            {
                return Err(SchemaError::DuplicateKind { kind: generic.kind.clone() });
            }
            registry.kind_names.insert(generic.kind.clone(), generic.name.clone());
        }

        // Complete used_by from inherit_from
        for node in &nodes {
            for parent in &node.inherit_from {
                match registry.generic_by_kind.get(parent) {
                    Some(&i) => {
                        let used_by = &mut generics[i].used_by;
                        if !used_by.iter().any(|k| k == &node.kind) {
                            used_by.push(node.kind.clone());
                        }
                    }
                    None => warn!(
                        "schema {} inherits from unknown generic {}",
                        node.kind, parent
                    ),
                }
            }
        }

        registry.nodes = nodes;
        registry.generics = generics;

        debug!(
            "loaded schema registry: {} nodes, {} generics",
            registry.nodes.len(),
            registry.generics.len()
        );
        Ok(registry)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Looks up a node schema by internal name.
    pub fn resolve_by_name(&self, name: &str) -> Option<&NodeSchema> {
        self.node_by_name.get(name).map(|&i| &self.nodes[i])
    }

    /// Looks up a node schema by kind.
    pub fn resolve_by_kind(&self, kind: &str) -> Option<&NodeSchema> {
        self.node_by_kind.get(kind).map(|&i| &self.nodes[i])
    }

    /// Looks up a generic schema by kind.
    pub fn generic(&self, kind: &str) -> Option<&GenericSchema> {
        self.generic_by_kind.get(kind).map(|&i| &self.generics[i])
    }

    /// Resolves a kind to either a node or a generic.
    pub fn resolve(&self, kind: &str) -> Option<SchemaRef<'_>> {
        self.resolve_by_kind(kind)
            .map(SchemaRef::Node)
            .or_else(|| self.generic(kind).map(SchemaRef::Generic))
    }

    /// Returns the kind → internal name map over nodes and generics.
    pub fn kind_name_map(&self) -> &BTreeMap<String, String> {
        &self.kind_names
    }

    /// Expands a generic to the node schemas in its `used_by` list.
    ///
    /// Kinds listed in `used_by` that are not loaded are skipped.
    pub fn implementers(&self, generic_kind: &str) -> Vec<&NodeSchema> {
        let Some(generic) = self.generic(generic_kind) else {
            return Vec::new();
        };
        generic
            .used_by
            .iter()
            .filter_map(|kind| self.resolve_by_kind(kind))
            .collect()
    }

    /// Returns every node listing `generic_kind` in `inherit_from`, in name order.
    pub fn nodes_inheriting(&self, generic_kind: &str) -> Vec<&NodeSchema> {
        self.nodes.iter().filter(|n| n.inherits(generic_kind)).collect()
    }

    /// Returns the concrete kinds a relationship peer may resolve to.
    ///
    /// A node peer yields itself, a generic peer its loaded implementers, and
    /// an unknown peer nothing.
    pub fn peer_kinds(&self, peer: &str) -> Vec<&str> {
        match self.resolve(peer) {
            Some(SchemaRef::Node(node)) => vec![node.kind.as_str()],
            Some(SchemaRef::Generic(_)) => self
                .implementers(peer)
                .into_iter()
                .map(|node| node.kind.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// All node schemas, sorted by name.
    pub fn nodes(&self) -> &[NodeSchema] {
        &self.nodes
    }

    /// All generic schemas, sorted by name.
    pub fn generics(&self) -> &[GenericSchema] {
        &self.generics
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.generics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_identifiers(kind: &str, name: &str) -> Result<(), SchemaError> {
    if kind.is_empty() {
        return Err(SchemaError::EmptyIdentifier {
            schema: name.to_string(),
            what: "kind",
        });
    }
    if name.is_empty() {
        return Err(SchemaError::EmptyIdentifier {
            schema: kind.to_string(),
            what: "name",
        });
    }
    Ok(())
}

/// Attribute and relationship names share one namespace per schema.
fn check_fields<'a>(
    schema: &str,
    attributes: impl Iterator<Item = &'a String>,
    relationships: impl Iterator<Item = &'a String>,
) -> Result<(), SchemaError> {
    let mut seen = FxHashSet::default();
    for field in attributes.chain(relationships) {
        if field.is_empty() {
            return Err(SchemaError::EmptyIdentifier {
                schema: schema.to_string(),
                what: "field name",
            });
        }
        if !seen.insert(field.as_str()) {
            return Err(SchemaError::DuplicateField {
                schema: schema.to_string(),
                field: field.clone(),
            });
        }
    }
    Ok(())
}
