//! Form structure synthesis.
//!
//! Turns a schema, an optional snapshot and the available peer options into
//! an ordered list of [`FieldDescriptor`]s: attributes first, then
//! relationships, each in schema order. In edit mode every attribute and
//! cardinality-one relationship also carries nested metadata descriptors.

pub mod descriptor;
pub mod selector;

pub use descriptor::{
    FieldConfig, FieldDescriptor, FieldValue, InputKind, MetadataDescriptor, MetadataField, MetadataInput,
    SelectOption,
};
pub use selector::{ReferenceSelector, SelectorState};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::classify::{FieldPolicy, ViewContext, DEFAULT_POLICY};
use crate::limits::{DATA_OWNER_KIND, DATA_SOURCE_KIND, RELATION_PREFIX};
use crate::model::{
    is_empty_value, AttributeDef, Cardinality, ObjectSnapshot, Ref, RelationMetadata, RelationshipDef,
    RelationshipValue, SchemaRef,
};
use crate::query::PeerOptions;
use crate::registry::SchemaRegistry;

/// Whether a form creates a new object or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    Create,
    Edit,
}

/// Builds form descriptors against one registry.
#[derive(Debug, Clone, Copy)]
pub struct FormBuilder<'r> {
    registry: &'r SchemaRegistry,
    policy: &'r FieldPolicy,
}

impl<'r> FormBuilder<'r> {
    /// Creates a builder using the default field policy.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            policy: &DEFAULT_POLICY,
        }
    }

    /// Uses a custom field policy.
    pub fn with_policy(mut self, policy: &'r FieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the concrete kinds whose listings the form needs.
    ///
    /// Relationship peers are expanded through generics. Edit mode adds the
    /// kinds offered by the `source` and `owner` selectors.
    pub fn peer_kinds(&self, schema: SchemaRef<'_>, mode: FormMode) -> Vec<String> {
        let mut kinds: Vec<String> = Vec::new();
        let mut push = |kind: &str| {
            if !kinds.iter().any(|k| k == kind) {
                kinds.push(kind.to_string());
            }
        };
        for relationship in self.policy.select_relationships(schema, ViewContext::Form) {
            self.registry.peer_kinds(&relationship.peer).into_iter().for_each(&mut push);
        }
        if mode == FormMode::Edit {
            for generic in [DATA_SOURCE_KIND, DATA_OWNER_KIND] {
                for node in self.registry.nodes_inheriting(generic) {
                    push(node.kind.as_str());
                }
            }
        }
        kinds
    }

    /// Builds the descriptors for one form.
    pub fn build(
        &self,
        schema: SchemaRef<'_>,
        mode: FormMode,
        existing: Option<&ObjectSnapshot>,
        peer_options: &PeerOptions,
    ) -> Vec<FieldDescriptor> {
        let existing = if mode == FormMode::Edit { existing } else { None };
        let mut fields = Vec::new();

        for attribute in self.policy.select_attributes(schema, ViewContext::Form) {
            fields.push(self.attribute_field(attribute, mode, existing, peer_options));
        }
        for relationship in self.policy.select_relationships(schema, ViewContext::Form) {
            fields.push(self.relationship_field(relationship, mode, existing, peer_options));
        }
        fields
    }

    fn attribute_field(
        &self,
        attribute: &AttributeDef,
        mode: FormMode,
        existing: Option<&ObjectSnapshot>,
        peer_options: &PeerOptions,
    ) -> FieldDescriptor {
        let current = existing.and_then(|s| s.attribute(&attribute.name));
        let value = match mode {
            FormMode::Edit => current.map(|c| &c.value),
            FormMode::Create => attribute.default_value.as_ref(),
        };
        let current_value = match value {
            Some(v) if !is_empty_value(v) => FieldValue::Value(v.clone()),
            _ => FieldValue::Empty,
        };
        let protected = current.is_some_and(|c| c.metadata.is_protected);

        let metadata = match mode {
            FormMode::Edit => {
                let state = current.map(|c| c.metadata.clone()).unwrap_or_default();
                self.metadata_fields(&attribute.name, "", &state, peer_options)
            }
            FormMode::Create => Vec::new(),
        };

        FieldDescriptor {
            field_name: attribute.name.clone(),
            input_name: format!("{}.value", attribute.name),
            input_kind: InputKind::for_attribute(&attribute.kind, !attribute.choices.is_empty()),
            label: attribute.label().to_string(),
            current_value,
            is_attribute: true,
            is_relationship: false,
            relationship_cardinality: None,
            options: attribute.choices.iter().map(SelectOption::choice).collect(),
            disabled: attribute.read_only || protected,
            config: FieldConfig {
                required: !attribute.optional,
                min_length: attribute.min_length,
                max_length: attribute.max_length,
                regex: attribute.regex.clone(),
            },
            metadata,
        }
    }

    fn relationship_field(
        &self,
        relationship: &RelationshipDef,
        mode: FormMode,
        existing: Option<&ObjectSnapshot>,
        peer_options: &PeerOptions,
    ) -> FieldDescriptor {
        let current = existing.and_then(|s| s.relationship(&relationship.name));

        let options = match peer_options.for_peer(self.registry, &relationship.peer) {
            Some(options) => options.iter().map(SelectOption::peer).collect(),
            None => {
                warn!(
                    "peer {} of relationship {} is not in the registry; emitting no options",
                    relationship.peer, relationship.name
                );
                Vec::new()
            }
        };

        let (input_name, current_value, peer) = match relationship.cardinality {
            Cardinality::One => {
                let peer = match current {
                    Some(RelationshipValue::One(peer)) => peer.as_ref(),
                    _ => None,
                };
                let value = peer.map_or(FieldValue::Empty, |p| FieldValue::Id(p.id.clone()));
                (format!("{}.id", relationship.name), value, peer)
            }
            Cardinality::Many => {
                let ids = current
                    .map(|c| c.ids().into_iter().map(str::to_string).collect())
                    .unwrap_or_default();
                (format!("{}.list", relationship.name), FieldValue::Ids(ids), None)
            }
        };

        let relation = peer.and_then(|p| p.relation.as_deref());
        let metadata = match (mode, relationship.cardinality) {
            (FormMode::Edit, Cardinality::One) => {
                let state = relation.cloned().unwrap_or_default();
                self.metadata_fields(&relationship.name, RELATION_PREFIX, &state, peer_options)
            }
            _ => Vec::new(),
        };

        FieldDescriptor {
            field_name: relationship.name.clone(),
            input_name,
            input_kind: InputKind::for_relationship(relationship.cardinality),
            label: relationship.label().to_string(),
            current_value,
            is_attribute: false,
            is_relationship: true,
            relationship_cardinality: Some(relationship.cardinality),
            options,
            disabled: relation.is_some_and(|r| r.is_protected),
            config: FieldConfig {
                required: !relationship.optional,
                ..FieldConfig::default()
            },
            metadata,
        }
    }

    fn metadata_fields(
        &self,
        field: &str,
        prefix: &str,
        state: &RelationMetadata,
        peer_options: &PeerOptions,
    ) -> Vec<MetadataDescriptor> {
        MetadataField::ALL
            .into_iter()
            .map(|slot| {
                let input = match slot {
                    MetadataField::IsVisible => MetadataInput::Toggle(state.is_visible),
                    MetadataField::IsProtected => MetadataInput::Toggle(state.is_protected),
                    MetadataField::Source => MetadataInput::Reference(self.reference_selector(
                        DATA_SOURCE_KIND,
                        state.source.as_ref(),
                        peer_options,
                    )),
                    MetadataField::Owner => MetadataInput::Reference(self.reference_selector(
                        DATA_OWNER_KIND,
                        state.owner.as_ref(),
                        peer_options,
                    )),
                };
                MetadataDescriptor {
                    input_name: format!("{field}.{prefix}{}", slot.key()),
                    field: slot,
                    label: slot.label(),
                    input,
                }
            })
            .collect()
    }

    fn reference_selector(&self, generic: &str, current: Option<&Ref>, peer_options: &PeerOptions) -> ReferenceSelector {
        let nodes = self.registry.nodes_inheriting(generic);
        let kinds = nodes.iter().map(|n| {
            let label = n.label.as_deref().unwrap_or(&n.kind);
            (n.kind.as_str(), label)
        });
        let mut selector = ReferenceSelector::new(generic, kinds);
        for node in &nodes {
            selector = selector.with_instances(&node.kind, peer_options.get(&node.kind).unwrap_or_default());
        }
        selector.with_current(current)
    }
}

/// Builds form descriptors with the default field policy.
pub fn build_form_fields(
    registry: &SchemaRegistry,
    schema: SchemaRef<'_>,
    mode: FormMode,
    existing: Option<&ObjectSnapshot>,
    peer_options: &PeerOptions,
) -> Vec<FieldDescriptor> {
    FormBuilder::new(registry).build(schema, mode, existing, peer_options)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::builder::{GenericSchemaBuilder, NodeSchemaBuilder, SnapshotBuilder};
    use crate::model::{AttributeKind, RelationshipKind};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_parts(
            vec![
                NodeSchemaBuilder::new("account", "Account")
                    .label("Account")
                    .inherits(DATA_OWNER_KIND)
                    .inherits(DATA_SOURCE_KIND)
                    .build(),
                NodeSchemaBuilder::new("team", "Team").inherits(DATA_OWNER_KIND).build(),
                NodeSchemaBuilder::new("site", "Site").build(),
                NodeSchemaBuilder::new("tag", "Tag").build(),
                NodeSchemaBuilder::new("device", "Device")
                    .attribute("name", AttributeKind::Text, |a| a.length(Some(1), Some(64)))
                    .attribute("role", AttributeKind::Text, |a| a.optional().choices(["edge", "core"]))
                    .attribute("speed", AttributeKind::Integer, |a| a.default_value(1000))
                    .attribute("serial", AttributeKind::Text, |a| a.optional().read_only())
                    .relationship("site", "Site", Cardinality::One, |r| r.kind(RelationshipKind::Attribute))
                    .relationship("maintainer", DATA_OWNER_KIND, Cardinality::One, |r| r)
                    .relationship("rack", "Rack", Cardinality::One, |r| r)
                    .relationship("tags", "Tag", Cardinality::Many, |r| r.kind(RelationshipKind::Attribute))
                    .build(),
            ],
            vec![
                GenericSchemaBuilder::new(DATA_OWNER_KIND).build(),
                GenericSchemaBuilder::new(DATA_SOURCE_KIND).build(),
            ],
        )
        .unwrap()
    }

    fn peer_options() -> PeerOptions {
        PeerOptions::new()
            .with("Site", [Ref::new("s1", "Site").with_label("Paris")])
            .with("Account", [Ref::new("a1", "Account")])
            .with("Team", [Ref::new("t1", "Team"), Ref::new("t2", "Team")])
            .with("Tag", [Ref::new("g1", "Tag"), Ref::new("g2", "Tag")])
    }

    fn by_name<'f>(fields: &'f [FieldDescriptor], name: &str) -> &'f FieldDescriptor {
        fields.iter().find(|f| f.field_name == name).unwrap()
    }

    #[test]
    fn test_create_form() {
        let registry = registry();
        let schema = registry.resolve("Device").unwrap();
        let fields = build_form_fields(&registry, schema, FormMode::Create, None, &peer_options());

        let names: Vec<_> = fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["name", "role", "speed", "serial", "site", "maintainer", "rack", "tags"]);

        let name = by_name(&fields, "name");
        assert_eq!(name.input_name, "name.value");
        assert_eq!(name.input_kind, InputKind::Text);
        assert!(name.config.required);
        assert_eq!(name.config.max_length, Some(64));
        assert!(name.metadata.is_empty());

        let role = by_name(&fields, "role");
        assert_eq!(role.input_kind, InputKind::Select);
        assert_eq!(role.options.len(), 2);

        assert_eq!(by_name(&fields, "speed").current_value, FieldValue::Value(json!(1000)));
        assert!(by_name(&fields, "serial").disabled);

        let site = by_name(&fields, "site");
        assert_eq!(site.input_name, "site.id");
        assert_eq!(site.options[0].label, "Paris");
        assert_eq!(site.current_value, FieldValue::Empty);

        let tags = by_name(&fields, "tags");
        assert_eq!(tags.input_name, "tags.list");
        assert_eq!(tags.input_kind, InputKind::MultiSelect);
        assert_eq!(tags.current_value, FieldValue::Ids(Vec::new()));
    }

    #[test]
    fn test_generic_peer_and_unresolved_peer() {
        let registry = registry();
        let schema = registry.resolve("Device").unwrap();
        let fields = build_form_fields(&registry, schema, FormMode::Create, None, &peer_options());

        assert_eq!(by_name(&fields, "maintainer").option_values(), vec!["a1", "t1", "t2"]);

        // Still emitted, with no options
        let rack = by_name(&fields, "rack");
        assert!(rack.options.is_empty());
        assert_eq!(rack.input_kind, InputKind::Select);
    }

    #[test]
    fn test_edit_form() {
        let registry = registry();
        let schema = registry.resolve("Device").unwrap();
        let snapshot = SnapshotBuilder::new("123", "Device")
            .value_with(
                "name",
                "sw1",
                RelationMetadata {
                    is_protected: true,
                    owner: Some(Ref::new("t2", "Team")),
                    ..RelationMetadata::default()
                },
            )
            .value("speed", json!(null))
            .peer("site", Some(Ref::new("s1", "Site")))
            .peers("tags", [Ref::new("g2", "Tag")])
            .build();

        let fields = build_form_fields(&registry, schema, FormMode::Edit, Some(&snapshot), &peer_options());

        let name = by_name(&fields, "name");
        assert_eq!(name.current_value, FieldValue::Value(json!("sw1")));
        assert!(name.disabled);
        let keys: Vec<_> = name.metadata.iter().map(|m| m.input_name.as_str()).collect();
        assert_eq!(keys, vec!["name.is_visible", "name.is_protected", "name.source", "name.owner"]);
        assert_eq!(
            name.metadata_field(MetadataField::IsProtected).unwrap().input,
            MetadataInput::Toggle(true)
        );
        match &name.metadata_field(MetadataField::Owner).unwrap().input {
            MetadataInput::Reference(selector) => assert_eq!(selector.selected_id(), Some("t2")),
            other => panic!("Expected reference selector, got {other:?}"),
        }

        // Edit mode ignores schema defaults
        assert_eq!(by_name(&fields, "speed").current_value, FieldValue::Empty);

        let site = by_name(&fields, "site");
        assert_eq!(site.current_value, FieldValue::Id("s1".to_string()));
        assert_eq!(site.metadata[3].input_name, "site._relation__owner");

        let tags = by_name(&fields, "tags");
        assert_eq!(tags.current_value, FieldValue::Ids(vec!["g2".to_string()]));
        assert!(tags.metadata.is_empty());
    }

    #[test]
    fn test_source_owner_type_restriction() {
        let registry = registry();
        let schema = registry.resolve("Device").unwrap();
        let snapshot = SnapshotBuilder::new("123", "Device").value("name", "sw1").build();
        let fields = build_form_fields(&registry, schema, FormMode::Edit, Some(&snapshot), &peer_options());

        let name = by_name(&fields, "name");
        let selector = |field| match &name.metadata_field(field).unwrap().input {
            MetadataInput::Reference(selector) => selector.clone(),
            other => panic!("Expected reference selector, got {other:?}"),
        };

        let owner = selector(MetadataField::Owner);
        let kinds: Vec<_> = owner.type_options().iter().filter_map(|o| o.value_str()).collect();
        assert_eq!(kinds, vec!["Account", "Team"]);

        let source = selector(MetadataField::Source);
        let kinds: Vec<_> = source.type_options().iter().filter_map(|o| o.value_str()).collect();
        assert_eq!(kinds, vec!["Account"]);
    }

    #[test]
    fn test_peer_kinds() {
        let registry = registry();
        let schema = registry.resolve("Device").unwrap();
        let builder = FormBuilder::new(&registry);

        assert_eq!(builder.peer_kinds(schema, FormMode::Create), vec!["Site", "Account", "Team", "Tag"]);
        assert_eq!(builder.peer_kinds(schema, FormMode::Edit), vec!["Site", "Account", "Team", "Tag"]);
    }
}
