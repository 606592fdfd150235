//! Builder API for ergonomic schema and snapshot construction.
//!
//! Provides a fluent interface for assembling schemas without hand-writing
//! JSON payloads, and snapshots without a server round trip.
//!
//! # Example
//!
//! ```rust
//! use schemaform::model::builder::NodeSchemaBuilder;
//! use schemaform::model::{AttributeKind, Cardinality, RelationshipKind};
//!
//! let device = NodeSchemaBuilder::new("device", "Device")
//!     .attribute("name", AttributeKind::Text, |a| a.unique())
//!     .attribute("description", AttributeKind::TextArea, |a| a.optional())
//!     .relationship("site", "Site", Cardinality::One, |r| r
//!         .kind(RelationshipKind::Attribute)
//!         .required()
//!     )
//!     .build();
//!
//! assert_eq!(device.attributes.len(), 2);
//! ```

use serde_json::Value;

use crate::model::{
    AttributeDef, AttributeKind, AttributeValue, Cardinality, GenericSchema, NodeSchema,
    ObjectSnapshot, Ref, RelationMetadata, RelationshipDef, RelationshipKind, RelationshipValue,
};

/// Builder for a [`NodeSchema`].
#[derive(Debug, Clone)]
pub struct NodeSchemaBuilder {
    schema: NodeSchema,
}

impl NodeSchemaBuilder {
    /// Creates a builder for a node with the given name and kind.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            schema: NodeSchema::new(name, kind),
        }
    }

    /// Sets the display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.schema.label = Some(label.into());
        self
    }

    /// Sets the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.schema.namespace = Some(namespace.into());
        self
    }

    /// Adds a generic kind to `inherit_from`.
    pub fn inherits(mut self, generic: impl Into<String>) -> Self {
        self.schema.inherit_from.push(generic.into());
        self
    }

    // =========================================================================
    // Fields
    // =========================================================================

    /// Adds an attribute configured by a builder function.
    pub fn attribute<F>(mut self, name: impl Into<String>, kind: impl Into<AttributeKind>, f: F) -> Self
    where
        F: FnOnce(AttributeBuilder) -> AttributeBuilder,
    {
        let builder = f(AttributeBuilder::new(name, kind));
        self.schema.attributes.push(builder.def);
        self
    }

    /// Adds a relationship configured by a builder function.
    pub fn relationship<F>(
        mut self,
        name: impl Into<String>,
        peer: impl Into<String>,
        cardinality: Cardinality,
        f: F,
    ) -> Self
    where
        F: FnOnce(RelationshipBuilder) -> RelationshipBuilder,
    {
        let builder = f(RelationshipBuilder::new(name, peer, cardinality));
        self.schema.relationships.push(builder.def);
        self
    }

    /// Builds the schema.
    pub fn build(self) -> NodeSchema {
        self.schema
    }
}

/// Builder for a [`GenericSchema`].
#[derive(Debug, Clone)]
pub struct GenericSchemaBuilder {
    schema: GenericSchema,
}

impl GenericSchemaBuilder {
    /// Creates a builder for a generic with the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            schema: GenericSchema::new(kind),
        }
    }

    /// Sets the display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.schema.label = Some(label.into());
        self
    }

    /// Declares a node kind implementing this generic.
    pub fn used_by(mut self, kind: impl Into<String>) -> Self {
        self.schema.used_by.push(kind.into());
        self
    }

    /// Adds an attribute configured by a builder function.
    pub fn attribute<F>(mut self, name: impl Into<String>, kind: impl Into<AttributeKind>, f: F) -> Self
    where
        F: FnOnce(AttributeBuilder) -> AttributeBuilder,
    {
        self.schema.attributes.push(f(AttributeBuilder::new(name, kind)).def);
        self
    }

    /// Adds a relationship configured by a builder function.
    pub fn relationship<F>(
        mut self,
        name: impl Into<String>,
        peer: impl Into<String>,
        cardinality: Cardinality,
        f: F,
    ) -> Self
    where
        F: FnOnce(RelationshipBuilder) -> RelationshipBuilder,
    {
        self.schema
            .relationships
            .push(f(RelationshipBuilder::new(name, peer, cardinality)).def);
        self
    }

    /// Builds the generic.
    pub fn build(self) -> GenericSchema {
        self.schema
    }
}

/// Builder for an [`AttributeDef`].
#[derive(Debug, Clone)]
pub struct AttributeBuilder {
    def: AttributeDef,
}

impl AttributeBuilder {
    fn new(name: impl Into<String>, kind: impl Into<AttributeKind>) -> Self {
        Self {
            def: AttributeDef::new(name, kind),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.def.label = Some(label.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.def.optional = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.def.unique = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.def.read_only = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.def.default_value = Some(value.into());
        self
    }

    /// Restricts the attribute to the given choices.
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.def.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn regex(mut self, regex: impl Into<String>) -> Self {
        self.def.regex = Some(regex.into());
        self
    }

    pub fn length(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.def.min_length = min;
        self.def.max_length = max;
        self
    }

    pub fn order_weight(mut self, weight: u32) -> Self {
        self.def.order_weight = Some(weight);
        self
    }
}

/// Builder for a [`RelationshipDef`].
#[derive(Debug, Clone)]
pub struct RelationshipBuilder {
    def: RelationshipDef,
}

impl RelationshipBuilder {
    fn new(name: impl Into<String>, peer: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            def: RelationshipDef::new(name, peer, cardinality),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.def.label = Some(label.into());
        self
    }

    pub fn kind(mut self, kind: RelationshipKind) -> Self {
        self.def.kind = kind;
        self
    }

    /// Marks the relationship as mandatory.
    pub fn required(mut self) -> Self {
        self.def.optional = false;
        self
    }

    pub fn order_weight(mut self, weight: u32) -> Self {
        self.def.order_weight = Some(weight);
        self
    }
}

/// Builder for an [`ObjectSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: ObjectSnapshot,
}

impl SnapshotBuilder {
    /// Creates a builder for the object with the given id and kind.
    pub fn new(id: impl Into<String>, typename: impl Into<String>) -> Self {
        Self {
            snapshot: ObjectSnapshot::new(id, typename),
        }
    }

    pub fn display_label(mut self, label: impl Into<String>) -> Self {
        self.snapshot.display_label = label.into();
        self
    }

    /// Sets an attribute value with default metadata.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.snapshot
            .attributes
            .insert(name.into(), AttributeValue::new(value));
        self
    }

    /// Sets an attribute value with explicit metadata.
    pub fn value_with(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        metadata: RelationMetadata,
    ) -> Self {
        self.snapshot.attributes.insert(
            name.into(),
            AttributeValue {
                value: value.into(),
                metadata,
            },
        );
        self
    }

    /// Sets a cardinality-one relationship; `None` records an empty link.
    pub fn peer(mut self, name: impl Into<String>, peer: Option<Ref>) -> Self {
        self.snapshot
            .relationships
            .insert(name.into(), RelationshipValue::One(peer));
        self
    }

    /// Sets a cardinality-many relationship.
    pub fn peers(mut self, name: impl Into<String>, peers: impl IntoIterator<Item = Ref>) -> Self {
        self.snapshot.relationships.insert(
            name.into(),
            RelationshipValue::Many(peers.into_iter().collect()),
        );
        self
    }

    /// Builds the snapshot.
    pub fn build(self) -> ObjectSnapshot {
        self.snapshot
    }
}
