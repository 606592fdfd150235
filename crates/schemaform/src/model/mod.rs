//! Data model types.
//!
//! This module contains the plain data the engine works on:
//! - Schemas (nodes, generics, attributes, relationships)
//! - Values (JSON attribute values and their shape checks)
//! - Snapshots (the last-fetched state of an object)
//! - Submissions (what a form sends back)
//! - Change sets (what a mutation must carry)
//! - Builders (ergonomic construction)

pub mod builder;
pub mod changeset;
pub mod schema;
pub mod snapshot;
pub mod submission;
pub mod value;

pub use builder::{GenericSchemaBuilder, NodeSchemaBuilder, SnapshotBuilder};
pub use changeset::{AttributePatch, ChangeSet, FieldChange, FieldPatch, ManyPatch, MetadataPatch, OnePatch};
pub use schema::{
    AttributeDef, AttributeKind, Cardinality, GenericSchema, NodeSchema, RelationshipDef,
    RelationshipKind, SchemaRef, SchemaRoot,
};
pub use snapshot::{AttributeValue, ObjectSnapshot, Ref, RelationMetadata, RelationshipValue};
pub use submission::{FieldInput, Submission};
pub use value::{check_shape, is_empty_value, values_equal};
