//! Schemaform: schema-driven query, mutation and form synthesis.
//!
//! Given a runtime catalogue of object schemas, this crate builds the read
//! queries a UI needs to list or show objects, the field descriptors of a
//! create or edit form, and the minimal mutation that carries a user's edits
//! back to the server. Nothing here performs I/O: documents are handed to a
//! [`Transport`] supplied by the caller.
//!
//! # Quick Start
//!
//! ```rust
//! use schemaform::{
//!     build_read_query, build_update_mutation, compute_change_set, ExecutionContext,
//!     FieldSelection, FormMode, ObjectSnapshot, ReadParams, SchemaRegistry, Submission,
//! };
//! use schemaform::model::SnapshotBuilder;
//!
//! let registry = SchemaRegistry::from_json(r#"{
//!     "nodes": [{
//!         "name": "device",
//!         "kind": "Device",
//!         "attributes": [{"name": "name", "kind": "Text"}]
//!     }]
//! }"#).unwrap();
//! let schema = registry.resolve("Device").unwrap();
//!
//! // Read one object on a branch
//! let context = ExecutionContext::branch("main").unwrap();
//! let query = build_read_query(
//!     Some(schema),
//!     &FieldSelection::for_form(schema),
//!     &ReadParams::single("123", context),
//! );
//! assert!(query.document.to_string().starts_with("query { Device(ids: [\"123\"])"));
//!
//! // Diff an edit against the fetched state
//! let original: ObjectSnapshot = SnapshotBuilder::new("123", "Device").value("name", "sw1").build();
//! let submitted = Submission::new().value("name", "sw2");
//! let changes = compute_change_set(schema, &submitted, Some(&original), FormMode::Edit);
//!
//! let mutation = build_update_mutation(schema, "123", &changes).unwrap();
//! assert_eq!(
//!     mutation.to_string(),
//!     "mutation { DeviceUpdate(data: {id: \"123\", name: {value: \"sw2\"}}) { ok object { id display_label __typename } } }"
//! );
//! ```
//!
//! # Modules
//!
//! - [`registry`]: Schema catalogue with lookup by kind or name
//! - [`classify`]: Which fields appear in list, detail, form and tab views
//! - [`query`]: Document tree, rendering, read/peer/mutation builders
//! - [`form`]: Field descriptors and the two-step reference selector
//! - [`diff`]: Minimal change sets between a submission and a snapshot
//! - [`validate`]: Field-keyed submission checks
//! - [`model`]: Schema, snapshot, submission and change-set types
//! - [`error`]: Error types
//! - [`limits`]: Defaults and well-known names

pub mod classify;
pub mod diff;
pub mod error;
pub mod form;
pub mod limits;
pub mod model;
pub mod query;
pub mod registry;
pub mod validate;

// Re-export commonly used types at crate root
pub use classify::{select_attributes, select_relationships, FieldPolicy, ViewContext, DEFAULT_POLICY};
pub use diff::{apply_change_set, compute_change_set};
pub use error::{ContextError, FetchError, ResponseError, SchemaError, SelectorError, ValidationError};
pub use form::{build_form_fields, FieldDescriptor, FormBuilder, FormMode, ReferenceSelector, SelectorState};
pub use model::{
    AttributeDef, AttributeKind, Cardinality, ChangeSet, FieldPatch, GenericSchema, NodeSchema, ObjectSnapshot, Ref,
    RelationshipDef, RelationshipKind, SchemaRef, Submission,
};
pub use query::{
    build_create_mutation, build_delete_mutation, build_edit_query, build_peer_options_query, build_read_query,
    build_update_mutation, load_snapshot, Document, ExecutionContext, FieldSelection, PeerOptions, ReadParams,
    ReadQuery, Transport,
};
pub use registry::SchemaRegistry;
pub use validate::validate_submission;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
