//! Query and mutation synthesis.
//!
//! Documents are built as a structured tree ([`ast`]) and rendered to wire
//! text at the boundary ([`render`]). Branch and time travel alongside a
//! document as an [`ExecutionContext`], never inside it.

pub mod ast;
pub mod context;
pub mod peers;
pub mod read;
pub mod render;
pub mod write;

pub use ast::{is_valid_name, ArgValue, Argument, Document, Operation, Selection};
pub use context::{load_snapshot, ExecutionContext, Transport};
pub use peers::{build_edit_query, build_peer_options_query, PeerOptions, EDIT_OBJECT_KEY};
pub use read::{build_read_query, FieldSelection, Page, QueryOptions, ReadMode, ReadParams, ReadQuery};
pub use render::{render_pretty, Writer};
pub use write::{
    build_create_mutation, build_delete_mutation, build_update_mutation, mutation_name, MutationKind,
    MutationResult,
};
