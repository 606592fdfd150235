//! Named constants shared by the synthesizers.

/// Page size used when a collection query does not specify a limit.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Upper bound on a caller-supplied page size.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Generic kind implemented by every schema that can be a value's source.
pub const DATA_SOURCE_KIND: &str = "DataSource";

/// Generic kind implemented by every schema that can own a value.
pub const DATA_OWNER_KIND: &str = "DataOwner";

/// Wire text of the document returned when no schema is available yet.
pub const PLACEHOLDER_DOCUMENT: &str = "query { ok }";

/// Prefix the server uses for relation metadata on inline peers.
pub const RELATION_PREFIX: &str = "_relation__";

/// Sort weight given to attributes and relationships that carry none.
pub const UNWEIGHTED: u32 = u32::MAX;
