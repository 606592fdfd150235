//! Execution context and the transport seam.
//!
//! Branch and point-in-time never appear in a document body. They travel
//! next to it as an [`ExecutionContext`], which the transport turns into the
//! endpoint path.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{ContextError, FetchError};
use crate::model::{ObjectSnapshot, SchemaRef};
use crate::query::ast::Document;
use crate::query::read::{build_read_query, FieldSelection, ReadParams};

/// The (branch, time) coordinate a document is executed against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionContext {
    branch: String,
    at: Option<DateTime<Utc>>,
}

impl ExecutionContext {
    /// Creates a context, parsing `at` as an RFC 3339 / ISO-8601 timestamp.
    pub fn new(branch: impl Into<String>, at: Option<&str>) -> Result<Self, ContextError> {
        let at = at
            .map(|value| {
                DateTime::parse_from_rfc3339(value)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| ContextError::InvalidTimestamp {
                        value: value.to_string(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;
        Self::with_time(branch, at)
    }

    /// Creates a context from an already parsed timestamp.
    pub fn with_time(branch: impl Into<String>, at: Option<DateTime<Utc>>) -> Result<Self, ContextError> {
        let branch = branch.into();
        if branch.is_empty() {
            return Err(ContextError::EmptyBranch);
        }
        if branch.chars().any(|c| c.is_whitespace() || c.is_control() || c == '?' || c == '#') {
            return Err(ContextError::InvalidBranch(branch));
        }
        Ok(Self { branch, at })
    }

    /// Creates a context for the head of a branch.
    pub fn branch(branch: impl Into<String>) -> Result<Self, ContextError> {
        Self::with_time(branch, None)
    }

    pub fn branch_name(&self) -> &str {
        &self.branch
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        self.at
    }

    /// Returns true for historical contexts. Writes against them must not be sent.
    pub fn is_read_only(&self) -> bool {
        self.at.is_some()
    }

    /// Returns `/graphql/{branch}`, with `?at=<UTC, millisecond precision>` when set.
    ///
    /// `/` and `%` in the branch name are percent-encoded so the name stays
    /// one path segment.
    pub fn endpoint_path(&self) -> String {
        let branch = encode_segment(&self.branch);
        match self.at {
            Some(at) => format!(
                "/graphql/{}?at={}",
                branch,
                at.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            None => format!("/graphql/{branch}"),
        }
    }
}

fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            '/' => encoded.push_str("%2F"),
            c => encoded.push(c),
        }
    }
    encoded
}

/// Executes documents against a server.
///
/// Implementations own retries, timeouts and cancellation; the engine only
/// consumes the parsed JSON they return.
pub trait Transport {
    type Error: std::error::Error + 'static;

    fn execute(&self, document: &Document, context: &ExecutionContext) -> Result<Value, Self::Error>;
}

/// Reads one object through a transport and decodes it into a snapshot.
///
/// Returns `Ok(None)` if the server knows no object with that id.
pub fn load_snapshot<T: Transport>(
    transport: &T,
    schema: SchemaRef<'_>,
    id: &str,
    context: &ExecutionContext,
) -> Result<Option<ObjectSnapshot>, FetchError<T::Error>> {
    let fields = FieldSelection::for_form(schema);
    let params = ReadParams::single(id, context.clone());
    let query = build_read_query(Some(schema), &fields, &params);

    let response = transport
        .execute(&query.document, &query.context)
        .map_err(FetchError::Transport)?;
    Ok(query.decode_single(schema, &response)?)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fmt;

    use serde_json::json;

    use super::*;
    use crate::error::ResponseError;
    use crate::model::builder::NodeSchemaBuilder;
    use crate::model::AttributeKind;

    #[test]
    fn test_endpoint_path() {
        let head = ExecutionContext::new("main", None).unwrap();
        assert_eq!(head.endpoint_path(), "/graphql/main");
        assert!(!head.is_read_only());

        let past = ExecutionContext::new("main", Some("2024-01-15T12:30:00+02:00")).unwrap();
        assert_eq!(past.endpoint_path(), "/graphql/main?at=2024-01-15T10:30:00.000Z");
        assert!(past.is_read_only());
    }

    #[test]
    fn test_branch_stays_one_segment() {
        let feature = ExecutionContext::branch("feature/x").unwrap();
        assert_eq!(feature.branch_name(), "feature/x");
        assert_eq!(feature.endpoint_path(), "/graphql/feature%2Fx");

        let odd = ExecutionContext::branch("50%/done").unwrap();
        assert_eq!(odd.endpoint_path(), "/graphql/50%25%2Fdone");
    }

    #[test]
    fn test_context_errors() {
        assert_eq!(ExecutionContext::branch(""), Err(ContextError::EmptyBranch));
        assert_eq!(
            ExecutionContext::branch("main branch"),
            Err(ContextError::InvalidBranch("main branch".to_string()))
        );
        assert!(matches!(
            ExecutionContext::new("main", Some("yesterday")),
            Err(ContextError::InvalidTimestamp { .. })
        ));
    }

    #[derive(Debug)]
    struct Offline;

    impl fmt::Display for Offline {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("offline")
        }
    }

    impl std::error::Error for Offline {}

    struct Canned {
        response: Option<Value>,
        seen: RefCell<Vec<String>>,
    }

    impl Transport for Canned {
        type Error = Offline;

        fn execute(&self, document: &Document, context: &ExecutionContext) -> Result<Value, Offline> {
            self.seen.borrow_mut().push(context.endpoint_path());
            self.seen.borrow_mut().push(document.to_string());
            self.response.clone().ok_or(Offline)
        }
    }

    #[test]
    fn test_load_snapshot() {
        let schema = NodeSchemaBuilder::new("device", "Device")
            .attribute("name", AttributeKind::Text, |a| a)
            .build();
        let context = ExecutionContext::branch("main").unwrap();

        let transport = Canned {
            response: Some(json!({"data": {"Device": {"edges": [
                {"node": {"id": "123", "display_label": "sw1", "name": {"value": "sw1"}}}
            ]}}})),
            seen: RefCell::new(Vec::new()),
        };
        let snapshot = load_snapshot(&transport, SchemaRef::Node(&schema), "123", &context)
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.attribute("name").unwrap().value, json!("sw1"));
        assert_eq!(transport.seen.borrow()[0], "/graphql/main");

        let empty = Canned {
            response: Some(json!({"Device": {"edges": []}})),
            seen: RefCell::new(Vec::new()),
        };
        assert!(load_snapshot(&empty, SchemaRef::Node(&schema), "404", &context).unwrap().is_none());

        let offline = Canned {
            response: None,
            seen: RefCell::new(Vec::new()),
        };
        assert!(matches!(
            load_snapshot(&offline, SchemaRef::Node(&schema), "123", &context),
            Err(FetchError::Transport(Offline))
        ));

        let garbled = Canned {
            response: Some(json!({"Device": 3})),
            seen: RefCell::new(Vec::new()),
        };
        assert!(matches!(
            load_snapshot(&garbled, SchemaRef::Node(&schema), "123", &context),
            Err(FetchError::Response(ResponseError::UnexpectedShape { .. }))
        ));
    }
}
