//! Structured query documents.
//!
//! Synthesizers build a small tree of selections instead of splicing strings,
//! and [`crate::query::render`] turns the tree into wire text. Argument
//! values are typed, so strings are always quoted and escaped at render time.

use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Operation type of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Mutation,
}

impl Operation {
    pub fn keyword(self) -> &'static str {
        match self {
            Operation::Query => "query",
            Operation::Mutation => "mutation",
        }
    }
}

/// A complete query or mutation document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub operation: Operation,
    pub name: Option<String>,
    pub selections: Vec<Selection>,
}

impl Document {
    /// Creates an unnamed query.
    pub fn query(selections: Vec<Selection>) -> Self {
        Self {
            operation: Operation::Query,
            name: None,
            selections,
        }
    }

    /// Creates an unnamed mutation.
    pub fn mutation(selections: Vec<Selection>) -> Self {
        Self {
            operation: Operation::Mutation,
            name: None,
            selections,
        }
    }

    /// The document returned when no schema is available: `query { ok }`.
    pub fn placeholder() -> Self {
        Self::query(vec![Selection::field("ok")])
    }

    /// Returns true if this is the placeholder document.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }

    /// Sets the operation name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the top-level selection with the given response key.
    pub fn root(&self, key: &str) -> Option<&Selection> {
        self.selections.iter().find(|s| s.response_key() == key)
    }

    /// Returns a deterministic UUID derived from the rendered text.
    ///
    /// ```text
    /// hash = SHA-256(text)[0:16]
    /// hash[6] = (hash[6] & 0x0F) | 0x80  // version 8
    /// hash[8] = (hash[8] & 0x3F) | 0x80  // RFC 4122 variant
    /// ```
    pub fn fingerprint(&self) -> Uuid {
        let hash = Sha256::digest(self.to_string().as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);

        bytes[6] = (bytes[6] & 0x0F) | 0x80;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;

        Uuid::from_bytes(bytes)
    }
}

/// One field in a selection set, with optional arguments and sub-selections.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Response key replacing the field name, when set.
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<Argument>,
    pub selections: Vec<Selection>,
}

impl Selection {
    /// Creates a leaf field.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            selections: Vec::new(),
        }
    }

    /// Sets the response key.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns the key under which this field appears in a response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Creates a sequence of leaf fields.
    pub fn fields<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Self> {
        names.into_iter().map(Self::field).collect()
    }

    /// Adds an argument.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Appends one sub-selection.
    pub fn select(mut self, child: Selection) -> Self {
        self.selections.push(child);
        self
    }

    /// Appends several sub-selections.
    pub fn select_all(mut self, children: impl IntoIterator<Item = Selection>) -> Self {
        self.selections.extend(children);
        self
    }

    /// Returns the direct sub-selection with the given response key.
    pub fn child(&self, key: &str) -> Option<&Selection> {
        self.selections.iter().find(|s| s.response_key() == key)
    }

    /// Follows a dotted path of sub-selections: `"edges.node.name"`.
    pub fn path(&self, path: &str) -> Option<&Selection> {
        path.split('.').try_fold(self, |sel, name| sel.child(name))
    }

    /// Returns the value of an argument.
    pub fn argument(&self, name: &str) -> Option<&ArgValue> {
        self.arguments.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Returns true if this field has no sub-selections.
    pub fn is_leaf(&self) -> bool {
        self.selections.is_empty()
    }
}

/// A named argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ArgValue,
}

/// A typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<ArgValue>),
    /// Input object; field order is preserved as given.
    Object(Vec<(String, ArgValue)>),
}

impl ArgValue {
    /// Builds an input object from key/value pairs.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, ArgValue)>) -> Self {
        ArgValue::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns a field of an input object.
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        match self {
            ArgValue::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::Int(i64::from(v))
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::String(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::String(v)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ArgValue::Null, Into::into)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(items: Vec<T>) -> Self {
        ArgValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<&Value> for ArgValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => ArgValue::Null,
            Value::Bool(b) => ArgValue::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => ArgValue::Int(i),
                (None, Some(u)) => ArgValue::UInt(u),
                (None, None) => ArgValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => ArgValue::String(s.clone()),
            Value::Array(items) => ArgValue::List(items.iter().map(ArgValue::from).collect()),
            Value::Object(map) => ArgValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), ArgValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        ArgValue::from(&value)
    }
}

/// Returns true if `name` is a valid field or argument name (`[_A-Za-z][_0-9A-Za-z]*`).
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
