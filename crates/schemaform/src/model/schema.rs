//! Schema definitions: node types, generics, attributes and relationships.
//!
//! These mirror the schema payload served per (branch, time) context. They are
//! plain data; lookups across schemas live in [`crate::registry`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::limits::UNWEIGHTED;

/// Primitive type tag of an attribute.
///
/// Unknown tags are preserved in [`AttributeKind::Other`] so that a newer
/// server can add kinds without breaking ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeKind {
    Text,
    String,
    TextArea,
    Number,
    Integer,
    Boolean,
    DateTime,
    Password,
    HashedPassword,
    Email,
    Url,
    File,
    Json,
    List,
    Dropdown,
    Any,
    Other(String),
}

impl AttributeKind {
    /// Returns the tag as it appears in the schema payload.
    pub fn as_str(&self) -> &str {
        match self {
            AttributeKind::Text => "Text",
            AttributeKind::String => "String",
            AttributeKind::TextArea => "TextArea",
            AttributeKind::Number => "Number",
            AttributeKind::Integer => "Integer",
            AttributeKind::Boolean => "Boolean",
            AttributeKind::DateTime => "DateTime",
            AttributeKind::Password => "Password",
            AttributeKind::HashedPassword => "HashedPassword",
            AttributeKind::Email => "Email",
            AttributeKind::Url => "URL",
            AttributeKind::File => "File",
            AttributeKind::Json => "JSON",
            AttributeKind::List => "List",
            AttributeKind::Dropdown => "Dropdown",
            AttributeKind::Any => "Any",
            AttributeKind::Other(tag) => tag,
        }
    }

    /// Returns true for kinds whose values are free text.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            AttributeKind::Text
                | AttributeKind::String
                | AttributeKind::TextArea
                | AttributeKind::Password
                | AttributeKind::HashedPassword
                | AttributeKind::Email
                | AttributeKind::Url
                | AttributeKind::File
                | AttributeKind::DateTime
                | AttributeKind::Dropdown
        )
    }

    /// Returns true for kinds whose values are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, AttributeKind::Number | AttributeKind::Integer)
    }
}

impl From<String> for AttributeKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "Text" => AttributeKind::Text,
            "String" => AttributeKind::String,
            "TextArea" => AttributeKind::TextArea,
            "Number" => AttributeKind::Number,
            "Integer" => AttributeKind::Integer,
            "Boolean" => AttributeKind::Boolean,
            "DateTime" => AttributeKind::DateTime,
            "Password" => AttributeKind::Password,
            "HashedPassword" => AttributeKind::HashedPassword,
            "Email" => AttributeKind::Email,
            "URL" => AttributeKind::Url,
            "File" => AttributeKind::File,
            "JSON" => AttributeKind::Json,
            "List" => AttributeKind::List,
            "Dropdown" => AttributeKind::Dropdown,
            "Any" => AttributeKind::Any,
            _ => AttributeKind::Other(tag),
        }
    }
}

impl From<&str> for AttributeKind {
    fn from(tag: &str) -> Self {
        AttributeKind::from(tag.to_string())
    }
}

impl From<AttributeKind> for String {
    fn from(kind: AttributeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Tag governing how a relationship is displayed and queried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipKind {
    Generic,
    Attribute,
    Component,
    Parent,
    Group,
    Hierarchy,
    Profile,
    Other(String),
}

impl RelationshipKind {
    /// Returns the tag as it appears in the schema payload.
    pub fn as_str(&self) -> &str {
        match self {
            RelationshipKind::Generic => "Generic",
            RelationshipKind::Attribute => "Attribute",
            RelationshipKind::Component => "Component",
            RelationshipKind::Parent => "Parent",
            RelationshipKind::Group => "Group",
            RelationshipKind::Hierarchy => "Hierarchy",
            RelationshipKind::Profile => "Profile",
            RelationshipKind::Other(tag) => tag,
        }
    }
}

impl Default for RelationshipKind {
    fn default() -> Self {
        Self::Generic
    }
}

impl From<String> for RelationshipKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "Generic" => RelationshipKind::Generic,
            "Attribute" => RelationshipKind::Attribute,
            "Component" => RelationshipKind::Component,
            "Parent" => RelationshipKind::Parent,
            "Group" => RelationshipKind::Group,
            "Hierarchy" => RelationshipKind::Hierarchy,
            "Profile" => RelationshipKind::Profile,
            _ => RelationshipKind::Other(tag),
        }
    }
}

impl From<RelationshipKind> for String {
    fn from(kind: RelationshipKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Whether a relationship links to one peer or to a collection of peers.
///
/// Fixed for the lifetime of a schema; changing it is a schema migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    #[default]
    Many,
}

/// An attribute declared on a node or generic schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub kind: AttributeKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
    /// Allowed values; a non-empty list turns the input into a select.
    #[serde(default, rename = "enum")]
    pub choices: Vec<Value>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub inherited: bool,
    #[serde(default)]
    pub order_weight: Option<u32>,
}

impl AttributeDef {
    /// Creates a required attribute with no label or default.
    pub fn new(name: impl Into<String>, kind: impl Into<AttributeKind>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            label: None,
            description: None,
            optional: false,
            unique: false,
            default_value: None,
            choices: Vec::new(),
            regex: None,
            min_length: None,
            max_length: None,
            read_only: false,
            inherited: false,
            order_weight: None,
        }
    }

    /// Returns the display label, falling back to the name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Returns true if a create form must supply a value.
    pub fn is_mandatory(&self) -> bool {
        !self.optional && self.default_value.is_none()
    }

    pub(crate) fn sort_weight(&self) -> u32 {
        self.order_weight.unwrap_or(UNWEIGHTED)
    }
}

/// A relationship declared on a node or generic schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDef {
    pub name: String,
    /// Peer kind; may name a node or a generic.
    pub peer: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub kind: RelationshipKind,
    #[serde(default = "default_true")]
    pub optional: bool,
    #[serde(default)]
    pub inherited: bool,
    #[serde(default)]
    pub order_weight: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl RelationshipDef {
    /// Creates an optional relationship of kind `Generic`.
    pub fn new(name: impl Into<String>, peer: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            peer: peer.into(),
            label: None,
            description: None,
            cardinality,
            kind: RelationshipKind::Generic,
            optional: true,
            inherited: false,
            order_weight: None,
        }
    }

    /// Returns the display label, falling back to the name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn sort_weight(&self) -> u32 {
        self.order_weight.unwrap_or(UNWEIGHTED)
    }
}

/// A concrete object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSchema {
    /// Internal identifier.
    pub name: String,
    /// Public type name; the key used by queries, mutations and `__typename`.
    pub kind: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub default_filter: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,
    #[serde(default)]
    pub inherit_from: Vec<String>,
}

impl NodeSchema {
    /// Creates an empty node schema.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            namespace: None,
            label: None,
            description: None,
            icon: None,
            default_filter: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
            inherit_from: Vec::new(),
        }
    }

    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Looks up a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Returns true if this schema lists `generic` in `inherit_from`.
    pub fn inherits(&self, generic: &str) -> bool {
        self.inherit_from.iter().any(|g| g == generic)
    }
}

/// An interface-like type implemented structurally by node schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericSchema {
    pub kind: String,
    /// Internal identifier; defaults to the kind when the payload omits it.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,
    /// Kinds of the node schemas implementing this generic.
    #[serde(default)]
    pub used_by: Vec<String>,
}

impl GenericSchema {
    /// Creates a generic with no fields and no implementers.
    pub fn new(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            name: kind.clone(),
            kind,
            label: None,
            description: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
            used_by: Vec::new(),
        }
    }
}

/// A resolved schema: either a concrete node or a generic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaRef<'a> {
    Node(&'a NodeSchema),
    Generic(&'a GenericSchema),
}

impl<'a> SchemaRef<'a> {
    /// Returns the public kind.
    pub fn kind(&self) -> &'a str {
        match self {
            SchemaRef::Node(node) => &node.kind,
            SchemaRef::Generic(generic) => &generic.kind,
        }
    }

    /// Returns the internal name.
    pub fn name(&self) -> &'a str {
        match self {
            SchemaRef::Node(node) => &node.name,
            SchemaRef::Generic(generic) => &generic.name,
        }
    }

    /// Returns the display label, falling back to the kind.
    pub fn label(&self) -> &'a str {
        let label = match self {
            SchemaRef::Node(node) => node.label.as_deref(),
            SchemaRef::Generic(generic) => generic.label.as_deref(),
        };
        label.unwrap_or_else(|| self.kind())
    }

    pub fn attributes(&self) -> &'a [AttributeDef] {
        match self {
            SchemaRef::Node(node) => &node.attributes,
            SchemaRef::Generic(generic) => &generic.attributes,
        }
    }

    pub fn relationships(&self) -> &'a [RelationshipDef] {
        match self {
            SchemaRef::Node(node) => &node.relationships,
            SchemaRef::Generic(generic) => &generic.relationships,
        }
    }

    /// Returns the node schema, if this is one.
    pub fn as_node(&self) -> Option<&'a NodeSchema> {
        match self {
            SchemaRef::Node(node) => Some(node),
            SchemaRef::Generic(_) => None,
        }
    }
}

impl<'a> From<&'a NodeSchema> for SchemaRef<'a> {
    fn from(node: &'a NodeSchema) -> Self {
        SchemaRef::Node(node)
    }
}

impl<'a> From<&'a GenericSchema> for SchemaRef<'a> {
    fn from(generic: &'a GenericSchema) -> Self {
        SchemaRef::Generic(generic)
    }
}

/// The schema payload for one (branch, time) context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRoot {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeSchema>,
    #[serde(default)]
    pub generics: Vec<GenericSchema>,
}
