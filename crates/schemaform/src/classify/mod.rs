//! Field classification by view context.
//!
//! Decides which attributes and relationships of a schema appear in a list
//! view, a detail view, an edit form, or a relationship tab. The decision is
//! table-driven and total:
//!
//! - attributes use a deny-list per context, so an attribute kind the tables
//!   do not mention is included
//! - relationships use an allow-list per (context, cardinality), so a
//!   relationship kind the tables do not mention is excluded
//!
//! Selection preserves schema order.

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::{AttributeDef, AttributeKind, Cardinality, RelationshipDef, RelationshipKind, SchemaRef};

/// The view a field selection is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewContext {
    /// Table of many objects.
    List,
    /// Single-object page.
    Detail,
    /// Create/edit form.
    Form,
    /// Per-relationship tab on a detail page.
    Tab,
}

impl ViewContext {
    pub const ALL: [ViewContext; 4] = [
        ViewContext::List,
        ViewContext::Detail,
        ViewContext::Form,
        ViewContext::Tab,
    ];
}

/// Inclusion tables for the classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPolicy {
    attribute_deny: FxHashMap<ViewContext, Vec<AttributeKind>>,
    relationship_allow: FxHashMap<(ViewContext, Cardinality), Vec<RelationshipKind>>,
}

lazy_static! {
    /// The policy used by [`select_attributes`] and [`select_relationships`].
    pub static ref DEFAULT_POLICY: FieldPolicy = FieldPolicy::standard();
}

impl FieldPolicy {
    /// Creates a policy that includes every attribute and no relationship.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard tables.
    pub fn standard() -> Self {
        use AttributeKind as A;
        use Cardinality::{Many, One};
        use RelationshipKind as R;
        use ViewContext::{Detail, Form, List, Tab};

        Self::new()
            .deny_attributes(
                List,
                [A::TextArea, A::Password, A::HashedPassword, A::Any, A::Json, A::List, A::File],
            )
            .deny_attributes(Detail, [A::Password, A::HashedPassword])
            .deny_attributes(Tab, [A::Password, A::HashedPassword])
            .allow_relationships(List, One, [R::Attribute, R::Parent])
            .allow_relationships(List, Many, [R::Attribute])
            .allow_relationships(Detail, One, [R::Generic, R::Attribute, R::Parent, R::Component])
            .allow_relationships(Detail, Many, [R::Attribute])
            .allow_relationships(Tab, Many, [R::Generic, R::Component])
            .allow_relationships(Form, One, [R::Generic, R::Attribute, R::Parent, R::Component])
            .allow_relationships(Form, Many, [R::Attribute])
    }

    /// Hides the given attribute kinds in a context.
    pub fn deny_attributes(
        mut self,
        context: ViewContext,
        kinds: impl IntoIterator<Item = AttributeKind>,
    ) -> Self {
        self.attribute_deny.entry(context).or_default().extend(kinds);
        self
    }

    /// Shows the given relationship kinds of one cardinality in a context.
    pub fn allow_relationships(
        mut self,
        context: ViewContext,
        cardinality: Cardinality,
        kinds: impl IntoIterator<Item = RelationshipKind>,
    ) -> Self {
        self.relationship_allow
            .entry((context, cardinality))
            .or_default()
            .extend(kinds);
        self
    }

    pub fn includes_attribute(&self, attribute: &AttributeDef, context: ViewContext) -> bool {
        self.attribute_deny
            .get(&context)
            .is_none_or(|denied| !denied.contains(&attribute.kind))
    }

    pub fn includes_relationship(&self, relationship: &RelationshipDef, context: ViewContext) -> bool {
        self.relationship_allow
            .get(&(context, relationship.cardinality))
            .is_some_and(|allowed| allowed.contains(&relationship.kind))
    }

    /// Returns the attributes shown in `context`, in schema order.
    pub fn select_attributes<'a>(&self, schema: SchemaRef<'a>, context: ViewContext) -> Vec<&'a AttributeDef> {
        schema
            .attributes()
            .iter()
            .filter(|a| self.includes_attribute(a, context))
            .collect()
    }

    /// Returns the relationships shown in `context`, in schema order.
    pub fn select_relationships<'a>(
        &self,
        schema: SchemaRef<'a>,
        context: ViewContext,
    ) -> Vec<&'a RelationshipDef> {
        schema
            .relationships()
            .iter()
            .filter(|r| self.includes_relationship(r, context))
            .collect()
    }
}

/// Selects attributes with [`DEFAULT_POLICY`].
pub fn select_attributes<'a>(schema: SchemaRef<'a>, context: ViewContext) -> Vec<&'a AttributeDef> {
    DEFAULT_POLICY.select_attributes(schema, context)
}

/// Selects relationships with [`DEFAULT_POLICY`].
pub fn select_relationships<'a>(schema: SchemaRef<'a>, context: ViewContext) -> Vec<&'a RelationshipDef> {
    DEFAULT_POLICY.select_relationships(schema, context)
}

/// Returns the distinct peer kinds a form for `schema` needs options for.
pub fn peer_kinds_for_form<'a>(policy: &FieldPolicy, schema: SchemaRef<'a>) -> Vec<&'a str> {
    let mut kinds: Vec<&str> = Vec::new();
    for relationship in policy.select_relationships(schema, ViewContext::Form) {
        if !kinds.contains(&relationship.peer.as_str()) {
            kinds.push(&relationship.peer);
        }
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builder::NodeSchemaBuilder;
    use crate::model::NodeSchema;

    fn device() -> NodeSchema {
        NodeSchemaBuilder::new("device", "Device")
            .attribute("name", AttributeKind::Text, |a| a)
            .attribute("description", AttributeKind::TextArea, |a| a.optional())
            .attribute("secret", AttributeKind::Password, |a| a.optional())
            .attribute("address", "IPHost", |a| a.optional())
            .relationship("site", "Site", Cardinality::One, |r| r.kind(RelationshipKind::Attribute))
            .relationship("owner", "DataOwner", Cardinality::One, |r| r)
            .relationship("tags", "Tag", Cardinality::Many, |r| r.kind(RelationshipKind::Attribute))
            .relationship("interfaces", "Interface", Cardinality::Many, |r| r.kind(RelationshipKind::Component))
            .relationship("members", "Member", Cardinality::Many, |r| r.kind("Custom".to_string().into()))
            .build()
    }

    fn names<T, F: Fn(&T) -> &str>(items: &[&T], f: F) -> Vec<String> {
        items.iter().map(|i| f(*i).to_string()).collect()
    }

    #[test]
    fn test_select_attributes() {
        let schema = device();
        let schema = SchemaRef::Node(&schema);

        let list = select_attributes(schema, ViewContext::List);
        assert_eq!(names(&list, |a| a.name.as_str()), vec!["name", "address"]);

        let detail = select_attributes(schema, ViewContext::Detail);
        assert_eq!(names(&detail, |a| a.name.as_str()), vec!["name", "description", "address"]);

        // Forms show every attribute, including unknown kinds
        let form = select_attributes(schema, ViewContext::Form);
        assert_eq!(form.len(), 4);
    }

    #[test]
    fn test_select_relationships() {
        let schema = device();
        let schema = SchemaRef::Node(&schema);

        let list = select_relationships(schema, ViewContext::List);
        assert_eq!(names(&list, |r| r.name.as_str()), vec!["site", "tags"]);

        let form = select_relationships(schema, ViewContext::Form);
        assert_eq!(names(&form, |r| r.name.as_str()), vec!["site", "owner", "tags"]);

        let tab = select_relationships(schema, ViewContext::Tab);
        assert_eq!(names(&tab, |r| r.name.as_str()), vec!["interfaces"]);

        // Unknown relationship kinds are never selected
        for context in ViewContext::ALL {
            assert!(select_relationships(schema, context).iter().all(|r| r.name != "members"));
        }
    }

    #[test]
    fn test_custom_policy() {
        let schema = device();
        let policy = FieldPolicy::new()
            .deny_attributes(ViewContext::Form, [AttributeKind::Password])
            .allow_relationships(ViewContext::Form, Cardinality::Many, [RelationshipKind::Component]);

        let form = policy.select_attributes(SchemaRef::Node(&schema), ViewContext::Form);
        assert!(form.iter().all(|a| a.name != "secret"));

        let peers = peer_kinds_for_form(&policy, SchemaRef::Node(&schema));
        assert_eq!(peers, vec!["Interface"]);
    }

    #[test]
    fn test_peer_kinds_for_form_dedup() {
        let schema = NodeSchemaBuilder::new("circuit", "Circuit")
            .relationship("a_side", "Site", Cardinality::One, |r| r)
            .relationship("z_side", "Site", Cardinality::One, |r| r)
            .build();

        assert_eq!(peer_kinds_for_form(&DEFAULT_POLICY, SchemaRef::Node(&schema)), vec!["Site"]);
    }
}
