//! Change-set computation.
//!
//! [`compute_change_set`] compares a [`Submission`] against the snapshot it
//! was edited from and keeps only what differs. Fields are visited in schema
//! order, attributes before relationships, so equal inputs always give equal
//! change sets.
//!
//! In edit mode a field missing from the submission is unchanged, and a field
//! submitted empty is unset. In create mode empty fields are simply left out.

use log::{debug, warn};
use serde_json::Value;

use crate::form::FormMode;
use crate::model::{
    is_empty_value, values_equal, AttributeDef, AttributePatch, AttributeValue, Cardinality, ChangeSet,
    FieldInput, FieldPatch, ManyPatch, MetadataPatch, ObjectSnapshot, OnePatch, Ref, RelationMetadata,
    RelationshipDef, RelationshipValue, SchemaRef, Submission,
};

/// Computes the minimal change set for a submission.
///
/// `original` is only consulted in edit mode. An edit without a snapshot is
/// diffed against an empty object.
pub fn compute_change_set(
    schema: SchemaRef<'_>,
    submitted: &Submission,
    original: Option<&ObjectSnapshot>,
    mode: FormMode,
) -> ChangeSet {
    let empty = ObjectSnapshot::default();
    let original = match (mode, original) {
        (FormMode::Create, _) => None,
        (FormMode::Edit, Some(original)) => Some(original),
        (FormMode::Edit, None) => {
            warn!("edit of {} without a snapshot; diffing against an empty object", schema.kind());
            Some(&empty)
        }
    };

    for (field, _) in submitted.iter() {
        if schema.attributes().iter().all(|a| a.name != field)
            && schema.relationships().iter().all(|r| r.name != field)
        {
            debug!("ignoring submitted field {field}: not declared on {}", schema.kind());
        }
    }

    let mut changes = ChangeSet::new();
    for attribute in schema.attributes() {
        if attribute.name == "id" {
            continue;
        }
        let Some(input) = submitted.get(&attribute.name) else {
            continue;
        };
        let patch = match original {
            None => create_attribute(input),
            Some(original) => edit_attribute(attribute, input, original),
        };
        if let Some(patch) = patch {
            changes.push(attribute.name.as_str(), FieldPatch::Attribute(patch));
        }
    }
    for relationship in schema.relationships() {
        let Some(input) = submitted.get(&relationship.name) else {
            continue;
        };
        let patch = match relationship.cardinality {
            Cardinality::One => one_patch(relationship, input, original).map(FieldPatch::One),
            Cardinality::Many => many_patch(relationship, input, original).map(FieldPatch::Many),
        };
        if let Some(patch) = patch {
            changes.push(relationship.name.as_str(), patch);
        }
    }

    debug!(
        "{} change set for {}: {} of {} submitted fields",
        if original.is_some() { "update" } else { "create" },
        schema.kind(),
        changes.len(),
        submitted.len()
    );
    changes
}

/// Overlays the submitted metadata slots on `base`.
fn merge_metadata(base: MetadataPatch, input: &FieldInput) -> MetadataPatch {
    MetadataPatch {
        is_visible: input.is_visible.unwrap_or(base.is_visible),
        is_protected: input.is_protected.unwrap_or(base.is_protected),
        source: input.source.clone().unwrap_or(base.source),
        owner: input.owner.clone().unwrap_or(base.owner),
    }
}

/// Returns the merged metadata if the submission changes it.
fn edited_metadata(current: &RelationMetadata, input: &FieldInput) -> Option<MetadataPatch> {
    if !input.has_metadata() {
        return None;
    }
    let current = MetadataPatch::from(current);
    let merged = merge_metadata(current.clone(), input);
    (merged != current).then_some(merged)
}

fn create_attribute(input: &FieldInput) -> Option<AttributePatch> {
    let value = input.value.as_ref().filter(|v| !is_empty_value(v))?;
    let metadata = input
        .has_metadata()
        .then(|| merge_metadata(MetadataPatch::default(), input));
    Some(AttributePatch {
        value: Some(value.clone()),
        metadata,
    })
}

fn edit_attribute(attribute: &AttributeDef, input: &FieldInput, original: &ObjectSnapshot) -> Option<AttributePatch> {
    static NULL: Value = Value::Null;
    let current = original.attribute(&attribute.name);
    let current_value = current.map_or(&NULL, |c| &c.value);

    let value = input
        .value
        .as_ref()
        .filter(|v| !values_equal(v, current_value))
        .map(|v| if is_empty_value(v) { Value::Null } else { v.clone() });
    let metadata = edited_metadata(&current.map(|c| c.metadata.clone()).unwrap_or_default(), input);

    if value.is_none() && metadata.is_none() {
        return None;
    }
    Some(AttributePatch { value, metadata })
}

fn one_patch(relationship: &RelationshipDef, input: &FieldInput, original: Option<&ObjectSnapshot>) -> Option<OnePatch> {
    if input.list.is_some() {
        debug!("ignoring peer list submitted for cardinality-one {}", relationship.name);
    }
    let Some(original) = original else {
        let id = input.id.clone().flatten()?;
        let metadata = input
            .has_metadata()
            .then(|| merge_metadata(MetadataPatch::default(), input));
        return Some(OnePatch { id: Some(id), metadata });
    };

    let current = original.peer(&relationship.name);
    let current_id = current.map(|p| p.id.clone());
    let target = input.id.clone().unwrap_or_else(|| current_id.clone());
    let id_changed = target != current_id;

    // Metadata lives on the link: nothing to edit once unlinked, and a new
    // link starts from defaults rather than the old link's annotations.
    let metadata = match &target {
        Some(_) if id_changed => input
            .has_metadata()
            .then(|| merge_metadata(MetadataPatch::default(), input)),
        Some(_) => {
            let relation = current.and_then(|p| p.relation.as_deref()).cloned().unwrap_or_default();
            edited_metadata(&relation, input)
        }
        None => None,
    };

    if !id_changed && metadata.is_none() {
        return None;
    }
    Some(OnePatch { id: target, metadata })
}

fn many_patch(relationship: &RelationshipDef, input: &FieldInput, original: Option<&ObjectSnapshot>) -> Option<ManyPatch> {
    if input.id.is_some() {
        debug!("ignoring single peer submitted for cardinality-many {}", relationship.name);
    }
    let submitted = dedup(input.list.as_deref()?);

    let Some(original) = original else {
        return (!submitted.is_empty()).then_some(ManyPatch { ids: submitted });
    };

    let current = dedup_str(original.peer_ids(&relationship.name));
    let same = current.len() == submitted.len() && current.iter().all(|id| submitted.contains(id));
    if same {
        return None;
    }

    let mut ids: Vec<String> = current.into_iter().filter(|id| submitted.contains(id)).collect();
    for id in submitted {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Some(ManyPatch { ids })
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !id.is_empty() && !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}

fn dedup_str(ids: Vec<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.iter().any(|o| o == id) {
            out.push(id.to_string());
        }
    }
    out
}

// =============================================================================
// Application
// =============================================================================

/// Returns the snapshot as it would read after the change set is applied.
///
/// Peers that stay linked keep their fetched labels; newly linked peers are
/// known by id only.
pub fn apply_change_set(snapshot: &ObjectSnapshot, changes: &ChangeSet) -> ObjectSnapshot {
    let mut applied = snapshot.clone();
    for change in changes {
        match &change.patch {
            FieldPatch::Attribute(patch) => {
                let slot = applied
                    .attributes
                    .entry(change.field.clone())
                    .or_insert_with(|| AttributeValue::new(Value::Null));
                if let Some(value) = &patch.value {
                    slot.value = value.clone();
                }
                if let Some(metadata) = &patch.metadata {
                    apply_metadata(&mut slot.metadata, metadata);
                }
            }
            FieldPatch::One(patch) => {
                let current = snapshot.peer(&change.field);
                let peer = patch.id.as_deref().map(|id| {
                    let mut peer = match current {
                        Some(current) if current.id == id => current.clone(),
                        _ => Ref::new(id, ""),
                    };
                    if let Some(metadata) = &patch.metadata {
                        let relation = peer.relation.get_or_insert_with(Default::default);
                        apply_metadata(relation, metadata);
                    }
                    peer
                });
                applied
                    .relationships
                    .insert(change.field.clone(), RelationshipValue::One(peer));
            }
            FieldPatch::Many(patch) => {
                let current = match snapshot.relationship(&change.field) {
                    Some(RelationshipValue::Many(peers)) => peers.as_slice(),
                    _ => &[],
                };
                let peers = patch
                    .ids
                    .iter()
                    .map(|id| {
                        current
                            .iter()
                            .find(|p| &p.id == id)
                            .cloned()
                            .unwrap_or_else(|| Ref::new(id.as_str(), ""))
                    })
                    .collect();
                applied
                    .relationships
                    .insert(change.field.clone(), RelationshipValue::Many(peers));
            }
        }
    }
    applied
}

fn apply_metadata(target: &mut RelationMetadata, patch: &MetadataPatch) {
    target.is_visible = patch.is_visible;
    target.is_protected = patch.is_protected;
    target.source = relink(target.source.take(), patch.source.as_deref());
    target.owner = relink(target.owner.take(), patch.owner.as_deref());
}

fn relink(current: Option<Ref>, id: Option<&str>) -> Option<Ref> {
    let id = id?;
    match current {
        Some(current) if current.id == id => Some(current),
        _ => Some(Ref::new(id, "")),
    }
}
