//! Benchmark for schema-driven synthesis over a generated catalogue.
//!
//! Builds a schema payload with many kinds, then times registry ingestion,
//! query synthesis and rendering, form building and change-set diffing.
//!
//! Usage: `bench-synthesis [kinds] [attributes-per-kind] [--json]`

use std::time::{Duration, Instant};

use log::info;
use serde::Serialize;
use serde_json::{json, Value};

use schemaform::model::SnapshotBuilder;
use schemaform::{
    build_edit_query, build_form_fields, build_read_query, build_update_mutation, compute_change_set,
    ExecutionContext, FieldSelection, FormBuilder, FormMode, ObjectSnapshot, PeerOptions, ReadParams, Ref,
    SchemaRegistry, Submission, ViewContext,
};

const ATTRIBUTE_KINDS: [&str; 6] = ["Text", "TextArea", "Integer", "Boolean", "Json", "Password"];

#[derive(Debug, Default, Serialize)]
struct Report {
    kinds: usize,
    attributes_per_kind: usize,
    payload_bytes: usize,
    load_ms: f64,
    read_queries: usize,
    read_bytes: usize,
    read_ms: f64,
    edit_queries_ms: f64,
    form_fields: usize,
    forms_ms: f64,
    changes: usize,
    diff_ms: f64,
}

fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Kind `K{i}` links to its predecessor, to an owner through the
/// `DataOwner` generic, and to a set of tags.
fn generate_payload(kinds: usize, attributes: usize) -> Value {
    let mut nodes = Vec::with_capacity(kinds + 2);
    for i in 0..kinds {
        let attrs: Vec<Value> = (0..attributes)
            .map(|a| {
                json!({
                    "name": format!("attr_{a}"),
                    "kind": ATTRIBUTE_KINDS[a % ATTRIBUTE_KINDS.len()],
                    "optional": a != 0,
                    "order_weight": (attributes - a) * 100,
                })
            })
            .collect();
        let mut relationships = vec![
            json!({"name": "owner", "peer": "DataOwner", "cardinality": "one"}),
            json!({"name": "tags", "peer": "Tag", "cardinality": "many", "kind": "Attribute"}),
        ];
        if i > 0 {
            relationships.push(json!({
                "name": "parent",
                "peer": format!("K{}", i - 1),
                "cardinality": "one",
                "kind": "Parent",
            }));
        }
        nodes.push(json!({
            "name": format!("k{i}"),
            "kind": format!("K{i}"),
            "attributes": attrs,
            "relationships": relationships,
        }));
    }
    nodes.push(json!({"name": "tag", "kind": "Tag"}));
    nodes.push(json!({"name": "account", "kind": "Account", "inherit_from": ["DataOwner", "DataSource"]}));

    json!({
        "nodes": nodes,
        "generics": [{"kind": "DataOwner"}, {"kind": "DataSource"}],
    })
}

fn snapshot_for(kind: &str, attributes: usize) -> ObjectSnapshot {
    let mut builder = SnapshotBuilder::new("obj-1", kind)
        .peer("owner", Some(Ref::new("acc-1", "Account")))
        .peers("tags", (0..8).map(|t| Ref::new(format!("tag-{t}"), "Tag")));
    for a in 0..attributes {
        builder = builder.value(format!("attr_{a}"), format!("value {a}"));
    }
    builder.build()
}

fn submission_for(attributes: usize) -> Submission {
    let mut submission = Submission::new()
        .peers("tags", (0..8).rev().map(|t| format!("tag-{t}")).chain(["tag-9".to_string()]))
        .owner("owner", Some("acc-1"));
    for a in 0..attributes {
        let value = if a % 3 == 0 { format!("edited {a}") } else { format!("value {a}") };
        submission = submission.value(format!("attr_{a}"), value);
    }
    submission
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let kinds: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(500);
    let attributes: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(20);
    let as_json = std::env::args().any(|a| a == "--json");

    let mut report = Report {
        kinds,
        attributes_per_kind: attributes,
        ..Report::default()
    };

    let payload = generate_payload(kinds, attributes).to_string();
    report.payload_bytes = payload.len();
    info!("generated {} kinds x {} attributes ({} bytes)", kinds, attributes, payload.len());

    // Registry ingestion
    let load_start = Instant::now();
    let registry = SchemaRegistry::from_json(&payload).expect("Failed to load generated schema");
    report.load_ms = ms(load_start.elapsed());

    let context = ExecutionContext::branch("main").expect("Invalid branch");
    let kind_names: Vec<String> = registry.nodes().iter().map(|n| n.kind.clone()).collect();

    // Read queries for every kind and view
    let read_start = Instant::now();
    for kind in &kind_names {
        let schema = registry.resolve(kind);
        for view in [ViewContext::List, ViewContext::Detail] {
            let fields = schema
                .map(|s| FieldSelection::for_context(s, view))
                .unwrap_or_default();
            let params = match view {
                ViewContext::List => ReadParams::collection(context.clone()).page(0, 50),
                _ => ReadParams::single("obj-1", context.clone()),
            };
            let query = build_read_query(schema, &fields, &params);
            report.read_bytes += query.document.to_string().len();
            report.read_queries += 1;
        }
    }
    report.read_ms = ms(read_start.elapsed());

    // Edit-form reads, including peer listings
    let edit_start = Instant::now();
    let builder = FormBuilder::new(&registry);
    for kind in &kind_names {
        let Some(schema) = registry.resolve(kind) else { continue };
        let peer_kinds = builder.peer_kinds(schema, FormMode::Edit);
        let query = build_edit_query(Some(schema), "obj-1", &peer_kinds, &context);
        report.read_bytes += query.document.to_string().len();
    }
    report.edit_queries_ms = ms(edit_start.elapsed());

    // Form descriptors
    let peer_options = PeerOptions::new()
        .with("Account", [Ref::new("acc-1", "Account").with_label("root")])
        .with("Tag", (0..10).map(|t| Ref::new(format!("tag-{t}"), "Tag")));
    let forms_start = Instant::now();
    for kind in &kind_names {
        let Some(schema) = registry.resolve(kind) else { continue };
        let snapshot = snapshot_for(kind, attributes);
        report.form_fields += build_form_fields(&registry, schema, FormMode::Edit, Some(&snapshot), &peer_options).len();
    }
    report.forms_ms = ms(forms_start.elapsed());

    // Change sets and update mutations
    let submission = submission_for(attributes);
    let diff_start = Instant::now();
    for kind in &kind_names {
        let Some(schema) = registry.resolve(kind) else { continue };
        let snapshot = snapshot_for(kind, attributes);
        let changes = compute_change_set(schema, &submission, Some(&snapshot), FormMode::Edit);
        report.changes += changes.len();
        if let Some(mutation) = build_update_mutation(schema, &snapshot.id, &changes) {
            report.read_bytes += mutation.to_string().len();
        }
    }
    report.diff_ms = ms(diff_start.elapsed());

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report).expect("Failed to serialize report"));
        return;
    }

    println!("Schema: {} kinds x {} attributes, {} bytes", kinds, attributes, report.payload_bytes);
    println!("\nRegistry load: {:.2} ms", report.load_ms);
    println!(
        "\nRead queries: {} in {:.2} ms ({:.1} us each)",
        report.read_queries,
        report.read_ms,
        report.read_ms * 1000.0 / report.read_queries.max(1) as f64
    );
    println!("Edit queries: {:.2} ms", report.edit_queries_ms);
    println!("\nForm fields: {} in {:.2} ms", report.form_fields, report.forms_ms);
    println!("\nChange-set entries: {} in {:.2} ms", report.changes, report.diff_ms);
    println!("Total document text: {} bytes", report.read_bytes);
}
