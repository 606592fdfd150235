//! Prints the read queries synthesized for one kind of a schema file.
//!
//! Usage: `render_query <schema.json> <Kind> [branch] [at]`

use std::fs;

use schemaform::query::render_pretty;
use schemaform::{
    build_peer_options_query, build_read_query, ExecutionContext, FieldSelection, FormBuilder, FormMode,
    ReadParams, SchemaRegistry, ViewContext,
};

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "schema.json".to_string());
    let kind = args.next().unwrap_or_else(|| "Device".to_string());
    let branch = args.next().unwrap_or_else(|| "main".to_string());
    let at = args.next();

    println!("Reading: {}", path);
    let payload = fs::read_to_string(&path).expect("Failed to read schema file");
    let registry = SchemaRegistry::from_json(&payload).expect("Failed to load schema");
    println!(
        "Loaded {} node schemas, {} generics",
        registry.nodes().len(),
        registry.generics().len()
    );

    let context = ExecutionContext::new(branch, at.as_deref()).expect("Invalid branch or timestamp");
    println!("Endpoint: {}", context.endpoint_path());
    if context.is_read_only() {
        println!("(historical context, read only)");
    }

    let schema = registry.resolve(&kind);
    if schema.is_none() {
        println!("Kind {} is not in the schema; the placeholder is sent instead", kind);
    }

    println!("\n=== List ===");
    let fields = schema.map(|s| FieldSelection::for_context(s, ViewContext::List)).unwrap_or_default();
    let list = build_read_query(schema, &fields, &ReadParams::collection(context.clone()));
    print!("{}", render_pretty(&list.document));

    println!("\n=== Detail ===");
    let fields = schema.map(|s| FieldSelection::for_context(s, ViewContext::Detail)).unwrap_or_default();
    let detail = build_read_query(schema, &fields, &ReadParams::single("<id>", context));
    print!("{}", render_pretty(&detail.document));

    if let Some(schema) = schema {
        println!("\n=== Form peer options ===");
        let kinds = FormBuilder::new(&registry).peer_kinds(schema, FormMode::Edit);
        let peers = build_peer_options_query(&kinds);
        print!("{}", render_pretty(&peers));
        println!("fingerprint: {}", peers.fingerprint());
    }
}
