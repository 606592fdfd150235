//! Wire rendering for query documents.
//!
//! Two layouts are produced from the same tree:
//! - compact (`Display`): one line, `query { Device { count } }`
//! - pretty ([`render_pretty`]): two-space indentation, one field per line
//!
//! String arguments are quoted and escaped here; nothing upstream
//! interpolates raw text.

use std::fmt;

use crate::query::ast::{ArgValue, Argument, Document, Selection};

/// Text buffer for rendering documents.
#[derive(Debug, Default)]
pub struct Writer {
    buf: String,
    pretty: bool,
    depth: usize,
}

impl Writer {
    /// Creates a compact writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an indenting writer.
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }

    /// Returns the rendered text.
    pub fn into_string(self) -> String {
        self.buf
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a whole document.
    pub fn write_document(&mut self, doc: &Document) {
        self.buf.push_str(doc.operation.keyword());
        if let Some(name) = &doc.name {
            self.buf.push(' ');
            self.buf.push_str(name);
        }
        self.buf.push(' ');
        self.write_selection_set(&doc.selections);
        if self.pretty {
            self.buf.push('\n');
        }
    }

    fn write_selection_set(&mut self, selections: &[Selection]) {
        self.buf.push('{');
        self.depth += 1;
        for selection in selections {
            self.separator();
            self.write_selection(selection);
        }
        self.depth -= 1;
        self.separator();
        self.buf.push('}');
    }

    fn separator(&mut self) {
        if self.pretty {
            self.buf.push('\n');
            for _ in 0..self.depth {
                self.buf.push_str("  ");
            }
        } else {
            self.buf.push(' ');
        }
    }

    fn write_selection(&mut self, selection: &Selection) {
        if let Some(alias) = &selection.alias {
            self.buf.push_str(alias);
            self.buf.push_str(": ");
        }
        self.buf.push_str(&selection.name);
        if !selection.arguments.is_empty() {
            self.buf.push('(');
            self.write_arguments(&selection.arguments);
            self.buf.push(')');
        }
        if !selection.selections.is_empty() {
            self.buf.push(' ');
            self.write_selection_set(&selection.selections);
        }
    }

    fn write_arguments(&mut self, arguments: &[Argument]) {
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                self.buf.push_str(", ");
            }
            self.buf.push_str(&argument.name);
            self.buf.push_str(": ");
            self.write_value(&argument.value);
        }
    }

    /// Writes an argument value.
    pub fn write_value(&mut self, value: &ArgValue) {
        match value {
            ArgValue::Null => self.buf.push_str("null"),
            ArgValue::Bool(b) => self.buf.push_str(if *b { "true" } else { "false" }),
            ArgValue::Int(i) => self.buf.push_str(&i.to_string()),
            ArgValue::UInt(u) => self.buf.push_str(&u.to_string()),
            ArgValue::Float(f) if f.is_finite() => self.buf.push_str(&f.to_string()),
            // Non-finite floats have no literal form
            ArgValue::Float(_) => self.buf.push_str("null"),
            ArgValue::String(s) => self.write_string(s),
            ArgValue::List(items) => {
                self.buf.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.buf.push_str(", ");
                    }
                    self.write_value(item);
                }
                self.buf.push(']');
            }
            ArgValue::Object(fields) => {
                self.buf.push('{');
                for (i, (key, item)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.buf.push_str(", ");
                    }
                    self.buf.push_str(key);
                    self.buf.push_str(": ");
                    self.write_value(item);
                }
                self.buf.push('}');
            }
        }
    }

    /// Writes a quoted, escaped string literal.
    pub fn write_string(&mut self, s: &str) {
        self.buf.push('"');
        for c in s.chars() {
            match c {
                '"' => self.buf.push_str("\\\""),
                '\\' => self.buf.push_str("\\\\"),
                '\n' => self.buf.push_str("\\n"),
                '\r' => self.buf.push_str("\\r"),
                '\t' => self.buf.push_str("\\t"),
                c if c.is_control() => self.buf.push_str(&format!("\\u{:04x}", c as u32)),
                c => self.buf.push(c),
            }
        }
        self.buf.push('"');
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = Writer::new();
        writer.write_document(self);
        f.write_str(writer.as_str())
    }
}

/// Renders a document with indentation.
pub fn render_pretty(doc: &Document) -> String {
    let mut writer = Writer::pretty();
    writer.write_document(doc);
    writer.into_string()
}
