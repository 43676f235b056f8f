//! # Expansion Report
//!
//! JSON-LD expansion drops whatever it cannot map to an IRI, so a clean
//! expansion says nothing about unmapped terms. [`PreparedDocument`] rewrites
//! the input so that every loss becomes visible in the expanded output:
//!
//! - The top-level `@context` becomes `[{"@vocab": UNMAPPED_VOCAB}, default,
//!   ...document contexts]`. Undefined keys and type values then expand under
//!   the `UNMAPPED_VOCAB` prefix instead of disappearing.
//! - Every scalar property value is replaced by a unique marker IRI, and every
//!   nested node without an identifier receives one as `@id`. A key whose
//!   markers are all absent from the output was dropped, either because its
//!   term maps to `null` or because the mapping is not an IRI.
//!
//! Type values keep their original text. Nested `@context` entries are passed
//! through untouched so scoped and imported contexts apply as written.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use iref::IriBuf;
use json_ld::ExpandedDocument;
use serde_json::{Map, Value};

/// Vocabulary mapping that catches terms the contexts leave undefined.
const UNMAPPED_VOCAB: &str = "urn:ob-unmapped:";

const MARKER_PREFIX: &str = "urn:ob-marker:";

/// A non-keyword key of the input and the markers standing in for its value.
#[derive(Debug)]
struct KeyEntry {
    path: String,
    key: String,
    parent: Option<usize>,
    markers: Vec<String>,
}

/// The input rewritten for expansion, plus the bookkeeping needed to read
/// the expanded output back against the original keys.
#[derive(Debug)]
pub(crate) struct PreparedDocument {
    document: Value,
    keys: Vec<KeyEntry>,
    types: Vec<(String, String)>,
    next_marker: usize,
}

impl PreparedDocument {
    pub(crate) fn new(doc: &Map<String, Value>, default_context: &str) -> Self {
        let mut prepared = Self {
            document: Value::Null,
            keys: Vec::new(),
            types: Vec::new(),
            next_marker: 0,
        };
        let mut root = prepared.prepare_node(doc, "", None, None);

        let mut contexts = vec![
            serde_json::json!({ "@vocab": UNMAPPED_VOCAB }),
            Value::String(default_context.to_string()),
        ];
        match doc.get("@context") {
            Some(Value::Array(entries)) => contexts.extend(entries.iter().cloned()),
            Some(local) => contexts.push(local.clone()),
            None => {}
        }
        root.insert("@context".into(), Value::Array(contexts));

        prepared.document = Value::Object(root);
        prepared
    }

    /// The rewritten document handed to the expansion algorithm.
    pub(crate) fn document(&self) -> &Value {
        &self.document
    }

    fn marker(&mut self, owner: usize) -> String {
        let marker = format!("{MARKER_PREFIX}{}:m", self.next_marker);
        self.next_marker += 1;
        self.keys[owner].markers.push(marker.clone());
        marker
    }

    fn prepare_node(
        &mut self,
        node: &Map<String, Value>,
        path: &str,
        parent: Option<usize>,
        owner: Option<usize>,
    ) -> Map<String, Value> {
        let mut out = Map::new();
        let mut id_entry = None;
        for (key, value) in node {
            let at = format!("{path}/{key}");
            if key == "type" || key == "@type" {
                for type_value in type_strings(value) {
                    self.types.push((at.clone(), type_value.to_string()));
                }
                out.insert(key.clone(), value.clone());
                continue;
            }
            if key.starts_with('@') {
                out.insert(key.clone(), value.clone());
                continue;
            }

            let index = self.keys.len();
            self.keys.push(KeyEntry {
                path: at.clone(),
                key: key.clone(),
                parent,
                markers: Vec::new(),
            });
            if key == "id" {
                id_entry = Some(index);
            }
            let prepared = self.prepare_value(value, &at, index);
            out.insert(key.clone(), prepared);
        }

        if let Some(owner) = owner {
            match id_entry {
                Some(id) => {
                    let markers = self.keys[id].markers.clone();
                    self.keys[owner].markers.extend(markers);
                }
                None if !out.keys().any(|k| k != "@context" && k.starts_with('@')) => {
                    let marker = self.marker(owner);
                    out.insert("@id".into(), Value::String(marker));
                }
                None => {}
            }
        }
        out
    }

    fn prepare_value(&mut self, value: &Value, path: &str, owner: usize) -> Value {
        match value {
            Value::Null => Value::Null,
            Value::Object(node) => {
                Value::Object(self.prepare_node(node, path, Some(owner), Some(owner)))
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.prepare_value(item, &format!("{path}/{i}"), owner))
                    .collect(),
            ),
            _ => Value::String(self.marker(owner)),
        }
    }

    /// One message per key or type value the expansion could not map.
    pub(crate) fn unresolved<B: fmt::Display + AsRef<str>>(
        &self,
        expanded: &ExpandedDocument<IriBuf, B>,
    ) -> Vec<String> {
        let mut observed = Observed::default();
        for object in expanded.iter() {
            observed.visit(object);
        }
        self.report(&observed)
    }

    fn report(&self, observed: &Observed) -> Vec<String> {
        let present = |entry: &KeyEntry| {
            entry.markers.is_empty() || entry.markers.iter().any(|m| observed.values.contains(m))
        };

        let mut violations = Vec::new();
        let mut reported: HashSet<&str> = HashSet::new();
        for entry in &self.keys {
            if let Some(parent) = entry.parent {
                if !present(&self.keys[parent]) {
                    continue;
                }
            }
            if observed.unmapped.contains(&entry.key) || !present(entry) {
                reported.insert(entry.key.as_str());
                violations.push(format!(
                    "{}: term {:?} has no IRI mapping",
                    entry.path, entry.key
                ));
            }
        }
        for (path, type_value) in &self.types {
            if observed.unmapped.contains(type_value) {
                reported.insert(type_value.as_str());
                violations.push(format!("{path}: type {type_value:?} has no IRI mapping"));
            }
        }
        for name in &observed.unmapped {
            if !reported.contains(name.as_str()) {
                violations.push(format!("term {name:?} has no IRI mapping"));
            }
        }
        violations
    }
}

fn type_strings(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Identifiers and literals seen in the expanded output.
#[derive(Debug, Default)]
struct Observed {
    values: HashSet<String>,
    unmapped: BTreeSet<String>,
}

impl Observed {
    fn record(&mut self, text: String) {
        match text.strip_prefix(UNMAPPED_VOCAB) {
            Some(name) => {
                self.unmapped.insert(name.to_string());
            }
            None => {
                self.values.insert(text);
            }
        }
    }

    fn visit<B: fmt::Display + AsRef<str>>(&mut self, object: &json_ld::IndexedObject<IriBuf, B>) {
        if let Some(id) = object.id() {
            self.record(id.to_string());
        }
        if let Some(text) = object.as_str() {
            self.record(text.to_string());
        }
        if let Some(node) = object.as_node() {
            for type_id in node.types() {
                self.record(type_id.to_string());
            }
            for (property, values) in node.properties() {
                self.record(property.to_string());
                for value in values.iter() {
                    self.visit(value);
                }
            }
        }
    }
}
