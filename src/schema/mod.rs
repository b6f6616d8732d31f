//! Resource schemas: which fields a resource type has, which of them are
//! required at creation, which reference other resources, and which are
//! internal to the server and never serialized.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::database::Document;

/// Keys maintained by the server. Never accepted from client input.
pub const SYSTEM_FIELDS: &[&str] = &["id", "_id", "owner", "createdAt", "updatedAt"];

/// Field path → message, e.g. `"name.firstName" → "is required"`.
pub type FieldErrors = HashMap<String, String>;

#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    /// Id of a resource in the named collection
    Reference(&'static str),
    /// Nested sub-document
    Object(Vec<FieldSpec>),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    /// Server-side only: stripped from client input, redacted from output.
    pub internal: bool,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            unique: false,
            internal: false,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn reference(name: &'static str, collection: &'static str) -> Self {
        Self::new(name, FieldKind::Reference(collection))
    }

    pub fn object(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self::new(name, FieldKind::Object(fields))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }
}

/// Who owns a freshly created document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerPolicy {
    /// The principal that created it
    Principal,
    /// The document itself (user accounts)
    SelfOwned,
}

/// A read-only field computed from stored fields at serialization time.
#[derive(Debug, Clone)]
pub struct DerivedField {
    /// Dot-separated output path, e.g. `name.full`
    pub path: &'static str,
    pub compute: fn(&Map<String, Value>) -> Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ResourceSchema {
    /// Request/response key for one resource, e.g. `author`
    pub singular: &'static str,
    /// Route segment, collection name and list key, e.g. `authors`
    pub plural: &'static str,
    pub fields: Vec<FieldSpec>,
    pub derived: Vec<DerivedField>,
    pub owner_policy: OwnerPolicy,
}

impl ResourceSchema {
    pub fn new(singular: &'static str, plural: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self {
            singular,
            plural,
            fields,
            derived: Vec::new(),
            owner_policy: OwnerPolicy::Principal,
        }
    }

    pub fn with_derived(mut self, path: &'static str, compute: fn(&Map<String, Value>) -> Option<Value>) -> Self {
        self.derived.push(DerivedField { path, compute });
        self
    }

    pub fn self_owned(mut self) -> Self {
        self.owner_policy = OwnerPolicy::SelfOwned;
        self
    }

    pub fn collection(&self) -> &'static str {
        self.plural
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn unique_fields(&self) -> Vec<&'static str> {
        self.fields.iter().filter(|f| f.unique).map(|f| f.name).collect()
    }

    /// Keep only the keys a client may write: system fields, internal fields
    /// and keys the schema does not declare are dropped.
    pub fn sanitize(&self, body: Map<String, Value>) -> Map<String, Value> {
        sanitize_fields(&self.fields, body)
    }

    /// Full validation of a document about to be inserted.
    pub fn validate_new(&self, fields: &Map<String, Value>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for spec in &self.fields {
            check_field(spec, fields.get(spec.name), spec.name, &mut errors);
        }
        into_result(errors)
    }

    /// Validation of a partial update. Only the submitted, declared keys are
    /// checked; a submitted sub-document replaces the stored one and is
    /// checked whole.
    pub fn validate_partial(&self, fields: &Map<String, Value>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for (key, value) in fields {
            if let Some(spec) = self.field(key) {
                check_field(spec, Some(value), spec.name, &mut errors);
            }
        }
        into_result(errors)
    }

    /// Serialize a stored document for a client. Internal fields never
    /// appear here, whatever operation produced the document.
    pub fn render(&self, doc: &Document) -> Value {
        let mut out = Map::new();
        out.insert("id".into(), Value::String(doc.id.to_string()));

        for (key, value) in &doc.fields {
            if self.field(key).map_or(false, |f| f.internal) {
                continue;
            }
            out.insert(key.clone(), value.clone());
        }

        for derived in &self.derived {
            if let Some(value) = (derived.compute)(&doc.fields) {
                insert_path(&mut out, derived.path, value);
            }
        }

        out.insert("owner".into(), Value::String(doc.owner.to_string()));
        out.insert("createdAt".into(), json!(doc.created_at));
        out.insert("updatedAt".into(), json!(doc.updated_at));
        Value::Object(out)
    }
}

fn sanitize_fields(specs: &[FieldSpec], body: Map<String, Value>) -> Map<String, Value> {
    body.into_iter()
        .filter(|(key, _)| !SYSTEM_FIELDS.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            let spec = specs.iter().find(|f| f.name == key)?;
            if spec.internal {
                return None;
            }
            let value = match (&spec.kind, value) {
                (FieldKind::Object(children), Value::Object(nested)) => {
                    Value::Object(sanitize_fields(children, nested))
                }
                (_, other) => other,
            };
            Some((key, value))
        })
        .collect()
}

fn check_field(spec: &FieldSpec, value: Option<&Value>, path: &str, errors: &mut FieldErrors) {
    let value = match value {
        None | Some(Value::Null) => {
            if spec.required {
                errors.insert(path.to_string(), "is required".to_string());
            }
            return;
        }
        Some(v) => v,
    };

    match &spec.kind {
        FieldKind::String => match value.as_str() {
            Some("") if spec.required => {
                errors.insert(path.to_string(), "is required".to_string());
            }
            Some(_) => {}
            None => {
                errors.insert(path.to_string(), "must be a string".to_string());
            }
        },
        FieldKind::Reference(collection) => {
            if value.as_str().and_then(|s| Uuid::parse_str(s).ok()).is_none() {
                errors.insert(path.to_string(), format!("must be a valid {} id", collection));
            }
        }
        FieldKind::Object(children) => match value.as_object() {
            Some(nested) => {
                for child in children {
                    let child_path = format!("{}.{}", path, child.name);
                    check_field(child, nested.get(child.name), &child_path, errors);
                }
            }
            None => {
                errors.insert(path.to_string(), "must be an object".to_string());
            }
        },
    }
}

fn into_result(errors: FieldErrors) -> Result<(), FieldErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    let mut parts: Vec<&str> = path.split('.').collect();
    let Some(leaf) = parts.pop() else { return };

    let mut current = target;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(map) => current = map,
            _ => return,
        }
    }
    current.insert(leaf.to_string(), value);
}
