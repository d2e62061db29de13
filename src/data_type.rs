//! Leaf values: references to runtime-known types and inline definitions.
//!
//! The resolver turns either kind into the output field entry. It never looks
//! the referenced name up anywhere and never interprets validation rules;
//! both are the consuming runtime's job.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CompileError, FieldPath, Result};
use crate::schema::FieldEntry;

/// Marker key of a reference leaf: `{ "$ref": "BooleanType" }`.
pub const REF_KEY: &str = "$ref";
/// Marker key of an inline definition: `{ "$type": "String", "validation": [...] }`.
pub const TYPE_KEY: &str = "$type";
pub const VALIDATION_KEY: &str = "validation";
pub const FORMAT_KEY: &str = "format";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Points at a type the consuming runtime already knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeRef {
    pub name: String,
}

/// One validation rule, kept exactly as authored: every key, in authored
/// order, `null`s included. Only a string `kind` is required; everything else
/// is left for the consuming runtime to interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationRule(IndexMap<String, Value>);

impl ValidationRule {
    pub const KIND_KEY: &'static str = "kind";
    pub const MESSAGE_KEY: &'static str = "message";

    pub fn new(kind: impl Into<String>) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(Self::KIND_KEY.to_string(), Value::String(kind.into()));
        Self(entries)
    }
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.with_param(Self::MESSAGE_KEY, message.into())
    }
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> &str {
        self.0.get(Self::KIND_KEY).and_then(Value::as_str).unwrap_or_default()
    }
    /// The `message` entry when it is a string; other shapes stay reachable via [`Self::get`].
    pub fn message(&self) -> Option<&str> {
        self.0.get(Self::MESSAGE_KEY).and_then(Value::as_str)
    }
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
    pub fn entries(&self) -> &IndexMap<String, Value> {
        &self.0
    }

    /// Accept any object with a string `kind`.
    fn from_authored(value: &Value) -> std::result::Result<Self, String> {
        let Value::Object(map) = value else {
            return Err(format!("expected an object, found {}", json_kind(value)));
        };
        match map.get(Self::KIND_KEY) {
            Some(Value::String(_)) => {}
            Some(other) => return Err(format!("`kind` must be a string, found {}", json_kind(other))),
            None => return Err("missing `kind`".to_string()),
        }
        Ok(Self(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()))
    }
}

/// A fully specified inline type.
#[derive(Debug, Clone, PartialEq)]
pub struct DataType {
    pub name: String,
    pub validation: Option<Vec<ValidationRule>>,
    pub format: Option<Value>,
}

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), validation: None, format: None }
    }
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.get_or_insert_with(Vec::new).push(rule);
        self
    }
    pub fn with_format(mut self, format: impl Into<Value>) -> Self {
        self.format = Some(format.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Ref(DataTypeRef),
    Def(DataType),
}

impl Leaf {
    pub fn reference(name: impl Into<String>) -> Self {
        Leaf::Ref(DataTypeRef { name: name.into() })
    }
    pub fn type_name(&self) -> &str {
        match self {
            Leaf::Ref(r) => &r.name,
            Leaf::Def(d) => &d.name,
        }
    }
}

impl From<DataType> for Leaf {
    fn from(def: DataType) -> Self {
        Leaf::Def(def)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESOLVE
// ————————————————————————————————————————————————————————————————————————————

/// Normalize a leaf into its output entry. References contribute `type` only.
pub fn resolve(leaf: &Leaf) -> FieldEntry {
    match leaf {
        Leaf::Ref(r) => FieldEntry::of_type(r.name.clone()),
        Leaf::Def(d) => FieldEntry {
            type_name: d.name.clone(),
            is_array: false,
            validation: d.validation.clone(),
            format: d.format.clone(),
        },
    }
}

/// Parse-then-resolve for a raw JSON leaf.
pub fn resolve_value(value: &Value, path: &FieldPath) -> Result<FieldEntry> {
    let Value::Object(map) = value else {
        return Err(unrecognized(path, format!("expected a `{REF_KEY}` or `{TYPE_KEY}` object, found {}", json_kind(value))));
    };
    parse_leaf(map, path).map(|leaf| resolve(&leaf))
}

// ————————————————————————————————————————————————————————————————————————————
// PARSE
// ————————————————————————————————————————————————————————————————————————————

/// Does this JSON object carry a leaf marker?
pub fn is_leaf_object(map: &Map<String, Value>) -> bool {
    map.contains_key(REF_KEY) || map.contains_key(TYPE_KEY)
}

/// Parse a JSON object known to carry a leaf marker.
pub fn parse_leaf(map: &Map<String, Value>, path: &FieldPath) -> Result<Leaf> {
    if map.contains_key(REF_KEY) && map.contains_key(TYPE_KEY) {
        return Err(CompileError::AmbiguousNode {
            path: path.clone(),
            detail: format!("both `{REF_KEY}` and `{TYPE_KEY}` are present"),
        });
    }

    if let Some(name) = map.get(REF_KEY) {
        reject_extra_keys(map, &[REF_KEY], path)?;
        let name = expect_name(name, REF_KEY, path)?;
        return Ok(Leaf::reference(name));
    }

    let Some(name) = map.get(TYPE_KEY) else {
        return Err(unrecognized(path, format!("missing `{REF_KEY}` or `{TYPE_KEY}` marker")));
    };
    reject_extra_keys(map, &[TYPE_KEY, VALIDATION_KEY, FORMAT_KEY], path)?;
    let mut def = DataType::new(expect_name(name, TYPE_KEY, path)?);

    if let Some(rules) = map.get(VALIDATION_KEY) {
        let Value::Array(rules) = rules else {
            return Err(unrecognized(path, format!("`{VALIDATION_KEY}` must be an array, found {}", json_kind(rules))));
        };
        let mut parsed = Vec::with_capacity(rules.len());
        for (ix, rule) in rules.iter().enumerate() {
            let rule = ValidationRule::from_authored(rule)
                .map_err(|why| unrecognized(path, format!("validation rule #{ix}: {why}")))?;
            parsed.push(rule);
        }
        def.validation = Some(parsed);
    }
    def.format = map.get(FORMAT_KEY).cloned();

    Ok(Leaf::Def(def))
}

fn reject_extra_keys(map: &Map<String, Value>, allowed: &[&str], path: &FieldPath) -> Result<()> {
    let marker = allowed[0];
    match map.keys().find(|k| !allowed.contains(&k.as_str())) {
        None => Ok(()),
        Some(extra) => Err(CompileError::AmbiguousNode {
            path: path.clone(),
            detail: format!("leaf marker `{marker}` next to field `{extra}`"),
        }),
    }
}

fn expect_name<'v>(value: &'v Value, key: &str, path: &FieldPath) -> Result<&'v str> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s),
        other => Err(unrecognized(path, format!("`{key}` must be a non-empty string, found {}", json_kind(other)))),
    }
}

fn unrecognized(path: &FieldPath, detail: String) -> CompileError {
    CompileError::UnrecognizedDataType { path: path.clone(), detail }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(s) if s.is_empty() => "an empty string",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
