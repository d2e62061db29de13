// Compiled type graph. Plain data; serializes to the documented output shape:
// { "<TypeName>": { "<field>": { "type": ..., "isArray"?: true, "validation"?: [...], "format"?: ... } } }
use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data_type::ValidationRule;

/// Name of the synthesized root type.
pub const ROOT: &str = "ROOT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Vec<ValidationRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
}

impl FieldEntry {
    /// Entry pointing at a named type, no extra keys.
    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self { type_name: type_name.into(), is_array: false, validation: None, format: None }
    }
    pub fn array(mut self, is_array: bool) -> Self {
        self.is_array = is_array;
        self
    }
}

/// Field name → entry, in declared order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDefinition {
    pub fields: IndexMap<String, FieldEntry>,
}

impl TypeDefinition {
    pub fn get(&self, field: &str) -> Option<&FieldEntry> {
        self.fields.get(field)
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Type name → definition. `ROOT` is always present and always first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub types: IndexMap<String, TypeDefinition>,
}

impl Schema {
    pub(crate) fn from_types(types: IndexMap<String, TypeDefinition>) -> Self {
        Self { types }
    }

    /// Always `Some` for compiled schemas; a deserialized one may lack it.
    pub fn root(&self) -> Option<&TypeDefinition> {
        self.types.get(ROOT)
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.types.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Every `type` value mentioned by any field entry.
    pub fn referenced_names(&self) -> BTreeSet<&str> {
        self.types
            .values()
            .flat_map(|def| def.fields.values())
            .map(|entry| entry.type_name.as_str())
            .collect()
    }

    /// Referenced names the schema does not define itself; the consuming
    /// runtime has to supply these.
    pub fn external_references(&self) -> BTreeSet<&str> {
        self.referenced_names()
            .into_iter()
            .filter(|name| !self.types.contains_key(*name))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
