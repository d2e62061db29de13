//! Authored schema tree.
//!
//! `SchemaNode` is the tagged form of the nested literal: a leaf, an object of
//! named children, or an array wrapping the element shape. Raw JSON is turned
//! into this form by [`SchemaNode::from_value`]; the marker keys (`$ref`,
//! `$type`, `$name`) never survive into the field maps.
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::data_type::{self, DataType, Leaf};
use crate::error::{CompileError, FieldPath, Result};

/// Reserved key carrying an explicit type name override.
pub const NAME_KEY: &str = "$name";

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Leaf(Leaf),
    Object(ObjectNode),
    /// Should wrap exactly one element; checked at compile time.
    Array(Vec<SchemaNode>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNode {
    /// Explicit name override, out of band from the authored fields.
    pub name: Option<String>,
    pub fields: IndexMap<String, SchemaNode>,
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDERS
// ————————————————————————————————————————————————————————————————————————————

impl ObjectNode {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn field(mut self, name: impl Into<String>, node: impl Into<SchemaNode>) -> Self {
        self.fields.insert(name.into(), node.into());
        self
    }
    pub fn get(&self, field: &str) -> Option<&SchemaNode> {
        self.fields.get(field)
    }
}

impl SchemaNode {
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        SchemaNode::Object(ObjectNode {
            name: None,
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }
    pub fn array_of(element: impl Into<SchemaNode>) -> Self {
        SchemaNode::Array(vec![element.into()])
    }
    pub fn reference(name: impl Into<String>) -> Self {
        SchemaNode::Leaf(Leaf::reference(name))
    }
    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            SchemaNode::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl From<ObjectNode> for SchemaNode {
    fn from(obj: ObjectNode) -> Self {
        SchemaNode::Object(obj)
    }
}

impl From<Leaf> for SchemaNode {
    fn from(leaf: Leaf) -> Self {
        SchemaNode::Leaf(leaf)
    }
}

impl From<DataType> for SchemaNode {
    fn from(def: DataType) -> Self {
        SchemaNode::Leaf(Leaf::Def(def))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PARSE
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    /// Parse an authored JSON literal. Fails on the first malformed node.
    pub fn from_value(value: &Value) -> Result<Self> {
        debug!("parsing authored schema literal");
        parse_node(value, &FieldPath::root())
    }
}

impl TryFrom<&Value> for SchemaNode {
    type Error = CompileError;
    fn try_from(value: &Value) -> Result<Self> {
        SchemaNode::from_value(value)
    }
}

fn parse_node(value: &Value, path: &FieldPath) -> Result<SchemaNode> {
    match value {
        Value::Object(map) => parse_object(map, path),
        // Element count is the compiler's concern; here we only keep the shape.
        Value::Array(xs) => {
            let elems = xs.iter().map(|el| parse_node(el, path)).collect::<Result<Vec<_>>>()?;
            Ok(SchemaNode::Array(elems))
        }
        scalar => Err(CompileError::UnrecognizedDataType {
            path: path.clone(),
            detail: format!(
                "expected an object, a one-element array or a `{}`/`{}` leaf, found {}",
                data_type::REF_KEY,
                data_type::TYPE_KEY,
                data_type::json_kind(scalar)
            ),
        }),
    }
}

fn parse_object(map: &Map<String, Value>, path: &FieldPath) -> Result<SchemaNode> {
    if data_type::is_leaf_object(map) {
        if map.contains_key(NAME_KEY) {
            return Err(CompileError::AmbiguousNode {
                path: path.clone(),
                detail: format!("`{NAME_KEY}` override on a leaf"),
            });
        }
        return data_type::parse_leaf(map, path).map(SchemaNode::Leaf);
    }

    let mut obj = ObjectNode::new();
    for (key, child) in map {
        if key == NAME_KEY {
            match child {
                Value::String(name) => obj.name = Some(name.clone()),
                other => {
                    return Err(CompileError::InvalidTypeName {
                        name: other.to_string(),
                        path: path.clone(),
                    });
                }
            }
            continue;
        }
        if key.starts_with('$') {
            return Err(CompileError::ReservedKey { key: key.clone(), path: path.child(key) });
        }
        let child = parse_node(child, &path.child(key))?;
        obj.fields.insert(key.clone(), child);
    }
    Ok(SchemaNode::Object(obj))
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_literal() {
        let node = SchemaNode::from_value(&json!({
            "foo": { "$name": "buzz", "bar": { "$ref": "BooleanType" } },
            "items": [ { "qty": { "$type": "Number" } } ]
        }))
        .unwrap();

        let expected = SchemaNode::object([
            (
                "foo",
                ObjectNode::new().with_name("buzz").field("bar", SchemaNode::reference("BooleanType")).into(),
            ),
            (
                "items",
                SchemaNode::array_of(ObjectNode::new().field("qty", DataType::new("Number"))),
            ),
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn override_stays_out_of_fields() {
        let node = SchemaNode::from_value(&json!({ "$name": "thing", "a": {} })).unwrap();
        let obj = node.as_object().unwrap();
        assert_eq!(obj.name.as_deref(), Some("thing"));
        assert_eq!(obj.fields.keys().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn reserved_keys_rejected() {
        let err = SchemaNode::from_value(&json!({ "foo": { "$schema": "x" } })).unwrap_err();
        assert!(matches!(err, CompileError::ReservedKey { ref key, .. } if key == "$schema"));
    }

    #[test]
    fn leaf_with_sibling_field_is_ambiguous_at_its_path() {
        let err = SchemaNode::from_value(&json!({
            "foo": { "bar": { "$ref": "BooleanType", "baz": { "$ref": "X" } } }
        }))
        .unwrap_err();
        match err {
            CompileError::AmbiguousNode { path, .. } => assert_eq!(path.to_string(), "foo.bar"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn override_on_leaf_is_ambiguous() {
        let err = SchemaNode::from_value(&json!({ "a": { "$ref": "X", "$name": "y" } })).unwrap_err();
        assert_eq!(err.kind(), "AmbiguousNode");
    }

    #[test]
    fn scalar_field_is_unrecognized() {
        let err = SchemaNode::from_value(&json!({ "a": { "b": "BooleanType" } })).unwrap_err();
        assert_eq!(err.kind(), "UnrecognizedDataType");
        assert_eq!(err.path().unwrap().to_string(), "a.b");
    }

    #[test]
    fn non_string_override_is_invalid() {
        let err = SchemaNode::from_value(&json!({ "a": { "$name": 4 } })).unwrap_err();
        assert_eq!(err.kind(), "InvalidTypeName");
    }

    #[test]
    fn try_from_matches_from_value() {
        let literal = json!({ "foo": { "bar": { "$ref": "BooleanType" } } });
        let node = SchemaNode::try_from(&literal).unwrap();
        assert_eq!(node, SchemaNode::from_value(&literal).unwrap());

        let bad = json!({ "a": 1 });
        let err: CompileError = SchemaNode::try_from(&bad).unwrap_err();
        assert_eq!(err.kind(), "UnrecognizedDataType");
    }
}
