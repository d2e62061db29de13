//! Nested literal → flat type graph.
//!
//! Walks an [`ObjectNode`] tree field by field, in declared order:
//! - array fields unwrap to their single element and set `isArray`
//! - leaf fields resolve in place, no new type
//! - object fields get a synthesized type name and are compiled into their
//!   own definition
//!
//! All state (the output map and the name table) lives in one [`Compiler`]
//! value per call, so compilations are independent of each other.
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::NamingConfig;
use crate::data_type;
use crate::error::{CompileError, FieldPath, Result};
use crate::namer::{NameTable, TypeNamer};
use crate::node::{ObjectNode, SchemaNode};
use crate::schema::{FieldEntry, ROOT, Schema, TypeDefinition};

// ------------------------------- Front API -------------------------------- //

/// Compile with default naming (`<Field>Type`).
pub fn compile(root: &ObjectNode) -> Result<Schema> {
    compile_with(root, &NamingConfig::default())
}

pub fn compile_with(root: &ObjectNode, naming: &NamingConfig) -> Result<Schema> {
    Compiler::new(naming).run(root)
}

/// Any node may be handed in; only an object without an override is a valid root.
pub fn compile_node(root: &SchemaNode, naming: &NamingConfig) -> Result<Schema> {
    match root {
        SchemaNode::Object(obj) => compile_with(obj, naming),
        SchemaNode::Leaf(_) => Err(CompileError::InvalidRoot { detail: "root is a leaf, expected an object".into() }),
        SchemaNode::Array(_) => Err(CompileError::InvalidRoot { detail: "root is an array, expected an object".into() }),
    }
}

/// Parse an authored JSON literal and compile it.
pub fn compile_value(value: &Value, naming: &NamingConfig) -> Result<Schema> {
    let root = SchemaNode::from_value(value)?;
    compile_node(&root, naming)
}

// ------------------------------- Compiler --------------------------------- //

pub struct Compiler<'c> {
    namer: TypeNamer<'c>,
    names: NameTable,
    types: IndexMap<String, TypeDefinition>,
}

impl<'c> Compiler<'c> {
    pub fn new(naming: &'c NamingConfig) -> Self {
        Self { namer: TypeNamer::new(naming), names: NameTable::new(), types: IndexMap::new() }
    }

    pub fn run(mut self, root: &ObjectNode) -> Result<Schema> {
        if let Some(name) = &root.name {
            return Err(CompileError::InvalidRoot {
                detail: format!("the root type is always `{ROOT}`, found override `{name}`"),
            });
        }
        let path = FieldPath::root();
        self.define(ROOT, root, &path)?;
        debug!(types = self.types.len(), "compiled schema");
        Ok(Schema::from_types(self.types))
    }

    /// Compile `node` under `type_name`, or check it against the definition
    /// already registered under that name.
    fn define(&mut self, type_name: &str, node: &ObjectNode, path: &FieldPath) -> Result<()> {
        if self.names.open(type_name, path)? {
            // Hold the slot so the output stays in pre-order.
            self.types.insert(type_name.to_string(), TypeDefinition::default());
            let def = self.compile_object(node, type_name, path)?;
            self.types.insert(type_name.to_string(), def);
            self.names.close(type_name);
            trace!(type_name, path = %path, "synthesized type");
        } else {
            let def = self.compile_object(node, type_name, path)?;
            if let Some(existing) = self.types.get(type_name) {
                self.names.check_shared(type_name, existing, &def, path)?;
            }
            trace!(type_name, path = %path, "shared type");
        }
        Ok(())
    }

    fn compile_object(&mut self, node: &ObjectNode, type_name: &str, path: &FieldPath) -> Result<TypeDefinition> {
        let mut def = TypeDefinition::default();
        for (field, child) in &node.fields {
            let child_path = path.child(field);
            let (entry_name, entry) = self.compile_field(field, child, &child_path)?;
            if def.fields.contains_key(&entry_name) {
                return Err(CompileError::DuplicateField {
                    field: entry_name,
                    type_name: type_name.to_string(),
                    path: child_path,
                });
            }
            def.fields.insert(entry_name, entry);
        }
        Ok(def)
    }

    fn compile_field(&mut self, field: &str, node: &SchemaNode, path: &FieldPath) -> Result<(String, FieldEntry)> {
        let (node, is_array) = unwrap_array(node, path)?;
        match node {
            SchemaNode::Leaf(leaf) => Ok((field.to_string(), data_type::resolve(leaf).array(is_array))),
            SchemaNode::Object(obj) => {
                let named = self.namer.name_for(obj, path)?;
                self.define(&named.type_name, obj, path)?;
                Ok((named.entry_name, FieldEntry::of_type(named.type_name).array(is_array)))
            }
            // Only reachable through `unwrap_array`: an array element that is itself an array.
            SchemaNode::Array(_) => Err(CompileError::NestedArray { path: path.clone() }),
        }
    }
}

fn unwrap_array<'n>(node: &'n SchemaNode, path: &FieldPath) -> Result<(&'n SchemaNode, bool)> {
    match node {
        SchemaNode::Array(elems) => match elems.as_slice() {
            [element] => Ok((element, true)),
            _ => Err(CompileError::InvalidArrayShape { path: path.clone(), len: elems.len() }),
        },
        other => Ok((other, false)),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::{DataType, ValidationRule};
    use serde_json::json;

    fn compile_json(value: Value) -> Result<Schema> {
        compile_value(&value, &NamingConfig::default())
    }

    #[test]
    fn nested_objects_become_named_types() {
        let schema = compile_json(json!({
            "foo": { "bar": { "baz": { "$ref": "BooleanType" } } }
        }))
        .unwrap();
        assert_eq!(
            schema.to_json().unwrap(),
            json!({
                "ROOT": { "foo": { "type": "FooType" } },
                "FooType": { "bar": { "type": "BarType" } },
                "BarType": { "baz": { "type": "BooleanType" } }
            })
        );
        assert_eq!(schema.type_names().collect::<Vec<_>>(), ["ROOT", "FooType", "BarType"]);
    }

    #[test]
    fn array_field_sets_is_array_on_element_type() {
        let schema = compile_json(json!({
            "foo": [ { "bar": { "$type": "String", "validation": [{ "kind": "required" }] } } ]
        }))
        .unwrap();
        let root = schema.root().unwrap();
        assert_eq!(root.get("foo"), Some(&FieldEntry::of_type("FooType").array(true)));
        let foo = schema.get("FooType").unwrap();
        assert_eq!(foo.get("bar").unwrap().type_name, "String");
        assert!(!foo.get("bar").unwrap().is_array);
    }

    #[test]
    fn array_of_leaf_keeps_leaf_attributes() {
        let schema = compile_json(json!({
            "tags": [ { "$type": "String", "format": "lower" } ]
        }))
        .unwrap();
        assert_eq!(
            schema.root().unwrap().get("tags").map(|e| serde_json::to_value(e).unwrap()),
            Some(json!({ "type": "String", "isArray": true, "format": "lower" }))
        );
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn override_renames_type_and_parent_entry() {
        let schema = compile_json(json!({
            "foo": { "$name": "buzz", "x": { "$ref": "NumberType" } }
        }))
        .unwrap();
        assert_eq!(
            schema.to_json().unwrap(),
            json!({
                "ROOT": { "buzz": { "type": "BuzzType" } },
                "BuzzType": { "x": { "type": "NumberType" } }
            })
        );
    }

    #[test]
    fn root_fields_match_authored_fields() {
        let root = ObjectNode::new()
            .field("name", DataType::new("String").with_rule(ValidationRule::new("required").with_message("Required")))
            .field("active", SchemaNode::reference("BooleanType"))
            .field("address", ObjectNode::new().field("city", SchemaNode::reference("StringType")))
            .field("lines", SchemaNode::array_of(ObjectNode::new()));
        let schema = compile(&root).unwrap();
        let keys: Vec<_> = schema.root().unwrap().fields.keys().cloned().collect();
        assert_eq!(keys, ["name", "active", "address", "lines"]);
        // Empty object is a legal placeholder type.
        assert!(schema.get("LinesType").unwrap().is_empty());
    }

    #[test]
    fn reference_leaf_has_no_extra_keys() {
        let schema = compile_json(json!({ "a": { "$ref": "DateType" } })).unwrap();
        assert_eq!(schema.to_json().unwrap()["ROOT"]["a"], json!({ "type": "DateType" }));
    }

    #[test]
    fn compilation_is_deterministic() {
        let input = json!({
            "customer": { "name": { "$type": "String" }, "emails": [ { "address": { "$ref": "Email" } } ] },
            "orders": [ { "$name": "order", "total": { "$type": "Money", "format": { "currency": "USD" } } } ],
            "notes": [ { "$ref": "Text" } ]
        });
        let a = serde_json::to_string(&compile_json(input.clone()).unwrap()).unwrap();
        let b = serde_json::to_string(&compile_json(input).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn identical_subtrees_share_a_name() {
        let schema = compile_json(json!({
            "billing": { "address": { "city": { "$ref": "StringType" } } },
            "shipping": { "address": { "city": { "$ref": "StringType" } } }
        }))
        .unwrap();
        assert_eq!(
            schema.type_names().collect::<Vec<_>>(),
            ["ROOT", "BillingType", "AddressType", "ShippingType"]
        );
    }

    #[test]
    fn different_subtrees_under_same_name_collide() {
        let err = compile_json(json!({
            "billing": { "address": { "city": { "$ref": "StringType" } } },
            "shipping": { "address": { "zip": { "$ref": "StringType" } } }
        }))
        .unwrap_err();
        match err {
            CompileError::TypeNameCollision { name, path, first } => {
                assert_eq!(name, "AddressType");
                assert_eq!(path.to_string(), "shipping.address");
                assert_eq!(first.to_string(), "billing.address");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn self_named_descendant_collides() {
        let err = compile_json(json!({ "foo": { "foo": { "x": { "$ref": "T" } } } })).unwrap_err();
        assert_eq!(err.kind(), "TypeNameCollision");
    }

    #[test]
    fn array_shape_errors_carry_path() {
        for (input, len) in [(json!({ "a": { "b": [] } }), 0), (json!({ "a": { "b": [{}, {}] } }), 2)] {
            match compile_json(input).unwrap_err() {
                CompileError::InvalidArrayShape { path, len: got } => {
                    assert_eq!(path.to_string(), "a.b");
                    assert_eq!(got, len);
                }
                other => panic!("unexpected: {other}"),
            }
        }
        let err = compile_json(json!({ "grid": [[{ "$ref": "Cell" }]] })).unwrap_err();
        assert!(matches!(err, CompileError::NestedArray { .. }));
    }

    #[test]
    fn ambiguous_leaf_aborts_whole_compilation() {
        let err = compile_json(json!({
            "ok": { "$ref": "BooleanType" },
            "foo": { "$ref": "BooleanType", "sibling": { "$ref": "X" } }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), "AmbiguousNode");
        assert_eq!(err.path().unwrap().to_string(), "foo");
    }

    #[test]
    fn overrides_to_same_entry_name_are_duplicates() {
        let err = compile_json(json!({
            "a": { "$name": "thing", "x": { "$ref": "T" } },
            "b": { "$name": "thing", "x": { "$ref": "T" } }
        }))
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateField { ref field, ref type_name, .. } if field == "thing" && type_name == "ROOT"));
    }

    #[test]
    fn unnameable_object_fields_are_rejected() {
        let err = compile_json(json!({
            "home": { "2nd address!": { "city": { "$ref": "StringType" } } }
        }))
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidTypeName { ref name, .. } if name == "2ndAddress!Type"));
        assert_eq!(err.path().unwrap().to_string(), "home.2nd address!");

        // Leaves synthesize no type, so their field names are free-form.
        let schema = compile_json(json!({ "2nd address!": { "$ref": "StringType" } })).unwrap();
        assert!(schema.root().unwrap().get("2nd address!").is_some());
    }

    #[test]
    fn invalid_roots() {
        let naming = NamingConfig::default();
        for input in [json!({ "$ref": "X" }), json!([{}]), json!({ "$name": "top" })] {
            let err = compile_value(&input, &naming).unwrap_err();
            assert_eq!(err.kind(), "InvalidRoot", "{input}");
        }
    }

    #[test]
    fn referenced_names_are_defined_or_external() {
        let schema = compile_json(json!({
            "user": { "name": { "$type": "String" }, "born": { "$ref": "DateType" } },
            "flags": [ { "$ref": "BooleanType" } ]
        }))
        .unwrap();
        let external: Vec<_> = schema.external_references().into_iter().collect();
        assert_eq!(external, ["BooleanType", "DateType", "String"]);
        assert!(schema.referenced_names().contains("UserType"));
    }

    #[test]
    fn custom_suffix_flows_through() {
        let naming = NamingConfig { type_suffix: "Model".into() };
        let schema = compile_value(&json!({ "line_items": [ { "sku": { "$ref": "Sku" } } ] }), &naming).unwrap();
        assert_eq!(schema.root().unwrap().get("line_items").unwrap().type_name, "LineItemsModel");
    }
}
