//! Compile author-friendly nested schema literals into a flat type graph, and
//! build lazy binding proxies that render paths into the same literal.
//!
//! ```
//! use schemabind::{compile_value, make_proxy, NamingConfig, SchemaNode};
//! use serde_json::json;
//!
//! let literal = json!({ "foo": { "bar": { "baz": { "$ref": "BooleanType" } } } });
//!
//! let schema = compile_value(&literal, &NamingConfig::default()).unwrap();
//! assert_eq!(schema.to_json().unwrap(), json!({
//!     "ROOT": { "foo": { "type": "FooType" } },
//!     "FooType": { "bar": { "type": "BarType" } },
//!     "BarType": { "baz": { "type": "BooleanType" } }
//! }));
//!
//! let root = SchemaNode::from_value(&literal).unwrap();
//! let baz = make_proxy(&root).field("foo").field("bar").field("baz");
//! assert_eq!(baz.path(), "foo.bar.baz");
//! assert_eq!(baz.template().as_str(), "{{foo.bar.baz}}");
//! ```
pub mod binding;
pub mod compiler;
pub mod config;
pub mod data_type;
pub mod error;
pub mod namer;
pub mod node;
pub mod schema;

pub use binding::{BindingProxy, Segment, Slot, TemplateValue, make_proxy, make_proxy_with};
pub use compiler::{Compiler, compile, compile_node, compile_value, compile_with};
pub use config::{BindingStyle, Config, NamingConfig};
pub use data_type::{DataType, DataTypeRef, Leaf, ValidationRule, resolve};
pub use error::{CompileError, FieldPath, Result};
pub use node::{ObjectNode, SchemaNode};
pub use schema::{FieldEntry, ROOT, Schema, TypeDefinition};
