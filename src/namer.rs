//! Type naming.
//!
//! A synthesized type takes its name from the field that holds it, title-cased
//! with the configured suffix (`bar` → `BarType`). An explicit override on the
//! node replaces the field name both in the type name and in the parent entry.
//!
//! [`NameTable`] tracks which names a single compilation has handed out. It is
//! owned by that compilation; nothing is shared between runs.
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::NamingConfig;
use crate::error::{CompileError, FieldPath, Result};
use crate::node::ObjectNode;
use crate::schema::TypeDefinition;

/// Overrides and synthesized type names must both be identifiers.
static IDENT_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_]*$").expect("static regex"));

/// Result of naming an object node held by a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedName {
    /// Key used for the entry in the parent definition.
    pub entry_name: String,
    /// Name of the synthesized type.
    pub type_name: String,
}

#[derive(Debug, Clone)]
pub struct TypeNamer<'c> {
    config: &'c NamingConfig,
}

impl<'c> TypeNamer<'c> {
    pub fn new(config: &'c NamingConfig) -> Self {
        Self { config }
    }

    /// Name for `node`, held by the last segment of `path`.
    pub fn name_for(&self, node: &ObjectNode, path: &FieldPath) -> Result<AssignedName> {
        let field = path.segments().last().map(String::as_str).unwrap_or_default();
        let entry_name = match &node.name {
            None => field,
            Some(name) if IDENT_RX.is_match(name) => name.as_str(),
            Some(name) => return Err(CompileError::InvalidTypeName { name: name.clone(), path: path.clone() }),
        };
        let type_name = self.type_name(entry_name);
        if !IDENT_RX.is_match(&type_name) {
            return Err(CompileError::InvalidTypeName { name: type_name, path: path.clone() });
        }
        Ok(AssignedName { entry_name: entry_name.to_string(), type_name })
    }

    pub fn type_name(&self, base: &str) -> String {
        let mut out = title_case(base);
        out.push_str(&self.config.type_suffix);
        out
    }
}

/// `bar` → `Bar`, `line_items` → `LineItems`, `fooBar` → `FooBar`.
pub fn title_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

// ————————————————————————————————————————————————————————————————————————————
// COLLISIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
struct Claim {
    first: FieldPath,
    /// Definition is still being compiled (we are somewhere inside it).
    open: bool,
}

#[derive(Debug, Default)]
pub struct NameTable {
    claims: HashMap<String, Claim>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `name` before compiling its body. Reopening a name that is
    /// still open means the node would contain itself: always a collision.
    /// Returns `true` when the name is new.
    pub fn open(&mut self, name: &str, path: &FieldPath) -> Result<bool> {
        match self.claims.get(name) {
            None => {
                self.claims.insert(name.to_string(), Claim { first: path.clone(), open: true });
                Ok(true)
            }
            Some(Claim { first, open: true }) => Err(CompileError::TypeNameCollision {
                name: name.to_string(),
                path: path.clone(),
                first: first.clone(),
            }),
            Some(Claim { open: false, .. }) => Ok(false),
        }
    }

    /// Mark a newly opened name as finished.
    pub fn close(&mut self, name: &str) {
        if let Some(claim) = self.claims.get_mut(name) {
            claim.open = false;
        }
    }

    /// Compare a second definition under an already closed name. Structurally
    /// equal definitions share the name; anything else collides.
    pub fn check_shared(
        &self,
        name: &str,
        existing: &TypeDefinition,
        candidate: &TypeDefinition,
        path: &FieldPath,
    ) -> Result<()> {
        if existing == candidate {
            return Ok(());
        }
        let first = self.claims.get(name).map(|c| c.first.clone()).unwrap_or_default();
        Err(CompileError::TypeNameCollision { name: name.to_string(), path: path.clone(), first })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
