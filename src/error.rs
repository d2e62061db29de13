//! Compilation errors. Every variant carries the field-name chain from the
//! root so the offending node can be located in the authored literal.
use std::fmt;
use thiserror::Error;

pub type Result<T, E = CompileError> = std::result::Result<T, E>;

// ————————————————————————————————————————————————————————————————————————————
// FIELD PATH
// ————————————————————————————————————————————————————————————————————————————

/// Authored field names walked from the root, e.g. `foo.bar.baz`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }
    pub fn child(&self, field: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(field.to_string());
        Self(segments)
    }
    pub fn segments(&self) -> &[String] {
        &self.0
    }
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A node carries a data-type marker alongside authored fields (or two markers).
    #[error("ambiguous node at `{path}`: {detail}")]
    AmbiguousNode { path: FieldPath, detail: String },

    #[error("array at `{path}` must wrap exactly one element shape, found {len}")]
    InvalidArrayShape { path: FieldPath, len: usize },

    #[error("array at `{path}` wraps another array; nested arrays are not supported")]
    NestedArray { path: FieldPath },

    #[error("unrecognized data type at `{path}`: {detail}")]
    UnrecognizedDataType { path: FieldPath, detail: String },

    #[error("type name `{name}` synthesized at `{path}` collides with a different definition first named at `{first}`")]
    TypeNameCollision { name: String, path: FieldPath, first: FieldPath },

    #[error("field `{field}` appears twice in type `{type_name}` (at `{path}`)")]
    DuplicateField { field: String, type_name: String, path: FieldPath },

    #[error("invalid type name `{name}` at `{path}`")]
    InvalidTypeName { name: String, path: FieldPath },

    #[error("reserved key `{key}` at `{path}`")]
    ReservedKey { key: String, path: FieldPath },

    #[error("invalid root: {detail}")]
    InvalidRoot { detail: String },
}

impl CompileError {
    /// Stable variant name, used by golden fixtures (`error.txt`).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AmbiguousNode { .. } => "AmbiguousNode",
            Self::InvalidArrayShape { .. } => "InvalidArrayShape",
            Self::NestedArray { .. } => "NestedArray",
            Self::UnrecognizedDataType { .. } => "UnrecognizedDataType",
            Self::TypeNameCollision { .. } => "TypeNameCollision",
            Self::DuplicateField { .. } => "DuplicateField",
            Self::InvalidTypeName { .. } => "InvalidTypeName",
            Self::ReservedKey { .. } => "ReservedKey",
            Self::InvalidRoot { .. } => "InvalidRoot",
        }
    }

    /// Location of the offending node, if the error has one.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::AmbiguousNode { path, .. }
            | Self::InvalidArrayShape { path, .. }
            | Self::NestedArray { path }
            | Self::UnrecognizedDataType { path, .. }
            | Self::TypeNameCollision { path, .. }
            | Self::DuplicateField { path, .. }
            | Self::InvalidTypeName { path, .. }
            | Self::ReservedKey { path, .. } => Some(path),
            Self::InvalidRoot { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_path_display() {
        assert_eq!(FieldPath::root().to_string(), "<root>");
        let p = FieldPath::root().child("foo").child("bar");
        assert_eq!(p.to_string(), "foo.bar");
        assert_eq!(p, ["foo", "bar"].into_iter().collect::<FieldPath>());
    }

    #[test]
    fn error_messages_carry_path() {
        let err = CompileError::AmbiguousNode {
            path: FieldPath::root().child("foo"),
            detail: "leaf marker `$ref` next to field `bar`".into(),
        };
        assert_eq!(err.kind(), "AmbiguousNode");
        assert!(err.to_string().contains("`foo`"));
        assert_eq!(err.path().map(|p| p.to_string()).as_deref(), Some("foo"));
    }
}
