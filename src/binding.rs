//! Binding proxies: lazy path references mirroring the authored tree.
//!
//! A proxy is a cursor over the authored shape plus the path walked so far.
//! Descending is O(1): the path is a persistent chain of `Arc` links shared
//! with the parent proxy, and the shape lookup touches a single map entry.
//! Nothing is rendered until one of the materializers runs.
//!
//! Proxies never check a path against the compiled schema. Unknown names are
//! accepted and rendered as written.
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::config::BindingStyle;
use crate::node::SchemaNode;

static DEFAULT_STYLE: Lazy<BindingStyle> = Lazy::new(BindingStyle::default);

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Any element of an array field.
    Wildcard,
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Slot(Slot),
}

#[derive(Debug)]
struct Link {
    segment: Segment,
    parent: Option<Arc<Link>>,
}

// Unlink iteratively so very deep chains don't recurse on drop.
impl Drop for Link {
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(link) = next {
            match Arc::try_unwrap(link) {
                Ok(mut inner) => next = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct BindingProxy<'a> {
    /// Authored node at this position, when the path is still inside the tree.
    shape: Option<&'a SchemaNode>,
    tail: Option<Arc<Link>>,
    style: &'a BindingStyle,
}

/// A path wrapped for embedding in template content, e.g. `{{foo.bar}}`.
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TemplateValue(String);

impl TemplateValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TemplateValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTION
// ————————————————————————————————————————————————————————————————————————————

/// Root proxy over `root` with the default rendering style.
pub fn make_proxy(root: &SchemaNode) -> BindingProxy<'_> {
    make_proxy_with(root, &DEFAULT_STYLE)
}

pub fn make_proxy_with<'a>(root: &'a SchemaNode, style: &'a BindingStyle) -> BindingProxy<'a> {
    BindingProxy { shape: Some(root), tail: None, style }
}

impl<'a> BindingProxy<'a> {
    /// Descend by authored field name.
    ///
    /// A known child carrying a name override renders under the override, the
    /// same key the compiled parent entry uses. Array-shaped children append
    /// a wildcard slot and continue with the element shape.
    pub fn field(&self, name: &str) -> BindingProxy<'a> {
        let child = match self.shape {
            Some(SchemaNode::Object(obj)) => obj.get(name),
            _ => None,
        };
        let (element, is_array) = match child {
            Some(SchemaNode::Array(elems)) => (elems.first(), true),
            other => (other, false),
        };
        let rendered = match element {
            Some(SchemaNode::Object(obj)) => obj.name.as_deref().unwrap_or(name),
            _ => name,
        };

        let mut tail = push(&self.tail, Segment::Field(rendered.to_string()));
        if is_array {
            tail = push(&tail, Segment::Slot(Slot::Wildcard));
        }
        BindingProxy { shape: element, tail, style: self.style }
    }

    /// Pin an array position. Replaces a trailing wildcard, otherwise appends
    /// (`foo.at(0).at(1)` → `foo[0][1]`).
    pub fn at(&self, index: usize) -> BindingProxy<'a> {
        let segment = Segment::Slot(Slot::Index(index));
        match &self.tail {
            Some(link) if link.segment == Segment::Slot(Slot::Wildcard) => BindingProxy {
                shape: self.shape,
                tail: push(&link.parent, segment),
                style: self.style,
            },
            _ => {
                let shape = match self.shape {
                    Some(SchemaNode::Array(elems)) => elems.first(),
                    other => other,
                };
                BindingProxy { shape, tail: push(&self.tail, segment), style: self.style }
            }
        }
    }

    /// Pin the wildcard closest to the end of the path, wherever it sits:
    /// `orders[*].lines[*].sku` → `orders[*].lines[3].sku`. `None` when the
    /// path has no wildcard. Segments after the slot are re-linked; the ones
    /// before it stay shared.
    pub fn pin_last_wildcard(&self, index: usize) -> Option<BindingProxy<'a>> {
        let mut after = Vec::new();
        let mut cursor = self.tail.as_ref();
        while let Some(link) = cursor {
            if link.segment == Segment::Slot(Slot::Wildcard) {
                let mut tail = push(&link.parent, Segment::Slot(Slot::Index(index)));
                for segment in after.into_iter().rev() {
                    tail = push(&tail, segment);
                }
                return Some(BindingProxy { shape: self.shape, tail, style: self.style });
            }
            after.push(link.segment.clone());
            cursor = link.parent.as_ref();
        }
        None
    }

    /// Descend a dotted chain of authored field names: `walk("a.b.c")`.
    pub fn walk(&self, dotted: &str) -> BindingProxy<'a> {
        dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .fold(self.clone(), |proxy, name| proxy.field(name))
    }

    /// Authored node at this position, if the path is still inside the tree.
    pub fn shape(&self) -> Option<&'a SchemaNode> {
        self.shape
    }

    pub fn is_root(&self) -> bool {
        self.tail.is_none()
    }

    pub fn depth(&self) -> usize {
        self.links().count()
    }

    /// Segments from the root, in walk order.
    pub fn segments(&self) -> Vec<Segment> {
        let mut out: Vec<Segment> = self.links().map(|l| l.segment.clone()).collect();
        out.reverse();
        out
    }

    fn links(&self) -> impl Iterator<Item = &Link> {
        std::iter::successors(self.tail.as_deref(), |link| link.parent.as_deref())
    }

    // ---------------------------- Materializers ---------------------------- //

    /// `foo.bar[*].baz`; the root renders as an empty string.
    pub fn path(&self) -> String {
        let mut segments: Vec<&Segment> = self.links().map(|l| &l.segment).collect();
        segments.reverse();

        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Field(name) => {
                    if !out.is_empty() {
                        out.push_str(&self.style.separator);
                    }
                    out.push_str(name);
                }
                Segment::Slot(Slot::Wildcard) => {
                    out.push('[');
                    out.push_str(&self.style.wildcard);
                    out.push(']');
                }
                Segment::Slot(Slot::Index(ix)) => {
                    out.push('[');
                    out.push_str(&ix.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    /// `{{foo.bar}}`
    pub fn template(&self) -> TemplateValue {
        let style = self.style;
        TemplateValue(format!("{}{}{}", style.template_open, self.path(), style.template_close))
    }

    /// `$.foo.bar`; the root renders as the bare prefix.
    pub fn back_reference(&self) -> String {
        let path = self.path();
        let prefix = &self.style.back_reference_prefix;
        if path.is_empty() {
            prefix.clone()
        } else {
            format!("{prefix}{}{path}", self.style.separator)
        }
    }
}

fn push(parent: &Option<Arc<Link>>, segment: Segment) -> Option<Arc<Link>> {
    Some(Arc::new(Link { segment, parent: parent.clone() }))
}

impl fmt::Display for BindingProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl PartialEq for BindingProxy<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.style == other.style && self.segments() == other.segments()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
