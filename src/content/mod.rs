// SPDX-License-Identifier: MPL-2.0
//! The content tree: the hierarchical document that drives navigation.
//!
//! Loaded once from an XML content map at startup and never mutated; every
//! navigation resolves its target against this structure. Nodes are looked
//! up by id, and unknown ids are explicit errors rather than silently broken
//! branches.

pub mod parser;

use crate::error::{ContentError, Result};
use std::collections::HashMap;
use std::fmt;

/// Identifier of one addressable node of the content tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Kind of a content node, from its element name in the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Branch,
    Leaf,
}

/// One text row of a node: either a navigable link, an external anchor, a
/// footnote, or a whitespace spacer.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSpec {
    pub label: String,

    /// Set when the row navigates to another tree node on click.
    pub target: Option<NodeId>,

    /// External hyperlink; opened outside the viewer.
    pub href: Option<String>,

    /// With `href`: download the reference instead of navigating to it.
    pub download: bool,

    /// Rendered in the smaller footnote style.
    pub footnote: bool,
}

impl LinkSpec {
    /// A plain, non-interactive text row.
    #[must_use]
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: None,
            href: None,
            download: false,
            footnote: false,
        }
    }

    /// A row that navigates to `target` on click.
    #[must_use]
    pub fn navigation(label: impl Into<String>, target: NodeId) -> Self {
        Self {
            target: Some(target),
            ..Self::text(label)
        }
    }

    /// Whether the label carries no visible glyphs (spacer row).
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        !self.label.chars().any(|c| !c.is_whitespace())
    }
}

/// Descriptor of a leaf's image content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    pub url: String,
    pub native_width: u32,
    pub native_height: u32,
    pub zoomable: bool,
}

/// One addressable node: its kind, its text rows in document order, and an
/// optional image descriptor (leaves only, at most one).
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub links: Vec<LinkSpec>,
    pub image: Option<ImageSpec>,
}

/// The parsed, immutable content map.
#[derive(Debug, Clone)]
pub struct ContentTree {
    root: NodeId,
    nodes: HashMap<NodeId, ContentNode>,
}

impl ContentTree {
    pub(crate) fn new(root: NodeId, nodes: HashMap<NodeId, ContentNode>) -> Self {
        Self { root, nodes }
    }

    /// Id of the document root node.
    #[must_use]
    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    /// Looks a node up by id.
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&ContentNode> {
        self.nodes.get(id)
    }

    /// Looks a node up by id, failing with [`ContentError::UnknownTarget`]
    /// when absent.
    pub fn resolve(&self, id: &NodeId) -> Result<&ContentNode> {
        self.nodes
            .get(id)
            .ok_or_else(|| ContentError::UnknownTarget(id.to_string()).into())
    }

    /// Whether an id addresses a node of this tree.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of addressable nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
