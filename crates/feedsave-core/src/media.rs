//! Media elements and resolved URLs

use feedsave_dom::{DomTree, NodeId, SelectorList};
use std::fmt;

/// Kind of media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Map a lowercase tag name
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "img" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Kind of the element at `node`
    pub fn of(tree: &DomTree, node: NodeId) -> Option<Self> {
        tree.tag_name(node).and_then(Self::from_tag)
    }
}

/// One discovered image or video element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaElement {
    pub node: NodeId,
    pub kind: MediaKind,
    /// Nearest content container, the element itself included
    pub owner_container: Option<NodeId>,
}

impl MediaElement {
    /// Wrap `node` if it is an `img` or `video` element
    pub fn from_node(tree: &DomTree, node: NodeId, containers: &SelectorList) -> Option<Self> {
        let kind = MediaKind::of(tree, node)?;
        Some(Self {
            node,
            kind,
            owner_container: tree.closest(node, containers),
        })
    }

    /// A control marker already sits under this element's parent
    pub fn is_processed(&self, tree: &DomTree, marker: &SelectorList) -> bool {
        tree.parent_element(self.node)
            .is_some_and(|parent| tree.query_selector(parent, marker).is_some())
    }
}

/// Direct, fetchable address of a media resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    url: String,
    kind: MediaKind,
}

impl ResolvedUrl {
    pub fn new(url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
