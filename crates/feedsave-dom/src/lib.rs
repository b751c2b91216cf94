//! feedsave DOM - Document Object Model
//!
//! Arena-backed DOM tree used by the feedsave engine. Nodes are addressed by
//! [`NodeId`] indices, tag and attribute names are interned, and the tree
//! queues mutation records for registered observers the way a browser does.

mod document;
mod events;
mod interner;
mod node;
mod observer;
mod selector;
mod tree;

pub use document::Document;
pub use events::{DomEvent, DomEventType, EventListener};
pub use interner::{InternedString, StringInterner};
pub use node::{Attribute, ElementData, Node, NodeData};
pub use observer::{MutationObserverInit, MutationRecord, ObserverId};
pub use selector::{CompoundSelector, SelectorError, SelectorList};
pub use tree::{DomError, DomResult, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this ID points at a node rather than the sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}
