//! Document - High-level document API
//!
//! Owns the tree, the navigable address and the event listener table.

use crate::events::ListenerTable;
use crate::{DomEvent, DomEventType, DomTree, EventListener, NodeId};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Navigable address
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    listeners: ListenerTable,
}

impl Document {
    /// Create a document with an empty `html`/`head`/`body` skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        let root = tree.root();
        tree.link_last(root, html);
        tree.link_last(html, head);
        tree.link_last(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
            listeners: ListenerTable::default(),
        }
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            listeners: ListenerTable::default(),
        }
    }

    /// Locate `html`, `head` and `body` after the tree was built externally
    pub fn finalize(&mut self) {
        let root = self.tree.root();
        self.html_element = self.find_child(root, "html").unwrap_or(NodeId::NONE);
        if self.html_element.is_valid() {
            self.head_element = self.find_child(self.html_element, "head").unwrap_or(NodeId::NONE);
            self.body_element = self.find_child(self.html_element, "body").unwrap_or(NodeId::NONE);
        }
    }

    fn find_child(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.tree
            .child_ids(parent)
            .into_iter()
            .find(|&id| self.tree.tag_name(id) == Some(tag))
    }

    /// Current navigable address
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Same-document navigation (history push): the address changes, the page
    /// does not reload
    pub fn set_url(&mut self, url: &str) {
        tracing::debug!(from = %self.url, to = %url, "navigable address changed");
        self.url = url.to_string();
    }

    /// Get `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.html_element.option()
    }

    /// Get `<head>` element
    pub fn head(&self) -> Option<NodeId> {
        self.head_element.option()
    }

    /// Get `<body>` element
    pub fn body(&self) -> Option<NodeId> {
        self.body_element.option()
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&node| self.tree.get_attribute(node, "id") == Some(id))
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register a listener on a node
    pub fn add_event_listener(&mut self, target: NodeId, event_type: DomEventType, listener: EventListener) {
        self.listeners.add(target, event_type, listener);
    }

    /// Number of listeners of one type on a node
    pub fn listener_count(&self, target: NodeId, event_type: DomEventType) -> usize {
        self.listeners.count(target, event_type)
    }

    /// Total number of registered listeners
    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Dispatch an event to the target, then bubble it through its ancestors.
    /// Returns the number of listeners invoked.
    pub fn dispatch_event(&self, event: &DomEvent) -> usize {
        let path: Vec<NodeId> = std::iter::once(event.target)
            .chain(self.tree.ancestors(event.target))
            .collect();

        let mut invoked = 0;
        for node in path {
            let current = DomEvent {
                current_target: node,
                ..event.clone()
            };
            for listener in self.listeners.listeners(node, event.event_type) {
                listener(&current);
                invoked += 1;
            }
        }
        invoked
    }

    /// Simulate a user click on `target`
    pub fn click(&self, target: NodeId) -> usize {
        self.dispatch_event(&DomEvent::click(target))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
