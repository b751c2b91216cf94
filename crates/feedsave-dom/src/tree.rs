//! DOM Tree (arena-based allocation)
//!
//! Nodes live in one `Vec` and link to each other by [`NodeId`]. Child-list
//! changes made through the tree queue mutation records for any registered
//! observer whose scope covers the change.

use crate::node::NodeData;
use crate::observer::ObserverRegistry;
use crate::{
    InternedString, MutationObserverInit, MutationRecord, Node, NodeId, ObserverId, SelectorList,
    StringInterner,
};

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node not found")]
    NotFound,
    #[error("hierarchy request error")]
    HierarchyRequest,
    #[error("invalid node type")]
    InvalidNodeType,
    #[error("node is not a child")]
    NotAChild,
}

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    interner: StringInterner,
    observers: ObserverRegistry,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            interner: StringInterner::new(),
            observers: ObserverRegistry::default(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Resolve an interned name
    pub fn resolve(&self, name: InternedString) -> &str {
        self.interner.get(name)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = self.interner.intern(&tag.to_ascii_lowercase());
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text.to_string()))
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push(Node {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data: NodeData::Doctype { name: name.to_string() },
        })
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        let parent_node = self.get(parent).ok_or(DomError::NotFound)?;
        if !matches!(parent_node.data, NodeData::Document | NodeData::Element(_)) {
            return Err(DomError::InvalidNodeType);
        }
        let child_node = self.get(child).ok_or(DomError::NotFound)?;
        if matches!(child_node.data, NodeData::Document) {
            return Err(DomError::InvalidNodeType);
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }

        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child)?;
        }

        let previous = self.link_last(parent, child);
        self.notify(MutationRecord::child_list(parent, vec![child], Vec::new(), previous, None));
        Ok(child)
    }

    /// Detach `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        let node = self.get(child).ok_or(DomError::NotFound)?;
        if node.parent != parent {
            return Err(DomError::NotAChild);
        }
        let (prev, next) = (node.prev_sibling, node.next_sibling);

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;

        self.notify(MutationRecord::child_list(parent, Vec::new(), vec![child], prev.option(), next.option()));
        Ok(child)
    }

    /// Remove every child of `parent`
    pub fn clear_children(&mut self, parent: NodeId) -> DomResult<()> {
        for child in self.child_ids(parent) {
            self.remove_child(parent, child)?;
        }
        Ok(())
    }

    /// Link without validation or notification. Returns the previous last child.
    pub(crate) fn link_last(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        let previous = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = previous;
            node.next_sibling = NodeId::NONE;
        }
        if previous.is_valid() {
            self.nodes[previous.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;
        previous.option()
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.option())
    }

    /// Parent of a node, if it is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id)
            .filter(|&p| self.get(p).is_some_and(Node::is_element))
    }

    /// Direct children with their nodes
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Direct child IDs
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(|(child, _)| child).collect()
    }

    /// All descendants of `id` in document order (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(start) = self.get(id) else {
            return out;
        };

        let mut next = start.first_child;
        while next.is_valid() {
            out.push(next);
            let node = &self.nodes[next.index()];
            if node.first_child.is_valid() {
                next = node.first_child;
                continue;
            }

            let mut cursor = next;
            next = NodeId::NONE;
            while cursor.is_valid() && cursor != id {
                let node = &self.nodes[cursor.index()];
                if node.next_sibling.is_valid() {
                    next = node.next_sibling;
                    break;
                }
                cursor = node.parent;
            }
        }
        out
    }

    /// Ancestors of `id`, nearest first (excluding `id`)
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id).unwrap_or(NodeId::NONE),
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if self.get(node).is_none() {
            return false;
        }
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is attached to the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root(), id)
    }

    // ------------------------------------------------------------------
    // Elements and attributes
    // ------------------------------------------------------------------

    /// Lowercase tag name, if the node is an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        let elem = self.get(id)?.as_element()?;
        Some(self.interner.get(elem.name))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    /// Get an attribute value
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let elem = self.get(id)?.as_element()?;
        let name = self.interner.lookup(name)?;
        elem.get_attr(name)
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let name_id = self.interner.intern(&name.to_ascii_lowercase());
        let elem = self
            .get_mut(id)
            .ok_or(DomError::NotFound)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        elem.set_attr(name_id, value.to_string());
        Ok(())
    }

    /// Whether the element's class list contains `class`
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get_attribute(id, "class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.get(d).and_then(Node::as_text))
            .collect()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Element matches selector
    pub fn matches(&self, id: NodeId, selector: &SelectorList) -> bool {
        selector.matches(self, id)
    }

    /// Descendant elements of `root` matching `selector`, in document order
    pub fn query_selector_all(&self, root: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| selector.matches(self, id))
            .collect()
    }

    /// First descendant element of `root` matching `selector`
    pub fn query_selector(&self, root: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| selector.matches(self, id))
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, id: NodeId, selector: &SelectorList) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&a| selector.matches(self, a))
    }

    // ------------------------------------------------------------------
    // Mutation observers
    // ------------------------------------------------------------------

    pub fn create_observer(&mut self) -> ObserverId {
        self.observers.create()
    }

    pub fn observe(&mut self, observer: ObserverId, target: NodeId, options: MutationObserverInit) -> bool {
        if self.get(target).is_none() {
            return false;
        }
        self.observers.observe(observer, target, options)
    }

    /// Stop observing and drop queued records
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.disconnect(observer);
    }

    pub fn remove_observer(&mut self, observer: ObserverId) {
        self.observers.remove(observer);
    }

    /// Take the batch of records queued for `observer`
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers.take_records(observer)
    }

    pub fn has_pending_records(&self, observer: ObserverId) -> bool {
        self.observers.has_pending(observer)
    }

    fn notify(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let interested = self
            .observers
            .interested(&record, |ancestor, node| self.contains(ancestor, node));
        if !interested.is_empty() {
            tracing::trace!(node = ?record.target, added = record.added_nodes.len(), "queued mutation record");
            self.observers.enqueue(&interested, record);
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Iterator over ancestors, nearest first
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.parent;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let article = tree.create_element("ARTICLE");
        let div = tree.create_element("div");
        let img = tree.create_element("img");
        tree.append_child(tree.root(), article).unwrap();
        tree.append_child(article, div).unwrap();
        tree.append_child(div, img).unwrap();
        (tree, article, div, img)
    }

    #[test]
    fn test_append_and_walk() {
        let (mut tree, article, div, img) = sample();
        let span = tree.create_element("span");
        tree.append_child(article, span).unwrap();

        assert_eq!(tree.tag_name(article), Some("article"));
        assert_eq!(tree.child_ids(article), vec![div, span]);
        assert_eq!(tree.descendants(tree.root()), vec![article, div, img, span]);
        assert_eq!(tree.descendants(div), vec![img]);
        assert_eq!(tree.ancestors(img).collect::<Vec<_>>(), vec![div, article, NodeId::ROOT]);
        assert!(tree.contains(article, img));
        assert!(!tree.contains(img, article));
    }

    #[test]
    fn test_hierarchy_errors() {
        let (mut tree, article, div, img) = sample();
        assert_eq!(tree.append_child(img, article), Err(DomError::HierarchyRequest));
        assert_eq!(tree.append_child(div, div), Err(DomError::HierarchyRequest));
        assert_eq!(tree.remove_child(article, img), Err(DomError::NotAChild));
        let text = tree.create_text("x");
        assert_eq!(tree.append_child(text, img), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn test_move_between_parents() {
        let (mut tree, article, div, img) = sample();
        tree.append_child(article, img).unwrap();
        assert_eq!(tree.child_ids(div), Vec::<NodeId>::new());
        assert_eq!(tree.child_ids(article), vec![div, img]);
        assert_eq!(tree.parent(img), Some(article));
    }

    #[test]
    fn test_attributes_and_classes() {
        let (mut tree, _, div, _) = sample();
        tree.set_attribute(div, "Class", "feed item").unwrap();
        assert!(tree.has_class(div, "item"));
        assert!(!tree.has_class(div, "it"));
        assert_eq!(tree.get_attribute(div, "class"), Some("feed item"));
        assert_eq!(tree.get_attribute(div, "never-interned"), None);
    }

    #[test]
    fn test_closest_and_query() {
        let (tree, article, div, img) = sample();
        let containers = SelectorList::parse("article, section").unwrap();
        let media = SelectorList::parse("img, video").unwrap();
        assert_eq!(tree.closest(img, &containers), Some(article));
        assert_eq!(tree.closest(article, &containers), Some(article));
        assert_eq!(tree.closest(div, &media), None);
        assert_eq!(tree.query_selector_all(tree.root(), &media), vec![img]);
        assert_eq!(tree.query_selector(article, &media), Some(img));
    }

    #[test]
    fn test_observer_subtree_records() {
        let (mut tree, article, div, _) = sample();
        let observer = tree.create_observer();
        assert!(tree.observe(observer, article, MutationObserverInit {
            child_list: true,
            subtree: true,
            ..Default::default()
        }));

        // Built detached: no records until the subtree is attached
        let item = tree.create_element("div");
        let video = tree.create_element("video");
        tree.append_child(item, video).unwrap();
        assert!(!tree.has_pending_records(observer));

        tree.append_child(div, item).unwrap();
        // Attribute writes are not recorded
        tree.set_attribute(div, "style", "position: relative").unwrap();

        let records = tree.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, div);
        assert_eq!(records[0].added_nodes, vec![item]);
        assert!(tree.take_records(observer).is_empty());
    }

    #[test]
    fn test_disconnect_stops_recording() {
        let (mut tree, article, _, _) = sample();
        let observer = tree.create_observer();
        tree.observe(observer, article, MutationObserverInit {
            child_list: true,
            subtree: true,
            ..Default::default()
        });
        let first = tree.create_element("img");
        tree.append_child(article, first).unwrap();
        tree.disconnect(observer);
        let second = tree.create_element("img");
        tree.append_child(article, second).unwrap();
        assert!(tree.take_records(observer).is_empty());
    }

    #[test]
    fn test_text_content() {
        let mut tree = DomTree::new();
        let script = tree.create_element("script");
        let text = tree.create_text(r#"{"url":"x"}"#);
        tree.append_child(script, text).unwrap();
        assert_eq!(tree.text_content(script), r#"{"url":"x"}"#);
    }
}
