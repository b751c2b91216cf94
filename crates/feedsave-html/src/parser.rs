//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it into the arena DOM.

use crate::ParseError;
use feedsave_dom::{Document, DomResult, DomTree, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// HTML5 parser
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a navigable address
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut document = Document::empty(url);
        let root = document.tree().root();
        for child in dom.document.children.borrow().iter() {
            match self.build(child, document.tree_mut()) {
                Ok(Some(id)) => {
                    if let Err(err) = document.tree_mut().append_child(root, id) {
                        tracing::warn!("Dropping top-level node: {}", err);
                    }
                }
                Ok(None) => {}
                Err(err) => tracing::warn!("Dropping top-level node: {}", err),
            }
        }

        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        document
    }

    /// Parse `html` as body content and append it to `parent`.
    ///
    /// Each top-level node is fully built before it is attached. Returns the
    /// inserted top-level nodes in order.
    pub fn parse_fragment_into(
        &self,
        html: &str,
        document: &mut Document,
        parent: NodeId,
    ) -> Result<Vec<NodeId>, ParseError> {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut inserted = Vec::new();
        for handle in fragment_nodes(&dom) {
            if let Some(id) = self.build(&handle, document.tree_mut())? {
                document.tree_mut().append_child(parent, id)?;
                inserted.push(id);
            }
        }

        tracing::debug!("Inserted {} fragment nodes", inserted.len());
        Ok(inserted)
    }

    /// Parse `html` as body content and append it to the document body
    pub fn append_to_body(&self, html: &str, document: &mut Document) -> Result<Vec<NodeId>, ParseError> {
        let body = document.body().ok_or(ParseError::NoBody)?;
        self.parse_fragment_into(html, document, body)
    }

    /// Convert one RcDom node (and its subtree) into a detached arena node
    fn build(&self, handle: &Handle, tree: &mut DomTree) -> DomResult<Option<NodeId>> {
        let id = match &handle.data {
            RcNodeData::Document | RcNodeData::ProcessingInstruction { .. } => return Ok(None),
            RcNodeData::Doctype { name, .. } => tree.create_doctype(name),
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if text.trim().is_empty() {
                    return Ok(None);
                }
                tree.create_text(&text)
            }
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    tree.set_attribute(id, &attr.name.local, &attr.value)?;
                }
                id
            }
        };

        for child in handle.children.borrow().iter() {
            if let Some(child_id) = self.build(child, tree)? {
                tree.append_child(id, child_id)?;
            }
        }

        Ok(Some(id))
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Children of the implied `<head>` then `<body>`: html5ever hoists leading
/// scripts into the head, and a fragment keeps them in source order that way.
fn fragment_nodes(dom: &RcDom) -> Vec<Handle> {
    let document_children = dom.document.children.borrow();
    let Some(html) = document_children.iter().find(|h| is_element(h, "html")) else {
        return Vec::new();
    };

    let sections = html.children.borrow();
    let mut nodes = Vec::new();
    for tag in ["head", "body"] {
        if let Some(section) = sections.iter().find(|h| is_element(h, tag)) {
            nodes.extend(section.children.borrow().iter().cloned());
        }
    }
    nodes
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(&handle.data, RcNodeData::Element { name, .. } if &*name.local == tag)
}
