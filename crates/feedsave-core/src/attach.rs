//! Control attacher
//!
//! Puts one overlay button next to an eligible media element and wires its
//! click to the [`UrlHandler`].

use crate::config::{ControlConfig, MediaConfig, Selectors};
use crate::{MediaElement, MediaError, ResolvedUrl, UrlHandler};
use feedsave_dom::{Document, DomEvent, DomEventType, DomResult, NodeId, SelectorList};
use std::rc::Rc;

/// Attaches controls
pub struct ControlAttacher {
    control: ControlConfig,
    marker: SelectorList,
    handler: Rc<dyn UrlHandler>,
}

impl ControlAttacher {
    pub fn new(config: &MediaConfig, handler: Rc<dyn UrlHandler>) -> Result<Self, MediaError> {
        let selectors = Selectors::compile(config)?;
        Ok(Self::from_parts(config, &selectors, handler))
    }

    pub(crate) fn from_parts(config: &MediaConfig, selectors: &Selectors, handler: Rc<dyn UrlHandler>) -> Self {
        Self {
            control: config.control.clone(),
            marker: selectors.marker.clone(),
            handler,
        }
    }

    /// Attach a control for `media`. Returns the control node, or `None` when
    /// the parent is missing or already holds a control.
    pub fn attach(&self, doc: &mut Document, media: &MediaElement, url: ResolvedUrl) -> Option<NodeId> {
        let Some(parent) = doc.tree().parent_element(media.node) else {
            tracing::debug!(node = ?media.node, "no parent to anchor control");
            return None;
        };
        if doc.tree().query_selector(parent, &self.marker).is_some() {
            return None;
        }

        let button = match self.insert(doc, parent) {
            Ok(button) => button,
            Err(err) => {
                tracing::debug!(node = ?media.node, "control not inserted: {}", err);
                return None;
            }
        };

        let handler = Rc::clone(&self.handler);
        doc.add_event_listener(
            button,
            DomEventType::Click,
            Rc::new(move |_: &DomEvent| handler.handle(Some(&url))),
        );

        tracing::debug!(node = ?media.node, control = ?button, "control attached");
        Some(button)
    }

    fn insert(&self, doc: &mut Document, parent: NodeId) -> DomResult<NodeId> {
        let tree = doc.tree_mut();

        let button = tree.create_element("button");
        tree.set_attribute(button, "type", "button")?;
        tree.set_attribute(button, "class", &self.control.class)?;
        tree.set_attribute(button, "style", &self.control.style)?;
        let label = tree.create_text(&self.control.label);
        tree.append_child(button, label)?;

        let anchored = merge_style(tree.get_attribute(parent, "style"), &self.control.anchor_style);
        tree.set_attribute(parent, "style", &anchored)?;
        tree.append_child(parent, button)
    }
}

impl std::fmt::Debug for ControlAttacher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlAttacher")
            .field("control", &self.control)
            .finish_non_exhaustive()
    }
}

/// Append one declaration to an inline style
fn merge_style(existing: Option<&str>, declaration: &str) -> String {
    let existing = existing.unwrap_or_default().trim().trim_end_matches(';').trim_end();
    if existing.is_empty() {
        declaration.to_string()
    } else if existing.contains(declaration) {
        existing.to_string()
    } else {
        format!("{existing}; {declaration}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MediaKind;
    use std::cell::RefCell;

    #[test]
    fn test_merge_style() {
        assert_eq!(merge_style(None, "position: relative"), "position: relative");
        assert_eq!(merge_style(Some("width: 10px;"), "position: relative"), "width: 10px; position: relative");
        assert_eq!(merge_style(Some("position: relative"), "position: relative"), "position: relative");
    }

    #[test]
    fn test_attach_once_and_click() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let handler: Rc<dyn UrlHandler> = Rc::new(move |url: Option<&ResolvedUrl>| {
            sink.borrow_mut().push(url.map(|u| u.as_str().to_string()));
        });
        let attacher = ControlAttacher::new(&MediaConfig::default(), handler).unwrap();

        let mut doc = Document::new("https://feed.example/");
        let body = doc.body().unwrap();
        let wrapper = doc.tree.create_element("div");
        let img = doc.tree.create_element("img");
        doc.tree.append_child(body, wrapper).unwrap();
        doc.tree.append_child(wrapper, img).unwrap();

        let media = MediaElement {
            node: img,
            kind: MediaKind::Image,
            owner_container: None,
        };
        let url = ResolvedUrl::new("https://cdn.example/a.jpg", MediaKind::Image);

        let button = attacher.attach(&mut doc, &media, url.clone()).unwrap();
        assert!(attacher.attach(&mut doc, &media, url).is_none());

        assert_eq!(doc.tree().parent(button), Some(wrapper));
        assert_eq!(doc.tree().text_content(button), "Save");
        assert_eq!(doc.tree().get_attribute(wrapper, "style"), Some("position: relative"));

        assert_eq!(doc.click(button), 1);
        assert_eq!(*seen.borrow(), vec![Some("https://cdn.example/a.jpg".to_string())]);
    }

    #[test]
    fn test_detached_media_is_noop() {
        let attacher = ControlAttacher::new(&MediaConfig::default(), Rc::new(crate::LogHandler)).unwrap();
        let mut doc = Document::default();
        let img = doc.tree.create_element("img");
        let media = MediaElement {
            node: img,
            kind: MediaKind::Image,
            owner_container: None,
        };
        let url = ResolvedUrl::new("https://cdn.example/a.jpg", MediaKind::Image);
        assert!(attacher.attach(&mut doc, &media, url).is_none());
        assert_eq!(doc.total_listeners(), 0);
    }
}
