//! DOM Events
//!
//! User-interaction events dispatched to listeners registered on nodes.
//! Dispatch walks from the target up through its ancestors (bubbling).

use crate::NodeId;
use std::rc::Rc;

/// DOM event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEventType {
    Click,
}

/// DOM event
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub event_type: DomEventType,
    pub target: NodeId,
    pub current_target: NodeId,
}

impl DomEvent {
    /// Create a click event aimed at `target`
    pub fn click(target: NodeId) -> Self {
        Self {
            event_type: DomEventType::Click,
            target,
            current_target: target,
        }
    }
}

/// Event listener callback
pub type EventListener = Rc<dyn Fn(&DomEvent)>;

/// Listener table keyed by node and event type
#[derive(Default)]
pub(crate) struct ListenerTable {
    entries: Vec<(NodeId, DomEventType, EventListener)>,
}

impl ListenerTable {
    pub fn add(&mut self, node: NodeId, event_type: DomEventType, listener: EventListener) {
        self.entries.push((node, event_type, listener));
    }

    pub fn count(&self, node: NodeId, event_type: DomEventType) -> usize {
        self.entries
            .iter()
            .filter(|(n, t, _)| *n == node && *t == event_type)
            .count()
    }

    /// Listeners for one node, cloned so callbacks may run without borrowing the table
    pub fn listeners(&self, node: NodeId, event_type: DomEventType) -> Vec<EventListener> {
        self.entries
            .iter()
            .filter(|(n, t, _)| *n == node && *t == event_type)
            .map(|(_, _, l)| Rc::clone(l))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerTable")
            .field("listeners", &self.entries.len())
            .finish()
    }
}
