//! Mutation Observer
//!
//! Observers register interest in a target (optionally its whole subtree).
//! The tree queues a [`MutationRecord`] for every interested observer as it
//! mutates; the host delivers queued records later, in one batch, with
//! [`DomTree::take_records`](crate::DomTree::take_records).

use crate::NodeId;

/// Observer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Child-list mutation record
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl MutationRecord {
    pub fn child_list(
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self {
            target,
            added_nodes: added,
            removed_nodes: removed,
            previous_sibling,
            next_sibling,
        }
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub subtree: bool,
}

#[derive(Debug)]
struct Observer {
    id: ObserverId,
    observations: Vec<(NodeId, MutationObserverInit)>,
    pending: Vec<MutationRecord>,
}

/// Observers registered on one tree
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    observers: Vec<Observer>,
}

impl ObserverRegistry {
    pub fn create(&mut self) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.push(Observer {
            id,
            observations: Vec::new(),
            pending: Vec::new(),
        });
        id
    }

    fn find_mut(&mut self, id: ObserverId) -> Option<&mut Observer> {
        self.observers.iter_mut().find(|o| o.id == id)
    }

    /// Observe a target; re-observing the same target replaces its options
    pub fn observe(&mut self, id: ObserverId, target: NodeId, options: MutationObserverInit) -> bool {
        let Some(observer) = self.find_mut(id) else {
            return false;
        };
        match observer.observations.iter_mut().find(|(t, _)| *t == target) {
            Some(entry) => entry.1 = options,
            None => observer.observations.push((target, options)),
        }
        true
    }

    /// Stop observing everything and drop queued records
    pub fn disconnect(&mut self, id: ObserverId) {
        if let Some(observer) = self.find_mut(id) {
            observer.observations.clear();
            observer.pending.clear();
        }
    }

    pub fn remove(&mut self, id: ObserverId) {
        self.observers.retain(|o| o.id != id);
    }

    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.find_mut(id)
            .map(|o| std::mem::take(&mut o.pending))
            .unwrap_or_default()
    }

    pub fn has_pending(&self, id: ObserverId) -> bool {
        self.observers
            .iter()
            .any(|o| o.id == id && !o.pending.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Indices of observers that want `record`.
    ///
    /// `contains(ancestor, node)` must answer inclusive ancestry in the tree
    /// as it is *after* the mutation was applied.
    pub fn interested(&self, record: &MutationRecord, contains: impl Fn(NodeId, NodeId) -> bool) -> Vec<usize> {
        self.observers
            .iter()
            .enumerate()
            .filter(|(_, observer)| {
                observer.observations.iter().any(|(target, options)| {
                    let in_scope =
                        *target == record.target || (options.subtree && contains(*target, record.target));
                    in_scope && options.child_list
                })
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn enqueue(&mut self, interested: &[usize], record: MutationRecord) {
        for &idx in interested {
            if let Some(observer) = self.observers.get_mut(idx) {
                observer.pending.push(record.clone());
            }
        }
    }
}
