//! Mutation watcher
//!
//! Observes the document body for added nodes and rescans the content
//! containers that newly added media belong to.

use crate::{ContainerScanner, ScanReport};
use feedsave_dom::{Document, MutationObserverInit, MutationRecord, NodeId, ObserverId};

/// Watcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatcherState {
    #[default]
    Idle,
    Active(ObserverId),
}

/// Mutation watcher
#[derive(Debug, Default)]
pub struct MutationWatcher {
    state: WatcherState,
}

impl MutationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, WatcherState::Active(_))
    }

    /// Start observing the body subtree, stopping any previous observer first.
    /// Returns `false` when the document has no body.
    pub fn start(&mut self, doc: &mut Document) -> bool {
        self.stop(doc);

        let Some(body) = doc.body() else {
            tracing::warn!("document has no body; watcher stays idle");
            return false;
        };

        let tree = doc.tree_mut();
        let observer = tree.create_observer();
        tree.observe(observer, body, MutationObserverInit {
            child_list: true,
            subtree: true,
            ..Default::default()
        });
        self.state = WatcherState::Active(observer);
        tracing::info!(?observer, "mutation watcher started");
        true
    }

    /// Stop observing. Queued records are discarded.
    pub fn stop(&mut self, doc: &mut Document) {
        if let WatcherState::Active(observer) = std::mem::take(&mut self.state) {
            let tree = doc.tree_mut();
            tree.disconnect(observer);
            tree.remove_observer(observer);
            tracing::info!(?observer, "mutation watcher stopped");
        }
    }

    /// Whether a batch is waiting for delivery
    pub fn has_pending(&self, doc: &Document) -> bool {
        match self.state {
            WatcherState::Active(observer) => doc.tree().has_pending_records(observer),
            WatcherState::Idle => false,
        }
    }

    /// Deliver the queued batch: take it from the document and process it.
    pub fn deliver(&mut self, doc: &mut Document, scanner: &ContainerScanner) -> ScanReport {
        let WatcherState::Active(observer) = self.state else {
            return ScanReport::default();
        };
        let records = doc.tree_mut().take_records(observer);
        self.process(doc, scanner, &records)
    }

    /// Process one batch of records
    pub fn process(&self, doc: &mut Document, scanner: &ContainerScanner, records: &[MutationRecord]) -> ScanReport {
        if !self.is_active() || records.is_empty() {
            return ScanReport::default();
        }

        let containers = affected_containers(doc, scanner, records);
        tracing::debug!(records = records.len(), containers = containers.len(), "processing mutation batch");

        let mut report = ScanReport::default();
        for container in containers {
            report += scanner.scan(doc, Some(container));
        }
        report
    }
}

/// Containers of added media, first-seen order, each once
fn affected_containers(doc: &Document, scanner: &ContainerScanner, records: &[MutationRecord]) -> Vec<NodeId> {
    let tree = doc.tree();
    let mut containers: Vec<NodeId> = Vec::new();
    let mut push = |container: Option<NodeId>| {
        if let Some(container) = container {
            if !containers.contains(&container) {
                containers.push(container);
            }
        }
    };

    for &node in records.iter().flat_map(|r| r.added_nodes.iter()) {
        // Nodes removed again before delivery are gone from the page
        if !tree.is_element(node) || !tree.is_connected(node) {
            continue;
        }
        if scanner.is_media(tree, node) {
            push(scanner.container_of(tree, node));
        }
        for media in scanner.media_within(tree, node) {
            push(scanner.container_of(tree, media));
        }
    }

    containers
}
