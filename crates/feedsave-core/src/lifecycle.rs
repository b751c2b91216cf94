//! Lifecycle coordinator
//!
//! One instance per page session. Owns the watcher and the last seen
//! navigable address. Feed pages navigate without reloading, so the address is
//! polled; when it changes the watcher is rebuilt and the whole document is
//! rescanned to pick up content that was swapped in wholesale.

use crate::{ContainerScanner, MediaConfig, MediaError, MutationWatcher, ScanReport, UrlHandler};
use feedsave_dom::Document;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Lifecycle coordinator
#[derive(Debug)]
pub struct LifecycleCoordinator {
    scanner: ContainerScanner,
    watcher: MutationWatcher,
    last_address: Option<String>,
    poll_interval: Duration,
    last_poll: Option<Instant>,
}

impl LifecycleCoordinator {
    pub fn new(config: &MediaConfig, handler: Rc<dyn UrlHandler>) -> Result<Self, MediaError> {
        let scanner = ContainerScanner::new(config, handler)?;
        Ok(Self::with_scanner(scanner, config.poll_interval()))
    }

    pub fn with_scanner(scanner: ContainerScanner, poll_interval: Duration) -> Self {
        Self {
            scanner,
            watcher: MutationWatcher::new(),
            last_address: None,
            poll_interval,
            last_poll: None,
        }
    }

    pub fn scanner(&self) -> &ContainerScanner {
        &self.scanner
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Address recorded at the last (re)start
    pub fn current_address(&self) -> Option<&str> {
        self.last_address.as_deref()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_active()
    }

    /// Record the address, arm a fresh watcher and scan the whole document
    pub fn start(&mut self, doc: &mut Document) -> ScanReport {
        self.last_address = Some(doc.url().to_string());
        tracing::info!(address = doc.url(), "starting media session");
        self.arm(doc)
    }

    /// Stop watching
    pub fn stop(&mut self, doc: &mut Document) {
        self.watcher.stop(doc);
    }

    pub fn restart(&mut self, doc: &mut Document) -> ScanReport {
        self.stop(doc);
        self.start(doc)
    }

    /// Compare the address with the recorded one; on change re-arm and
    /// rescan. Returns the rescan report when a change was handled.
    pub fn poll(&mut self, doc: &mut Document) -> Option<ScanReport> {
        if self.last_address.as_deref() == Some(doc.url()) {
            return None;
        }

        tracing::info!(
            from = self.last_address.as_deref().unwrap_or(""),
            to = doc.url(),
            "navigation detected"
        );
        self.watcher.stop(doc);
        self.last_address = Some(doc.url().to_string());
        Some(self.arm(doc))
    }

    /// Timer tick: polls only when the interval has elapsed since the last poll
    pub fn on_timer(&mut self, doc: &mut Document, now: Instant) -> Option<ScanReport> {
        if let Some(last) = self.last_poll {
            if now.saturating_duration_since(last) < self.poll_interval {
                return None;
            }
        }
        self.last_poll = Some(now);
        self.poll(doc)
    }

    /// Deliver the watcher's queued mutation batch
    pub fn deliver_mutations(&mut self, doc: &mut Document) -> ScanReport {
        self.watcher.deliver(doc, &self.scanner)
    }

    fn arm(&mut self, doc: &mut Document) -> ScanReport {
        self.watcher.start(doc);
        let report = self.scanner.scan_document(doc);
        tracing::info!(
            containers = report.containers,
            attached = report.attached,
            unresolved = report.unresolved,
            "initial scan complete"
        );
        report
    }
}
