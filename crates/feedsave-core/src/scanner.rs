//! Container scanner
//!
//! Drives filter → resolver → attacher over every media descendant of one
//! content container, in document order.

use crate::config::{MediaConfig, Selectors};
use crate::filter::{EligibilityFilter, Verdict};
use crate::{ControlAttacher, MediaElement, MediaError, MediaResolver, UrlHandler};
use feedsave_dom::{Document, DomTree, NodeId, SelectorList};
use std::ops::AddAssign;
use std::rc::Rc;

/// What a scan did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Containers scanned
    pub containers: usize,
    /// Media elements examined
    pub examined: usize,
    /// Controls attached
    pub attached: usize,
    /// Ineligible elements (including already processed ones)
    pub skipped: usize,
    /// Eligible elements whose URL could not be resolved
    pub unresolved: usize,
}

impl AddAssign for ScanReport {
    fn add_assign(&mut self, other: Self) {
        self.containers += other.containers;
        self.examined += other.examined;
        self.attached += other.attached;
        self.skipped += other.skipped;
        self.unresolved += other.unresolved;
    }
}

/// Container scanner
#[derive(Debug)]
pub struct ContainerScanner {
    containers: SelectorList,
    media: SelectorList,
    filter: EligibilityFilter,
    resolver: MediaResolver,
    attacher: ControlAttacher,
}

impl ContainerScanner {
    pub fn new(config: &MediaConfig, handler: Rc<dyn UrlHandler>) -> Result<Self, MediaError> {
        config.validate()?;
        let selectors = Selectors::compile(config)?;
        Ok(Self {
            containers: selectors.containers.clone(),
            media: selectors.media.clone(),
            filter: EligibilityFilter::from_parts(config, &selectors),
            resolver: MediaResolver::from_parts(config, &selectors)?,
            attacher: ControlAttacher::from_parts(config, &selectors, handler),
        })
    }

    /// Swap in a different resolver (e.g. another video strategy)
    pub fn with_resolver(mut self, resolver: MediaResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Nearest inclusive ancestor that is a content container
    pub fn container_of(&self, tree: &DomTree, node: NodeId) -> Option<NodeId> {
        tree.closest(node, &self.containers)
    }

    /// Node matches the media selector
    pub fn is_media(&self, tree: &DomTree, node: NodeId) -> bool {
        self.media.matches(tree, node)
    }

    /// Media descendants of `root` in document order
    pub fn media_within(&self, tree: &DomTree, root: NodeId) -> Vec<NodeId> {
        tree.query_selector_all(root, &self.media)
    }

    /// Scan one container. `None` is a no-op.
    pub fn scan(&self, doc: &mut Document, container: Option<NodeId>) -> ScanReport {
        let mut report = ScanReport::default();
        let Some(container) = container else {
            return report;
        };
        report.containers = 1;

        for node in self.media_within(doc.tree(), container) {
            report.examined += 1;

            let kind = match self.filter.check(doc, node) {
                Verdict::Eligible(kind) => kind,
                Verdict::Skip(reason) => {
                    tracing::trace!(?node, ?reason, "media skipped");
                    report.skipped += 1;
                    continue;
                }
            };

            let media = MediaElement {
                node,
                kind,
                owner_container: self.container_of(doc.tree(), node),
            };

            let Some(url) = self.resolver.resolve(doc, &media) else {
                tracing::debug!(?node, ?kind, "media URL unresolved");
                report.unresolved += 1;
                continue;
            };

            if self.attacher.attach(doc, &media, url).is_some() {
                report.attached += 1;
            } else {
                report.skipped += 1;
            }
        }

        report
    }

    /// Scan every container in the document, in document order
    pub fn scan_document(&self, doc: &mut Document) -> ScanReport {
        let tree = doc.tree();
        let containers = tree.query_selector_all(tree.root(), &self.containers);

        let mut report = ScanReport::default();
        for container in containers {
            report += self.scan(doc, Some(container));
        }
        tracing::debug!(?report, "document scan finished");
        report
    }
}
