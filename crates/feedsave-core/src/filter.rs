//! Eligibility filter
//!
//! Decides whether a media element should ever receive a control. Pure: reads
//! the document, never writes it.

use crate::config::{MediaConfig, ProfileLabelPolicy, Selectors};
use crate::{MediaError, MediaKind};
use feedsave_dom::{Document, NodeId, SelectorList};

/// Why an element was passed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Node does not exist
    Missing,
    /// Not an `img` or `video` element
    NotMedia,
    /// No parent element to anchor a control to
    NoParent,
    /// Parent already holds a control
    AlreadyProcessed,
    /// Inside navigation, menu or link chrome
    Chrome,
    /// Image labelled as a profile picture
    ProfilePicture,
    /// Address is in a viewing mode where controls are suppressed
    SuppressedMode,
}

/// Filter outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Eligible(MediaKind),
    Skip(SkipReason),
}

impl Verdict {
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible(_))
    }
}

/// Eligibility filter
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    chrome: SelectorList,
    marker: SelectorList,
    policy: ProfileLabelPolicy,
    profile_suffixes: Vec<String>,
    suppressed_addresses: Vec<String>,
}

impl EligibilityFilter {
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let selectors = Selectors::compile(config)?;
        Ok(Self::from_parts(config, &selectors))
    }

    pub(crate) fn from_parts(config: &MediaConfig, selectors: &Selectors) -> Self {
        Self {
            chrome: selectors.chrome.clone(),
            marker: selectors.marker.clone(),
            policy: config.profile_policy,
            profile_suffixes: config.profile_suffixes.clone(),
            suppressed_addresses: config.suppressed_addresses.clone(),
        }
    }

    /// Judge one candidate node
    pub fn check(&self, doc: &Document, node: NodeId) -> Verdict {
        let tree = doc.tree();
        if tree.get(node).is_none() {
            return Verdict::Skip(SkipReason::Missing);
        }
        let Some(kind) = MediaKind::of(tree, node) else {
            return Verdict::Skip(SkipReason::NotMedia);
        };
        if self.is_suppressed(doc.url()) {
            return Verdict::Skip(SkipReason::SuppressedMode);
        }
        let Some(parent) = tree.parent_element(node) else {
            return Verdict::Skip(SkipReason::NoParent);
        };
        if tree.query_selector(parent, &self.marker).is_some() {
            return Verdict::Skip(SkipReason::AlreadyProcessed);
        }
        if tree.closest(node, &self.chrome).is_some() {
            return Verdict::Skip(SkipReason::Chrome);
        }
        if kind == MediaKind::Image && self.is_profile_label(tree.get_attribute(node, "alt")) {
            return Verdict::Skip(SkipReason::ProfilePicture);
        }
        Verdict::Eligible(kind)
    }

    /// Convenience wrapper around [`check`](Self::check)
    pub fn is_eligible(&self, doc: &Document, node: NodeId) -> bool {
        self.check(doc, node).is_eligible()
    }

    fn is_suppressed(&self, address: &str) -> bool {
        self.suppressed_addresses.iter().any(|marker| address.contains(marker.as_str()))
    }

    fn is_profile_label(&self, label: Option<&str>) -> bool {
        let label = label.unwrap_or_default().trim();
        let has_suffix = self.profile_suffixes.iter().any(|s| label.ends_with(s.as_str()));
        match self.policy {
            ProfileLabelPolicy::Suffix => has_suffix,
            ProfileLabelPolicy::SuffixOrEmpty => has_suffix || label.is_empty(),
        }
    }
}
