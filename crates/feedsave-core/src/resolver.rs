//! URL resolution
//!
//! Images resolve from their own `src`. Videos on feed pages usually carry a
//! `blob:` source, so the direct address is dug out of the JSON payload
//! scripts the page embeds. Payloads are searched page-wide in document
//! order and the first one that yields a URL wins; nothing is cached between
//! calls.

use crate::config::{MediaConfig, Selectors, VideoStrategyKind};
use crate::decode::{decode_payload_url, ensure_absolute, percent_decode_component};
use crate::{MediaElement, MediaError, MediaKind, PayloadError, ResolvedUrl};
use feedsave_dom::{Document, NodeId, SelectorList};
use regex::Regex;
use serde_json::Value;

/// Finds a video URL inside one script payload
pub trait VideoSourceStrategy {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the payload holds no video URL
    fn find(&self, payload: &str) -> Result<Option<String>, PayloadError>;
}

/// Pattern match over the raw payload text
#[derive(Debug, Clone)]
pub struct PatternStrategy {
    pattern: Regex,
}

impl PatternStrategy {
    pub fn new(extensions: &[String]) -> Result<Self, MediaError> {
        let alternatives = extensions
            .iter()
            .map(|ext| regex::escape(ext))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r#""url":"(https:[^"]+\.(?:{alternatives}).*?)""#))?;
        Ok(Self { pattern })
    }
}

impl VideoSourceStrategy for PatternStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn find(&self, payload: &str) -> Result<Option<String>, PayloadError> {
        match self.pattern.captures(payload) {
            Some(caps) => decode_payload_url(&caps[1]).map(Some),
            None => Ok(None),
        }
    }
}

/// Parses the payload as JSON and walks it for `url` values
#[derive(Debug, Clone)]
pub struct StructuredStrategy {
    extensions: Vec<String>,
}

impl StructuredStrategy {
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| format!(".{}", e.to_ascii_lowercase())).collect(),
        }
    }

    fn is_video_url(&self, candidate: &str) -> bool {
        if !candidate.starts_with("https:") {
            return false;
        }
        url::Url::parse(candidate).is_ok_and(|parsed| {
            let path = parsed.path().to_ascii_lowercase();
            self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
        })
    }

    fn walk<'a>(&self, value: &'a Value) -> Option<&'a str> {
        match value {
            Value::Object(map) => map.iter().find_map(|(key, child)| match child {
                Value::String(s) if key == "url" && self.is_video_url(s) => Some(s.as_str()),
                _ => self.walk(child),
            }),
            Value::Array(items) => items.iter().find_map(|item| self.walk(item)),
            _ => None,
        }
    }
}

impl VideoSourceStrategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn find(&self, payload: &str) -> Result<Option<String>, PayloadError> {
        let value: Value = serde_json::from_str(payload).map_err(|e| PayloadError::Json(e.to_string()))?;
        match self.walk(&value) {
            Some(found) => ensure_absolute(percent_decode_component(found)?).map(Some),
            None => Ok(None),
        }
    }
}

/// Resolves media elements to direct URLs
pub struct MediaResolver {
    payloads: SelectorList,
    strategy: Box<dyn VideoSourceStrategy>,
}

impl MediaResolver {
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let selectors = Selectors::compile(config)?;
        Self::from_parts(config, &selectors)
    }

    pub(crate) fn from_parts(config: &MediaConfig, selectors: &Selectors) -> Result<Self, MediaError> {
        let strategy: Box<dyn VideoSourceStrategy> = match config.video_strategy {
            VideoStrategyKind::Pattern => Box::new(PatternStrategy::new(&config.video_extensions)?),
            VideoStrategyKind::Structured => Box::new(StructuredStrategy::new(&config.video_extensions)),
        };
        Ok(Self::with_strategy(selectors.payloads.clone(), strategy))
    }

    /// Resolver with a caller-supplied video strategy
    pub fn with_strategy(payloads: SelectorList, strategy: Box<dyn VideoSourceStrategy>) -> Self {
        Self { payloads, strategy }
    }

    /// Direct URL for `media`, or `None` when unresolved
    pub fn resolve(&self, doc: &Document, media: &MediaElement) -> Option<ResolvedUrl> {
        match media.kind {
            MediaKind::Image => self.resolve_image(doc, media.node),
            MediaKind::Video => self.resolve_video(doc),
        }
    }

    fn resolve_image(&self, doc: &Document, node: NodeId) -> Option<ResolvedUrl> {
        let src = doc.tree().get_attribute(node, "src")?.trim();
        if src.is_empty() {
            return None;
        }

        let absolute = url::Url::parse(src)
            .or_else(|_| url::Url::parse(doc.url()).and_then(|base| base.join(src)))
            .ok()?;
        Some(ResolvedUrl::new(absolute.as_str(), MediaKind::Image))
    }

    fn resolve_video(&self, doc: &Document) -> Option<ResolvedUrl> {
        let tree = doc.tree();
        for (index, script) in tree.query_selector_all(tree.root(), &self.payloads).into_iter().enumerate() {
            match self.strategy.find(&tree.text_content(script)) {
                Ok(Some(url)) => {
                    tracing::debug!(index, strategy = self.strategy.name(), "video URL found in payload");
                    return Some(ResolvedUrl::new(url, MediaKind::Video));
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(index, strategy = self.strategy.name(), "skipping payload: {}", err);
                }
            }
        }
        None
    }
}

impl std::fmt::Debug for MediaResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaResolver")
            .field("payloads", &self.payloads.as_str())
            .field("strategy", &self.strategy.name())
            .finish()
    }
}
