//! The "handle resolved URL" collaborator
//!
//! Controls forward their URL here when clicked. What happens next (save,
//! open, copy) belongs to the implementation, not to the engine.

use crate::ResolvedUrl;

/// Receives resolved URLs from clicked controls
pub trait UrlHandler {
    fn handle(&self, url: Option<&ResolvedUrl>);
}

impl<F> UrlHandler for F
where
    F: Fn(Option<&ResolvedUrl>),
{
    fn handle(&self, url: Option<&ResolvedUrl>) {
        self(url)
    }
}

/// Logs each URL
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHandler;

impl UrlHandler for LogHandler {
    fn handle(&self, url: Option<&ResolvedUrl>) {
        match url {
            Some(url) => tracing::info!(kind = ?url.kind(), "media URL: {}", url),
            None => tracing::warn!("No media URL found"),
        }
    }
}
