//! feedsave core - media discovery and URL resolution
//!
//! Finds images and videos on a feed page as they appear, decides which are
//! real content, resolves a direct URL for each and attaches exactly one
//! "Save" control per element.
//!
//! ```text
//! MutationWatcher ─▶ ContainerScanner ─▶ EligibilityFilter
//!        ▲                  │                   │
//! LifecycleCoordinator      ▼                   ▼
//!  (address poll)     MediaResolver ─▶ ControlAttacher ─▶ UrlHandler
//! ```

mod attach;
mod config;
mod decode;
mod error;
mod filter;
mod handler;
mod lifecycle;
mod media;
mod resolver;
mod scanner;
mod watcher;

pub use attach::ControlAttacher;
pub use config::{ControlConfig, MediaConfig, ProfileLabelPolicy, VideoStrategyKind};
pub use decode::{decode_payload_url, percent_decode_component, unescape_separators};
pub use error::{MediaError, PayloadError};
pub use filter::{EligibilityFilter, SkipReason, Verdict};
pub use handler::{LogHandler, UrlHandler};
pub use lifecycle::LifecycleCoordinator;
pub use media::{MediaElement, MediaKind, ResolvedUrl};
pub use resolver::{MediaResolver, PatternStrategy, StructuredStrategy, VideoSourceStrategy};
pub use scanner::{ContainerScanner, ScanReport};
pub use watcher::{MutationWatcher, WatcherState};
