//! Engine configuration
//!
//! Every field has a default matching the feed markup the engine was written
//! against, so an empty TOML file (or no file at all) is a working setup.

use crate::MediaError;
use feedsave_dom::SelectorList;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Which images count as profile pictures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileLabelPolicy {
    /// Label ends with a configured suffix
    #[default]
    Suffix,
    /// Label ends with a configured suffix, or is empty/absent
    SuffixOrEmpty,
}

/// How video URLs are dug out of JSON payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStrategyKind {
    /// Pattern match on the raw script text
    #[default]
    Pattern,
    /// Parse the payload and walk it for `url` values
    Structured,
}

/// The injected control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Class that marks an attached control
    pub class: String,
    /// Button text
    pub label: String,
    /// Inline overlay style
    pub style: String,
    /// Declaration merged into the parent's style to anchor the overlay
    pub anchor_style: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            class: "feedsave-bt".to_string(),
            label: "Save".to_string(),
            style: concat!(
                "position: absolute; top: 1.5vh; right: 1.5vw; ",
                "padding: 0.4em 0.8em; font-size: 0.75rem; font-weight: 500; ",
                "font-family: system-ui, sans-serif; cursor: pointer; ",
                "border: 1px solid #ffffff; border-radius: 10px; ",
                "background: rgba(0, 0, 0, 0.4); backdrop-filter: blur(3px); ",
                "color: #ffffff; box-shadow: 0 2px 10px rgba(0, 0, 0, 0.5); ",
                "z-index: 2147483647;"
            )
            .to_string(),
            anchor_style: "position: relative".to_string(),
        }
    }
}

/// Engine configuration, loadable from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Content containers that scope a scan
    pub container_selector: String,
    /// Candidate media elements
    pub media_selector: String,
    /// Navigation, menu and link chrome whose media is never eligible
    pub chrome_selector: String,
    /// Script tags that may carry video descriptors
    pub payload_selector: String,
    pub control: ControlConfig,
    /// Address fragments that mark a transient viewing mode (no controls)
    pub suppressed_addresses: Vec<String>,
    pub profile_policy: ProfileLabelPolicy,
    /// Accessible-label endings that mark profile pictures
    pub profile_suffixes: Vec<String>,
    /// File extensions that identify a video resource (without the dot)
    pub video_extensions: Vec<String>,
    pub video_strategy: VideoStrategyKind,
    /// Navigation poll interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            container_selector: "article, section".to_string(),
            media_selector: "img, video".to_string(),
            chrome_selector: r#"div[role="menu"], div[role="navigation"], div[role="none"], a[role="link"]"#
                .to_string(),
            payload_selector: r#"script[type="application/json"]"#.to_string(),
            control: ControlConfig::default(),
            suppressed_addresses: vec!["https://www.instagram.com/stories".to_string()],
            profile_policy: ProfileLabelPolicy::Suffix,
            profile_suffixes: vec!["'s profile picture".to_string(), "Change profile photo".to_string()],
            video_extensions: vec!["mp4".to_string()],
            video_strategy: VideoStrategyKind::Pattern,
            poll_interval_ms: 500,
        }
    }
}

impl MediaConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, MediaError> {
        let text = std::fs::read_to_string(path).map_err(|source| MediaError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, MediaError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.poll_interval_ms == 0 {
            return Err(MediaError::ZeroInterval);
        }
        if let Some(bad) = self
            .video_extensions
            .iter()
            .find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(MediaError::VideoExtension(bad.clone()));
        }
        Selectors::compile(self).map(|_| ())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Compiled selector set
#[derive(Debug, Clone)]
pub(crate) struct Selectors {
    pub containers: SelectorList,
    pub media: SelectorList,
    pub chrome: SelectorList,
    pub payloads: SelectorList,
    pub marker: SelectorList,
}

impl Selectors {
    pub fn compile(config: &MediaConfig) -> Result<Self, MediaError> {
        let parse = |field: &'static str, source: &str| {
            SelectorList::parse(source).map_err(|source| MediaError::Selector { field, source })
        };

        Ok(Self {
            containers: parse("container", &config.container_selector)?,
            media: parse("media", &config.media_selector)?,
            chrome: parse("chrome", &config.chrome_selector)?,
            payloads: parse("payload", &config.payload_selector)?,
            marker: parse("control class", &format!(".{}", config.control.class))?,
        })
    }
}
