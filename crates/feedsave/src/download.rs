//! Media downloads
//!
//! Saves the media behind a clicked control into a directory. Each fetch runs
//! on its own thread; `wait` joins them before the process exits.

use anyhow::{Context, Result};
use feedsave_core::{ResolvedUrl, UrlHandler};
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// Used when the URL has no usable last path segment
const DEFAULT_FILENAME: &str = "image.jpg";

/// Saves resolved media into a directory
pub struct SaveHandler {
    dir: PathBuf,
    client: reqwest::blocking::Client,
    pending: RefCell<Vec<JoinHandle<()>>>,
}

impl SaveHandler {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let client = reqwest::blocking::Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            dir,
            client,
            pending: RefCell::new(Vec::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Downloads started and not yet joined
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Block until every started download has finished
    pub fn wait(&self) {
        let handles: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("download thread panicked");
            }
        }
    }
}

impl UrlHandler for SaveHandler {
    fn handle(&self, url: Option<&ResolvedUrl>) {
        let Some(url) = url else {
            tracing::warn!("No media URL found");
            return;
        };

        let url = url.as_str().to_string();
        let path = self.dir.join(filename_from_url(&url));
        let client = self.client.clone();

        tracing::debug!(%url, path = %path.display(), "starting download");
        let handle = thread::spawn(move || match fetch(&client, &url, &path) {
            Ok(bytes) => tracing::info!(%url, path = %path.display(), bytes, "saved"),
            Err(e) => tracing::error!(%url, "download failed: {e:#}"),
        });
        self.pending.borrow_mut().push(handle);
    }
}

impl std::fmt::Debug for SaveHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveHandler")
            .field("dir", &self.dir)
            .field("pending", &self.pending())
            .finish()
    }
}

fn fetch(client: &reqwest::blocking::Client, url: &str, path: &Path) -> Result<u64> {
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .context("request failed")?;
    let bytes = response.bytes().context("failed to read body")?;

    let mut file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(&bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(bytes.len() as u64)
}

/// Last path segment of the URL, query and fragment excluded
fn filename_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|name| !name.is_empty())
                .map(String::from)
        })
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}
