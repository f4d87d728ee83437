//! Asset Loaders
//!
//! Fetch raw asset bytes by url. Loaders are shared across worker threads
//! while the catalog loads in parallel.

use crate::{AudioError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of raw asset bytes
pub trait AssetLoader: Send + Sync {
    /// Fetch the bytes behind `url`
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Loads assets from a directory on disk
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    /// Resolve urls relative to `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        FsLoader {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a url
    pub fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }
}

impl AssetLoader for FsLoader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.resolve(url);
        fs::read(&path).map_err(|e| AudioError::Load {
            url: url.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

/// Serves assets from memory
///
/// An optional fallback is returned for any url without an explicit entry.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    assets: HashMap<String, Vec<u8>>,
    fallback: Option<Vec<u8>>,
}

impl MemoryLoader {
    /// Empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that answers every url with the same bytes
    pub fn with_fallback(bytes: Vec<u8>) -> Self {
        MemoryLoader {
            assets: HashMap::new(),
            fallback: Some(bytes),
        }
    }

    /// Register bytes for a url
    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(url.into(), bytes);
    }

    /// Number of explicit entries
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// True when there are no explicit entries
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetLoader for MemoryLoader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.assets
            .get(url)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| AudioError::Load {
                url: url.to_string(),
                reason: "not found".into(),
            })
    }
}
