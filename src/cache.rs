use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Log file written by `browse` when debug is on.
pub const LOG_FILE: &str = "csvdeck.log";

/// Files owned by the cache directory. Uploaded data lives in the data
/// directory and is never listed here.
const CACHE_FILES: &[&str] = &[LOG_FILE];

/// Per-user cache directory (`<cache dir>/csvdeck`).
#[derive(Debug, Clone)]
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| eyre!("Could not determine cache directory"))?
            .join(app_name);
        Ok(Self { cache_dir })
    }

    /// Cache rooted at `cache_dir` (tests)
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the browser's debug log goes. The directory is created by the logger.
    pub fn log_path(&self) -> PathBuf {
        self.cache_dir.join(LOG_FILE)
    }

    /// Remove every known cache file. Returns how many were removed.
    pub fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        for filename in CACHE_FILES {
            let path = self.cache_dir.join(filename);
            if !path.exists() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("Warning: Could not remove cache file {}: {}", filename, e),
            }
        }
        Ok(removed)
    }
}
