//! Default location of the result cache.

use meridian_data::{Result, ResultCache};
use std::path::{Path, PathBuf};

/// Default cache directory.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/meridian/`
/// - macOS: `~/Library/Caches/meridian/`
/// - Windows: `%LOCALAPPDATA%\meridian\`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meridian")
}

/// Default cache database path.
pub fn default_cache_path() -> PathBuf {
    default_cache_dir().join("meridian.db")
}

/// Open the cache at `path`, creating its directory if needed.
pub fn open_cache(path: &Path) -> Result<ResultCache> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    ResultCache::open(path)
}
