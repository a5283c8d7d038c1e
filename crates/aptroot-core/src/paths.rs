use std::path::{Path, PathBuf};

/// Pipeline-private directories under the staging cache root.
///
/// ```text
/// <cache>/apt/
/// ├── cache/          # index tool cache (dir::cache)
/// │   └── archives/   # fetched .deb files
/// └── state/          # index tool state (dir::state)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    cache_dir: PathBuf,
    state_dir: PathBuf,
}

impl CacheLayout {
    /// Derive the layout from the staging cache root.
    pub fn new(cache_root: &Path) -> Self {
        let apt = cache_root.join("apt");
        Self {
            cache_dir: apt.join("cache"),
            state_dir: apt.join("state"),
        }
    }

    /// Index tool cache directory: `<cache>/apt/cache`
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Index tool state directory: `<cache>/apt/state`
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Archives cache: `<cache>/apt/cache/archives`
    pub fn archives_dir(&self) -> PathBuf {
        self.cache_dir.join("archives")
    }

    /// Cache location for an archive with the given file name.
    pub fn archive_path(&self, file_name: &str) -> PathBuf {
        self.archives_dir().join(file_name)
    }

    /// Create every directory of the layout. Existing directories are fine.
    ///
    /// # Errors
    ///
    /// Returns the path that could not be created together with the IO error.
    pub fn ensure(&self) -> Result<(), (PathBuf, std::io::Error)> {
        for dir in [self.archives_dir(), self.state_dir.clone()] {
            std::fs::create_dir_all(&dir).map_err(|e| (dir.clone(), e))?;
        }
        Ok(())
    }
}
