//! Staging collaborator contract.
//!
//! The surrounding staging system owns the directory layout and the files
//! later phases consume. The pipeline only reads its paths and hands it
//! finished values to persist.

use std::path::{Path, PathBuf};

use crate::types::BuildpackConfig;

pub trait Stager: Send + Sync {
    /// Application source directory; holds the package manifest.
    fn build_dir(&self) -> &Path;

    /// Persistent cache root, private to this supplier.
    fn cache_dir(&self) -> &Path;

    /// Isolated dependency root that receives extracted payloads.
    ///
    /// Must be absolute: the extraction tool runs inside the archives cache.
    fn dep_dir(&self) -> PathBuf;

    /// Index of this supplier among the staged dependency roots.
    fn deps_idx(&self) -> &str;

    /// Persist one environment variable for later staging phases.
    fn write_env_file(&self, name: &str, value: &str) -> std::io::Result<()>;

    /// Persist a shell fragment sourced at launch.
    fn write_profile_d(&self, script: &str, content: &str) -> std::io::Result<()>;

    /// Write the completion marker for this dependency root.
    fn write_config_yml(&self, config: &BuildpackConfig) -> std::io::Result<()>;
}

impl<T: Stager + ?Sized> Stager for std::sync::Arc<T> {
    fn build_dir(&self) -> &Path {
        (**self).build_dir()
    }
    fn cache_dir(&self) -> &Path {
        (**self).cache_dir()
    }
    fn dep_dir(&self) -> PathBuf {
        (**self).dep_dir()
    }
    fn deps_idx(&self) -> &str {
        (**self).deps_idx()
    }
    fn write_env_file(&self, name: &str, value: &str) -> std::io::Result<()> {
        (**self).write_env_file(name, value)
    }
    fn write_profile_d(&self, script: &str, content: &str) -> std::io::Result<()> {
        (**self).write_profile_d(script, content)
    }
    fn write_config_yml(&self, config: &BuildpackConfig) -> std::io::Result<()> {
        (**self).write_config_yml(config)
    }
}
