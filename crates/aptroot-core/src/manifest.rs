//! Package manifest (`Aptfile`) parsing.
//!
//! The manifest is a YAML sequence of strings in the application's build
//! directory, one requirement per entry, in install order:
//!
//! ```yaml
//! - libpq-dev
//! - https://example.com/pkgs/custom-tool.deb
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use crate::types::{Requirement, RequirementError};

/// File name of the manifest inside the build directory.
pub const MANIFEST_FILE: &str = "Aptfile";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid entry #{index} in {path}: {source}")]
    Entry {
        path: PathBuf,
        index: usize,
        #[source]
        source: RequirementError,
    },
}

/// An ordered list of package requirements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    pub requirements: Vec<Requirement>,
}

impl Manifest {
    /// Read and parse `<build_dir>/Aptfile`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable, is not a YAML
    /// sequence of strings, or contains an empty entry.
    pub async fn load(build_dir: &Path) -> Result<Self, ManifestError> {
        let path = build_dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| ManifestError::Read {
                path: path.clone(),
                source,
            })?;

        Self::parse(&content, &path)
    }

    /// Parse manifest text. `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// See [`Manifest::load`].
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ManifestError> {
        if is_blank(content) {
            return Ok(Self::default());
        }

        let entries: Option<Vec<String>> =
            serde_yaml::from_str(content).map_err(|source| ManifestError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;

        let requirements = entries
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                Requirement::parse(entry).map_err(|source| ManifestError::Entry {
                    path: origin.to_path_buf(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { requirements })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }
}

/// Only whitespace and `#` comments: an empty document.
fn is_blank(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}
