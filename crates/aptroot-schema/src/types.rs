use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// File-name suffix that marks a binary package archive.
pub const ARCHIVE_SUFFIX: &str = ".deb";

/// Errors that can occur when classifying a manifest entry.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RequirementError {
    /// The entry was empty (or only whitespace).
    #[error("Empty requirement")]
    Empty,

    /// The entry ends in the archive suffix but has no file name before it.
    #[error("Archive URL has no file name: {0}")]
    MissingFileName(String),
}

/// A package name as understood by the index tool (e.g. `libpq-dev`).
///
/// Names are passed through verbatim; the index tool is the authority on
/// what constitutes a valid name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageName(String);

impl PackageName {
    /// Wrap a package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::ffi::OsStr> for PackageName {
    fn as_ref(&self) -> &std::ffi::OsStr {
        self.0.as_ref()
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One entry of the package manifest.
///
/// The two kinds are told apart exactly once, in [`Requirement::parse`]:
/// an entry ending in [`ARCHIVE_SUFFIX`] is a direct archive URL, anything
/// else is a package name for the index tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A bare package name, resolved and fetched by the index tool.
    Package(PackageName),
    /// A direct archive URL, fetched over HTTP.
    Archive {
        /// The full URL as written in the manifest.
        url: String,
        /// Final path segment of the URL; the archive is cached under this name.
        file_name: String,
    },
}

impl Requirement {
    /// Classify a manifest entry. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RequirementError::Empty`] for an empty entry and
    /// [`RequirementError::MissingFileName`] for a URL whose final path
    /// segment is empty.
    pub fn parse(entry: &str) -> Result<Self, RequirementError> {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(RequirementError::Empty);
        }

        if entry.ends_with(ARCHIVE_SUFFIX) {
            let file_name = filename_from_url(entry);
            if file_name.is_empty() || file_name == ARCHIVE_SUFFIX {
                return Err(RequirementError::MissingFileName(entry.to_string()));
            }
            return Ok(Self::Archive {
                url: entry.to_string(),
                file_name: file_name.to_string(),
            });
        }

        Ok(Self::Package(PackageName::new(entry)))
    }

    /// Whether this requirement is fetched over HTTP.
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive { .. })
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Package(name) => write!(f, "{name}"),
            Self::Archive { url, .. } => f.write_str(url),
        }
    }
}

/// Extract the final path segment from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

/// A single environment variable assignment derived from the dependency root.
///
/// `value` is a colon-joined list of path fragments whose last element is a
/// reference to the inherited value of the same variable (e.g. `$PATH`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvBinding {
    /// Variable name, e.g. `LD_LIBRARY_PATH`.
    pub name: String,
    /// Fully rendered value.
    pub value: String,
}

impl EnvBinding {
    /// Create a binding.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Render as a shell `export` statement (without trailing newline).
    pub fn export_line(&self) -> String {
        format!("export {}=\"{}\"", self.name, self.value)
    }
}

/// Payload of the completion marker written at the end of a supply run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackConfig {
    /// Name of the supplier that produced the dependency root.
    pub name: String,
    /// Supplier-specific configuration; `null` when there is none.
    pub config: Option<std::collections::BTreeMap<String, String>>,
}

impl BuildpackConfig {
    /// A marker with no supplier-specific configuration.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            config: None,
        }
    }
}
