//! Archive extraction into the dependency root.
//!
//! Every `.deb` in the archives cache is unpacked with `dpkg -x`, which
//! writes the package's payload tree without running maintainer scripts or
//! touching the host package database.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Reporter;
use crate::process::{Capture, CommandError, CommandRunner, CommandSpec};
use crate::types::ARCHIVE_SUFFIX;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Could not read archives directory {path}: {source}")]
    ListArchives {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not extract {archive} (exit code {code:?})")]
    Failed {
        archive: String,
        code: Option<i32>,
        output: String,
    },

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl ExtractError {
    /// Output of the failing extraction, if it ran at all.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// List archive file names in `dir`, non-recursively, sorted by name.
///
/// # Errors
///
/// Returns [`ExtractError::ListArchives`] if the directory cannot be read.
pub fn list_archives(dir: &Path) -> Result<Vec<String>, ExtractError> {
    let list_err = |source| ExtractError::ListArchives {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if !entry.file_type().map_err(list_err)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(ARCHIVE_SUFFIX) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Unpacks cached archives into the dependency root.
#[derive(Debug)]
pub struct Installer<'a, R> {
    runner: &'a R,
    program: &'a str,
    archives_dir: &'a Path,
    dep_dir: &'a Path,
}

impl<'a, R: CommandRunner> Installer<'a, R> {
    pub fn new(runner: &'a R, program: &'a str, archives_dir: &'a Path, dep_dir: &'a Path) -> Self {
        Self {
            runner,
            program,
            archives_dir,
            dep_dir,
        }
    }

    pub fn extract_command(&self, archive: &str) -> CommandSpec {
        CommandSpec::new(self.program)
            .arg("-x")
            .arg(archive)
            .arg(self.dep_dir.display().to_string())
            .current_dir(self.archives_dir)
            .capture(Capture::Combined)
    }

    /// Extract every archive in listing order, stopping at the first failure.
    ///
    /// Returns the names of the extracted archives. A failure leaves earlier
    /// payloads in place.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the archives directory cannot be listed or
    /// any extraction exits non-zero.
    pub async fn install_all(&self, reporter: &dyn Reporter) -> Result<Vec<String>, ExtractError> {
        let archives = list_archives(self.archives_dir)?;
        tracing::debug!(count = archives.len(), dir = %self.archives_dir.display(), "archives found");

        for archive in &archives {
            reporter.step(&format!("Installing {archive}"));
            let out = self.runner.run(&self.extract_command(archive)).await?;
            if !out.success {
                return Err(ExtractError::Failed {
                    archive: archive.clone(),
                    code: out.code,
                    output: out.output,
                });
            }
        }

        Ok(archives)
    }
}
