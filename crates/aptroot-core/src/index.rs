//! Package index tool abstraction.
//!
//! The index tool (apt-get) owns dependency resolution and archive download
//! for bare package names. It is always confined to the pipeline's private
//! cache and state directories and runs without host-level locking.

use async_trait::async_trait;
use thiserror::Error;

use crate::paths::CacheLayout;
use crate::process::{Capture, CommandError, CommandRunner, CommandSpec};
use crate::types::PackageName;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index update failed (exit code {code:?})")]
    UpdateFailed { code: Option<i32>, output: String },

    #[error("Could not download {package} (exit code {code:?})")]
    FetchFailed {
        package: PackageName,
        code: Option<i32>,
        output: String,
    },

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl IndexError {
    /// Output of the failing command, if the command ran at all.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::UpdateFailed { output, .. } | Self::FetchFailed { output, .. } => Some(output),
            Self::Command(_) => None,
        }
    }
}

#[async_trait]
pub trait IndexTool: Send + Sync {
    /// Refresh the local package index against the configured repositories.
    async fn sync(&self) -> Result<(), IndexError>;

    /// Download (never install) the archives for `package` and its
    /// dependencies into the archives cache.
    async fn fetch(&self, package: &PackageName) -> Result<(), IndexError>;
}

/// `apt-get` confined to a [`CacheLayout`].
#[derive(Debug)]
pub struct AptGet<R> {
    runner: R,
    program: String,
    layout: CacheLayout,
}

impl<R: CommandRunner> AptGet<R> {
    pub fn new(runner: R, program: impl Into<String>, layout: CacheLayout) -> Self {
        Self {
            runner,
            program: program.into(),
            layout,
        }
    }

    /// Options shared by every invocation: no locking, private cache and state.
    fn base_command(&self) -> CommandSpec {
        let cache = self.layout.cache_dir().display().to_string();
        let state = self.layout.state_dir().display().to_string();
        CommandSpec::new(&self.program)
            .args(["-o", "debug::nolocking=true"])
            .arg("-o")
            .arg(format!("dir::cache={cache}"))
            .arg("-o")
            .arg(format!("dir::state={state}"))
            .env("APT_CACHE_DIR", cache)
            .env("APT_STATE_DIR", state)
    }

    pub fn update_command(&self) -> CommandSpec {
        self.base_command().arg("update").capture(Capture::Combined)
    }

    pub fn download_command(&self, package: &PackageName) -> CommandSpec {
        self.base_command()
            .args(["-y", "--force-yes", "-d", "install", "--reinstall"])
            .arg(package.as_str())
            .capture(Capture::Combined)
    }
}

#[async_trait]
impl<R: CommandRunner> IndexTool for AptGet<R> {
    async fn sync(&self) -> Result<(), IndexError> {
        let out = self.runner.run(&self.update_command()).await?;
        if !out.success {
            return Err(IndexError::UpdateFailed {
                code: out.code,
                output: out.output,
            });
        }
        Ok(())
    }

    async fn fetch(&self, package: &PackageName) -> Result<(), IndexError> {
        let out = self.runner.run(&self.download_command(package)).await?;
        if !out.success {
            return Err(IndexError::FetchFailed {
                package: package.clone(),
                code: out.code,
                output: out.output,
            });
        }
        tracing::debug!(%package, "archives downloaded");
        Ok(())
    }
}


#[cfg(all(test, unix))]
mod system_tests {
    use super::*;
    use crate::process::SystemRunner;
    use std::os::unix::fs::PermissionsExt;

    #[tokio::test]
    async fn failed_update_keeps_stderr_diagnostics() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = tmp.path().join("apt-get");
        std::fs::write(
            &tool,
            "#!/bin/sh\necho 'Reading package lists...'\necho 'E: repo not signed' >&2\nexit 100\n",
        )
        .unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let apt = AptGet::new(
            SystemRunner,
            tool.display().to_string(),
            CacheLayout::new(tmp.path()),
        );
        let err = apt.sync().await.unwrap_err();

        assert!(matches!(err, IndexError::UpdateFailed { code: Some(100), .. }));
        let output = err.captured_output().unwrap();
        assert!(output.contains("Reading package lists..."));
        assert!(output.contains("E: repo not signed"));
    }
}
