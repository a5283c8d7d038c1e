//! External process execution.
//!
//! Every external tool (index tool, archive extractor) is driven through the
//! [`CommandRunner`] trait so tests can substitute a recording stub. A
//! non-zero exit is not an error at this layer: it comes back as a
//! [`CommandOutput`] with `success == false` and the caller decides what it
//! means.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{program} not found on PATH")]
    NotFound { program: String },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which streams of the child end up in [`CommandOutput::output`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Stdout only; stderr is discarded.
    Stdout,
    /// Stdout and stderr interleaved into one buffer.
    Combined,
}

/// A fully described external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
    pub capture: Capture,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
            capture: Capture::Combined,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn capture(mut self, capture: Capture) -> Self {
        self.capture = capture;
        self
    }

    /// Render as a single line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code, `None` if the child was killed by a signal.
    pub code: Option<i32>,
    pub output: String,
}

impl CommandOutput {
    /// A successful run with the given output. Handy for stubs.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            output: output.into(),
        }
    }

    /// A failed run with the given exit code and output. Handy for stubs.
    pub fn failed(code: i32, output: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            output: output.into(),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<T> {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        (**self).run(spec).await
    }
}

/// Runs commands on the host.
///
/// Output is captured through an anonymous temp file so that stdout and
/// stderr can share one descriptor and interleave in write order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn resolve(program: &str) -> Result<PathBuf, CommandError> {
        if program.contains('/') {
            return Ok(PathBuf::from(program));
        }
        which::which(program).map_err(|_| CommandError::NotFound {
            program: program.to_string(),
        })
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let program = Self::resolve(&spec.program)?;
        tracing::debug!(command = %spec.display(), cwd = ?spec.cwd, "running");

        let mut log = tempfile::tempfile()?;

        let mut cmd = Command::new(&program);
        cmd.args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::from(log.try_clone()?));
        match spec.capture {
            Capture::Combined => cmd.stderr(Stdio::from(log.try_clone()?)),
            Capture::Stdout => cmd.stderr(Stdio::null()),
        };
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }

        let status = cmd.status().await.map_err(|source| CommandError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let mut raw = Vec::new();
        log.seek(SeekFrom::Start(0))?;
        log.read_to_end(&mut raw)?;

        tracing::debug!(command = %spec.program, status = ?status.code(), "finished");

        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            output: String::from_utf8_lossy(&raw).into_owned(),
        })
    }
}
