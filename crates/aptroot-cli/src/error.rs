//! Command failures carrying the process exit code.

use thiserror::Error;

#[derive(Error, Debug)]
#[error("{error:#}")]
pub struct ExitFailure {
    pub code: u8,
    pub error: anyhow::Error,
}

impl ExitFailure {
    pub fn new(code: u8, error: impl Into<anyhow::Error>) -> Self {
        Self {
            code,
            error: error.into(),
        }
    }
}
