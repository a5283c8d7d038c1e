//! Requirement fetching: direct archive URLs over HTTP, package names
//! through the index tool. Both land in the archives cache.

use reqwest::Client;
use thiserror::Error;

use crate::Reporter;
use crate::index::{IndexError, IndexTool};
use crate::io::download::{self, DownloadError};
use crate::paths::CacheLayout;
use crate::types::Requirement;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl FetchError {
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::Index(e) => e.captured_output(),
            Self::Download(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct Fetcher<'a, I: ?Sized> {
    client: &'a Client,
    index: &'a I,
    layout: &'a CacheLayout,
}

impl<'a, I: IndexTool + ?Sized> Fetcher<'a, I> {
    pub fn new(client: &'a Client, index: &'a I, layout: &'a CacheLayout) -> Self {
        Self {
            client,
            index,
            layout,
        }
    }

    /// Fetch one requirement into the archives cache. Single attempt.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Download`] for HTTP failures and
    /// [`FetchError::Index`] when the index tool exits non-zero.
    pub async fn fetch(
        &self,
        requirement: &Requirement,
        reporter: &dyn Reporter,
    ) -> Result<(), FetchError> {
        match requirement {
            Requirement::Archive { url, file_name } => {
                reporter.step(&format!("Fetching {url}"));
                let dest = self.layout.archive_path(file_name);
                let bytes = download::download_file(self.client, url, &dest).await?;
                tracing::info!(url = %url, bytes, "archive fetched");
            }
            Requirement::Package(name) => {
                reporter.step(&format!("Fetching .debs for {name}"));
                self.index.fetch(name).await?;
                tracing::info!(package = %name, "package fetched");
            }
        }
        Ok(())
    }
}
