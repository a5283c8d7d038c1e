//! Supply phase: install the Aptfile packages into `<deps>/<idx>`.

use std::sync::Arc;

use aptroot_core::index::AptGet;
use aptroot_core::process::SystemRunner;
use aptroot_core::{CacheLayout, Reporter, Stager, Supplier};

use crate::StagingArgs;
use crate::error::ExitFailure;
use crate::exit;
use crate::stager::DirStager;

/// Run the supply pipeline with the given index and extraction tools.
pub async fn supply(
    staging: &StagingArgs,
    apt_get: &str,
    dpkg: &str,
    reporter: &Arc<dyn Reporter>,
) -> Result<(), ExitFailure> {
    let stager = match DirStager::open(staging) {
        Ok(stager) => stager,
        Err(e) => {
            reporter.error(&format!("Unable to install packages: {e:#}"));
            return Err(ExitFailure::new(exit::INVALID_STAGING, e));
        }
    };

    let layout = CacheLayout::new(stager.cache_dir());
    let index = AptGet::new(SystemRunner, apt_get, layout);
    let mut supplier =
        Supplier::new(stager, index, SystemRunner, Arc::clone(reporter)).with_dpkg(dpkg);

    match supplier.run().await {
        Ok(report) => {
            tracing::info!(
                requirements = report.requirements,
                archives = report.archives.len(),
                "supply complete"
            );
            reporter.info(&format!(
                "Installed {} archive(s) from {} requirement(s)",
                report.archives.len(),
                report.requirements
            ));
            Ok(())
        }
        // Already reported by the supplier.
        Err(e) => Err(ExitFailure::new(exit::for_class(e.class()), e)),
    }
}
