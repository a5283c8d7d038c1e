//! Finalize phase: publish profile scripts for launch.

use std::sync::Arc;

use aptroot_core::Reporter;

use crate::StagingArgs;
use crate::error::ExitFailure;
use crate::exit;
use crate::stager::DirStager;

pub fn finalize(staging: &StagingArgs, reporter: &Arc<dyn Reporter>) -> Result<(), ExitFailure> {
    let stager = match DirStager::open(staging) {
        Ok(stager) => stager,
        Err(e) => {
            reporter.error(&format!("Unable to finalize: {e:#}"));
            return Err(ExitFailure::new(exit::INVALID_STAGING, e));
        }
    };

    reporter.step("Setting launch environment");
    match stager.set_launch_environment() {
        Ok(count) => {
            tracing::info!(scripts = count, "launch environment published");
            Ok(())
        }
        Err(e) => {
            reporter.error(&format!("Unable to set up launch environment: {e:#}"));
            Err(ExitFailure::new(exit::LAUNCH_ENV, e))
        }
    }
}
