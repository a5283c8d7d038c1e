//! Supply pipeline orchestration.
//!
//! ```text
//! Start → IndexSynchronized → RequirementsRead → AllFetched → Installed
//!       → EnvironmentComposed → Done
//! ```
//!
//! Any error moves the pipeline to `Failed` and is returned as-is. Nothing
//! is retried and nothing is rolled back: extracted payloads and env files
//! written before the failure stay where they are.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;

use crate::Reporter;
use crate::env::{self, EnvError};
use crate::fetch::{FetchError, Fetcher};
use crate::index::{IndexError, IndexTool};
use crate::io::extract::{ExtractError, Installer};
use crate::manifest::{Manifest, ManifestError};
use crate::paths::CacheLayout;
use crate::process::CommandRunner;
use crate::stager::Stager;
use crate::types::{BuildpackConfig, EnvBinding};

/// Name recorded in the completion marker.
pub const SUPPLIER_NAME: &str = "apt";

/// Default archive extraction tool.
pub const DEFAULT_DPKG: &str = "dpkg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    IndexSynchronized,
    RequirementsRead,
    AllFetched,
    Installed,
    EnvironmentComposed,
    Done,
    Failed,
}

/// Broad failure category, used by the CLI to pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Directory creation or manifest read.
    Setup,
    /// Index sync, fetch or extraction.
    Install,
    /// Environment composition.
    Environment,
    /// Completion marker.
    Marker,
}

#[derive(Error, Debug)]
pub enum SupplyError {
    #[error("Could not create {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Updating apt cache failed: {0}")]
    IndexSync(#[source] IndexError),

    #[error("Could not download package: {0}")]
    Fetch(#[from] FetchError),

    #[error("Could not install package: {0}")]
    Extract(#[from] ExtractError),

    #[error("Could not write environment: {0}")]
    Environment(#[from] EnvError),

    #[error("Could not write config.yml: {0}")]
    Marker(#[source] std::io::Error),
}

impl SupplyError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Setup { .. } | Self::Manifest(_) => FailureClass::Setup,
            Self::IndexSync(_) | Self::Fetch(_) | Self::Extract(_) => FailureClass::Install,
            Self::Environment(_) => FailureClass::Environment,
            Self::Marker(_) => FailureClass::Marker,
        }
    }

    /// Output of the external command that failed, when there was one.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::IndexSync(e) => e.captured_output(),
            Self::Fetch(e) => e.captured_output(),
            Self::Extract(e) => e.captured_output(),
            _ => None,
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyReport {
    pub requirements: usize,
    pub archives: Vec<String>,
    pub bindings: Vec<EnvBinding>,
}

/// Runs the supply pipeline against one dependency root.
pub struct Supplier<S, I, R> {
    stager: S,
    index: I,
    runner: R,
    client: Client,
    layout: CacheLayout,
    dpkg: String,
    reporter: Arc<dyn Reporter>,
    stage: Stage,
}

impl<S, I, R> std::fmt::Debug for Supplier<S, I, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supplier")
            .field("layout", &self.layout)
            .field("dpkg", &self.dpkg)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl<S: Stager, I: IndexTool, R: CommandRunner> Supplier<S, I, R> {
    /// The cache layout is derived from the stager's cache root.
    pub fn new(stager: S, index: I, runner: R, reporter: Arc<dyn Reporter>) -> Self {
        let layout = CacheLayout::new(stager.cache_dir());
        Self {
            stager,
            index,
            runner,
            client: Client::new(),
            layout,
            dpkg: DEFAULT_DPKG.to_string(),
            reporter,
            stage: Stage::Start,
        }
    }

    /// Use a specific archive extraction program.
    pub fn with_dpkg(mut self, program: impl Into<String>) -> Self {
        self.dpkg = program.into();
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn stager(&self) -> &S {
        &self.stager
    }

    fn advance(&mut self, next: Stage) {
        tracing::debug!(from = ?self.stage, to = ?next, "stage");
        self.stage = next;
    }

    /// Run every stage in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first [`SupplyError`]; the pipeline is then in
    /// [`Stage::Failed`].
    pub async fn run(&mut self) -> Result<SupplyReport, SupplyError> {
        let result = self.run_stages().await;
        if let Err(err) = &result {
            self.report_failure(err);
            self.advance(Stage::Failed);
        }
        result
    }

    async fn run_stages(&mut self) -> Result<SupplyReport, SupplyError> {
        let (requirements, archives) = self.install_packages().await?;
        let bindings = self.configure_env()?;
        self.write_marker()?;
        self.advance(Stage::Done);

        Ok(SupplyReport {
            requirements,
            archives,
            bindings,
        })
    }

    /// Sync the index, read the manifest, fetch every requirement in order
    /// and extract the archives cache into the dependency root.
    async fn install_packages(&mut self) -> Result<(usize, Vec<String>), SupplyError> {
        self.prepare_dirs()?;

        self.reporter.step("Updating apt caches");
        self.index.sync().await.map_err(SupplyError::IndexSync)?;
        self.advance(Stage::IndexSynchronized);

        let manifest = Manifest::load(self.stager.build_dir()).await?;
        tracing::info!(count = manifest.len(), "requirements read");
        if manifest.is_empty() {
            self.reporter.warning("Aptfile lists no packages");
        }
        self.advance(Stage::RequirementsRead);

        let fetcher = Fetcher::new(&self.client, &self.index, &self.layout);
        for requirement in &manifest.requirements {
            fetcher.fetch(requirement, self.reporter.as_ref()).await?;
        }
        self.advance(Stage::AllFetched);

        let archives_dir = self.layout.archives_dir();
        let dep_dir = self.stager.dep_dir();
        let installer = Installer::new(&self.runner, &self.dpkg, &archives_dir, &dep_dir);
        let archives = installer.install_all(self.reporter.as_ref()).await?;
        self.advance(Stage::Installed);

        Ok((manifest.len(), archives))
    }

    fn prepare_dirs(&self) -> Result<(), SupplyError> {
        self.layout
            .ensure()
            .map_err(|(path, source)| SupplyError::Setup { path, source })?;

        let dep_dir = self.stager.dep_dir();
        std::fs::create_dir_all(&dep_dir).map_err(|source| SupplyError::Setup {
            path: dep_dir.clone(),
            source,
        })
    }

    fn configure_env(&mut self) -> Result<Vec<EnvBinding>, SupplyError> {
        self.reporter.step("Writing profile script");
        let bindings = env::compose(&env::launch_root(self.stager.deps_idx()));
        env::write_bindings(&self.stager, &bindings)?;
        self.advance(Stage::EnvironmentComposed);
        Ok(bindings)
    }

    fn write_marker(&self) -> Result<(), SupplyError> {
        self.stager
            .write_config_yml(&BuildpackConfig::named(SUPPLIER_NAME))
            .map_err(SupplyError::Marker)
    }

    fn report_failure(&self, err: &SupplyError) {
        let what = match err.class() {
            FailureClass::Setup | FailureClass::Install => "Error installing packages",
            FailureClass::Environment => "Error writing environment vars",
            FailureClass::Marker => "Error writing config.yml",
        };
        self.reporter.error(&format!("{what}: {err}"));
        if let Some(output) = err.captured_output() {
            self.reporter.output(output.trim());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandError, CommandOutput, CommandSpec};
    use crate::types::PackageName;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    /// Shared event log so ordering across collaborators can be asserted.
    type Log = Arc<Mutex<Vec<String>>>;

    struct StubIndex {
        log: Log,
        fail_sync: bool,
        fail_fetch: Option<&'static str>,
        /// Drops a fake archive per fetched package.
        archives: PathBuf,
    }

    #[async_trait]
    impl IndexTool for StubIndex {
        async fn sync(&self) -> Result<(), IndexError> {
            self.log.lock().unwrap().push("sync".to_string());
            if self.fail_sync {
                return Err(IndexError::UpdateFailed {
                    code: Some(100),
                    output: "E: Release file not found\n".to_string(),
                });
            }
            Ok(())
        }

        async fn fetch(&self, package: &PackageName) -> Result<(), IndexError> {
            self.log.lock().unwrap().push(format!("fetch {package}"));
            if self.fail_fetch == Some(package.as_str()) {
                return Err(IndexError::FetchFailed {
                    package: package.clone(),
                    code: Some(100),
                    output: format!("E: Unable to locate package {package}"),
                });
            }
            std::fs::write(self.archives.join(format!("{package}_1.0_amd64.deb")), b"x")
                .map_err(crate::process::CommandError::Io)?;
            Ok(())
        }
    }

    struct StubRunner {
        log: Log,
        fail: bool,
    }

    #[async_trait]
    impl CommandRunner for StubRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{} {}", spec.program, spec.args[1]));
            if self.fail {
                return Ok(CommandOutput::failed(2, "dpkg-deb: error"));
            }
            Ok(CommandOutput::ok(""))
        }
    }

    #[derive(Default)]
    struct TestStager {
        root: PathBuf,
        env: Mutex<Vec<(String, String)>>,
        profile: Mutex<Option<String>>,
        marker: Mutex<Option<BuildpackConfig>>,
        fail_env: bool,
    }

    impl TestStager {
        fn new(root: &Path) -> Self {
            Self {
                root: root.to_path_buf(),
                ..Self::default()
            }
        }
    }

    impl Stager for TestStager {
        fn build_dir(&self) -> &Path {
            &self.root
        }
        fn cache_dir(&self) -> &Path {
            &self.root
        }
        fn dep_dir(&self) -> PathBuf {
            self.root.join("deps").join("14")
        }
        fn deps_idx(&self) -> &str {
            "14"
        }
        fn write_env_file(&self, name: &str, value: &str) -> std::io::Result<()> {
            if self.fail_env {
                return Err(std::io::Error::other("disk full"));
            }
            self.env
                .lock()
                .unwrap()
                .push((name.to_string(), value.to_string()));
            Ok(())
        }
        fn write_profile_d(&self, _: &str, content: &str) -> std::io::Result<()> {
            *self.profile.lock().unwrap() = Some(content.to_string());
            Ok(())
        }
        fn write_config_yml(&self, config: &BuildpackConfig) -> std::io::Result<()> {
            *self.marker.lock().unwrap() = Some(config.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        lines: Mutex<Vec<String>>,
    }

    impl Reporter for RecordingReporter {
        fn step(&self, title: &str) {
            self.lines.lock().unwrap().push(format!("step {title}"));
        }
        fn info(&self, msg: &str) {
            self.lines.lock().unwrap().push(format!("info {msg}"));
        }
        fn warning(&self, msg: &str) {
            self.lines.lock().unwrap().push(format!("warning {msg}"));
        }
        fn error(&self, msg: &str) {
            self.lines.lock().unwrap().push(format!("error {msg}"));
        }
        fn output(&self, captured: &str) {
            self.lines.lock().unwrap().push(format!("output {captured}"));
        }
    }

    struct Harness {
        _tmp: tempfile::TempDir,
        log: Log,
        reporter: Arc<RecordingReporter>,
        supplier: Supplier<TestStager, StubIndex, StubRunner>,
    }

    impl Harness {
        fn new(aptfile: &str) -> Self {
            Self::build(aptfile, |_, _, _| {})
        }

        fn build(
            aptfile: &str,
            tweak: impl FnOnce(&mut TestStager, &mut StubIndex, &mut StubRunner),
        ) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            std::fs::write(tmp.path().join("Aptfile"), aptfile).unwrap();

            let log: Log = Arc::default();
            let mut stager = TestStager::new(tmp.path());
            let mut index = StubIndex {
                log: log.clone(),
                fail_sync: false,
                fail_fetch: None,
                archives: CacheLayout::new(tmp.path()).archives_dir(),
            };
            let mut runner = StubRunner {
                log: log.clone(),
                fail: false,
            };
            tweak(&mut stager, &mut index, &mut runner);

            let reporter = Arc::new(RecordingReporter::default());
            let supplier = Supplier::new(stager, index, runner, reporter.clone());
            Self {
                _tmp: tmp,
                log,
                reporter,
                supplier,
            }
        }

        fn events(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn full_run_in_order() {
        let mut h = Harness::new("- curl\n- libpq-dev\n");
        let report = h.supplier.run().await.unwrap();

        assert_eq!(
            h.events(),
            vec![
                "sync",
                "fetch curl",
                "fetch libpq-dev",
                "dpkg curl_1.0_amd64.deb",
                "dpkg libpq-dev_1.0_amd64.deb",
            ]
        );
        assert_eq!(report.requirements, 2);
        assert_eq!(report.archives.len(), 2);
        assert_eq!(report.bindings.len(), 7);
        assert_eq!(h.supplier.stage(), Stage::Done);

        let stager = h.supplier.stager();
        let env = stager.env.lock().unwrap();
        assert_eq!(env[0].1, "$DEPS_DIR/14/usr/bin:$PATH");
        assert!(stager.profile.lock().unwrap().is_some());
        assert_eq!(
            *stager.marker.lock().unwrap(),
            Some(BuildpackConfig::named("apt"))
        );
        assert!(stager.dep_dir().is_dir());
    }

    #[tokio::test]
    async fn operator_steps_follow_manifest_order() {
        let mut h = Harness::new("- curl\n");
        h.supplier.run().await.unwrap();

        let lines = h.reporter.lines.lock().unwrap().clone();
        assert_eq!(
            lines,
            vec![
                "step Updating apt caches",
                "step Fetching .debs for curl",
                "step Installing curl_1.0_amd64.deb",
                "step Writing profile script",
            ]
        );
    }

    #[tokio::test]
    async fn mixed_manifest_fetches_urls_and_names_in_order() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/pkgs/tool.deb")
            .with_status(200)
            .with_body("deb")
            .expect(1)
            .create_async()
            .await;
        let url = format!("{}/pkgs/tool.deb", server.url());

        let mut h = Harness::new(&format!("- curl\n- {url}\n- jq\n"));
        let report = h.supplier.run().await.unwrap();
        m.assert_async().await;

        let lines = h.reporter.lines.lock().unwrap().clone();
        assert_eq!(
            lines[..4],
            [
                "step Updating apt caches".to_string(),
                "step Fetching .debs for curl".to_string(),
                format!("step Fetching {url}"),
                "step Fetching .debs for jq".to_string(),
            ]
        );
        assert_eq!(
            h.events(),
            vec![
                "sync",
                "fetch curl",
                "fetch jq",
                "dpkg curl_1.0_amd64.deb",
                "dpkg jq_1.0_amd64.deb",
                "dpkg tool.deb",
            ]
        );
        assert_eq!(report.requirements, 3);
        assert_eq!(report.archives.len(), 3);
    }

    #[tokio::test]
    async fn sync_runs_once_even_for_empty_manifest() {
        let mut h = Harness::new("");
        let report = h.supplier.run().await.unwrap();
        assert_eq!(h.events(), vec!["sync"]);
        assert_eq!(report.requirements, 0);
        assert!(report.archives.is_empty());
        assert_eq!(h.supplier.stage(), Stage::Done);

        let lines = h.reporter.lines.lock().unwrap().clone();
        assert!(lines.contains(&"warning Aptfile lists no packages".to_string()));
    }

    #[tokio::test]
    async fn sync_failure_stops_before_fetch() {
        let mut h = Harness::build("- curl\n", |_, index, _| index.fail_sync = true);
        let err = h.supplier.run().await.unwrap_err();

        assert!(matches!(err, SupplyError::IndexSync(_)));
        assert_eq!(err.class(), FailureClass::Install);
        assert_eq!(h.events(), vec!["sync"]);
        assert_eq!(h.supplier.stage(), Stage::Failed);

        let lines = h.reporter.lines.lock().unwrap().clone();
        assert!(lines.iter().any(|l| l.starts_with("error Error installing packages")));
        assert!(lines.contains(&"output E: Release file not found".to_string()));
    }

    #[tokio::test]
    async fn fetch_failure_skips_later_requirements() {
        let mut h = Harness::build("- nope\n- curl\n", |_, index, _| {
            index.fail_fetch = Some("nope");
        });
        let err = h.supplier.run().await.unwrap_err();

        assert_eq!(err.class(), FailureClass::Install);
        assert_eq!(
            err.captured_output(),
            Some("E: Unable to locate package nope")
        );
        assert_eq!(h.events(), vec!["sync", "fetch nope"]);
    }

    #[tokio::test]
    async fn extraction_failure_leaves_env_untouched() {
        let mut h = Harness::build("- curl\n- zlib1g\n", |_, _, runner| runner.fail = true);
        let err = h.supplier.run().await.unwrap_err();

        assert!(matches!(err, SupplyError::Extract(_)));
        assert_eq!(
            h.events(),
            vec!["sync", "fetch curl", "fetch zlib1g", "dpkg curl_1.0_amd64.deb"]
        );
        assert!(h.supplier.stager().env.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_manifest_is_setup_failure() {
        let mut h = Harness::new("");
        std::fs::remove_file(h.supplier.stager().build_dir().join("Aptfile")).unwrap();
        let err = h.supplier.run().await.unwrap_err();
        assert_eq!(err.class(), FailureClass::Setup);
        assert_eq!(h.events(), vec!["sync"]);
    }

    #[tokio::test]
    async fn env_write_failure_is_fatal() {
        let mut h = Harness::build("", |stager, _, _| stager.fail_env = true);
        let err = h.supplier.run().await.unwrap_err();

        assert_eq!(err.class(), FailureClass::Environment);
        assert!(h.supplier.stager().marker.lock().unwrap().is_none());
        assert_eq!(h.supplier.stage(), Stage::Failed);
    }
}
