//! End-to-end build → install → verify → teardown runs.
//!
//! Every run owns a working directory (`dist/` for the artifact, `env/` for a
//! provisioned target). The directory is a [`TempDir`] removed on drop unless
//! the caller asks to keep it.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};
use wheelcheck_build::{BuildError, BuildOptions, BuiltArtifact};
use wheelcheck_core::config::ToolchainConfig;
use wheelcheck_core::name::normalize_name;
use wheelcheck_core::observability;
use wheelcheck_core::{ConfigSettings, DistributionKind, InstallerKind};
use wheelcheck_env::command::run_captured;
use wheelcheck_env::{installer_for, EnvError, Interpreter};
use wheelcheck_install::{
    AdditionalMetadata, InstallError, InstalledDistribution, ScriptSection, WheelFile,
};

use crate::target::{TargetEnvironment, TargetKind};
use crate::verify::{ImportProbe, VerifyError, Verifier};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("built artifact is {found}, expected {expected}")]
    UnexpectedArtifact { expected: String, found: String },

    #[error("script '{script}' exited with {status}: {stderr}")]
    ScriptFailed {
        script: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, HarnessError>;

/// How an interpreter target is cleaned up after verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TeardownMode {
    /// Ask the configured package installer to uninstall the distribution
    #[default]
    Installer,
    /// Remove the files listed in the installed RECORD
    Record,
}

impl fmt::Display for TeardownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installer => f.write_str("installer"),
            Self::Record => f.write_str("record"),
        }
    }
}

impl FromStr for TeardownMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "installer" => Ok(Self::Installer),
            "record" => Ok(Self::Record),
            other => Err(format!(
                "unknown teardown mode '{}' (expected installer or record)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub source: PathBuf,
    /// Import name checked before and after install
    pub module: String,
    /// Distribution name; defaults to the name in the built metadata
    pub distribution: Option<String>,
    pub expected_version: String,
    /// Install into this interpreter instead of a provisioned venv
    pub python_target: Option<PathBuf>,
    pub teardown: TeardownMode,
    pub installer: InstallerKind,
    pub config_settings: ConfigSettings,
    pub symlinks: bool,
    /// Run each installed console script once and require a zero exit
    pub run_scripts: bool,
    pub workdir_root: Option<PathBuf>,
    pub keep_workdir: bool,
}

impl HarnessOptions {
    pub fn new(source: impl Into<PathBuf>, module: impl Into<String>, expected_version: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            module: module.into(),
            distribution: None,
            expected_version: expected_version.into(),
            python_target: None,
            teardown: TeardownMode::default(),
            installer: InstallerKind::default(),
            config_settings: ConfigSettings::new(),
            symlinks: true,
            run_scripts: false,
            workdir_root: None,
            keep_workdir: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TeardownReport {
    /// The provisioned environment went away with the run directory
    Discarded { kept: bool },
    Uninstalled { mode: TeardownMode, removed: usize },
}

/// Summary of one successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Set when the working directory was kept
    pub workdir: Option<PathBuf>,
    pub artifact: BuiltArtifact,
    pub python: PathBuf,
    pub target: TargetKind,
    pub installed: InstalledDistribution,
    pub scripts_checked: Vec<String>,
    pub teardown: TeardownReport,
}

enum RunDir {
    Temporary(TempDir),
    Kept(PathBuf),
}

impl RunDir {
    fn create(root: Option<&Path>, keep: bool) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("wheelcheck-run-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root).map_err(|source| HarnessError::Io {
                path: root.to_path_buf(),
                source,
            })?,
            None => builder.tempdir().map_err(|source| HarnessError::Io {
                path: std::env::temp_dir(),
                source,
            })?,
        };
        if keep {
            Ok(Self::Kept(dir.into_path()))
        } else {
            Ok(Self::Temporary(dir))
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Temporary(dir) => dir.path(),
            Self::Kept(path) => path,
        }
    }

    fn kept(&self) -> Option<PathBuf> {
        match self {
            Self::Temporary(_) => None,
            Self::Kept(path) => Some(path.clone()),
        }
    }
}

/// Runs the full pipeline from a base interpreter.
pub struct Harness {
    base: Interpreter,
    toolchain: ToolchainConfig,
}

impl Harness {
    pub fn new(base: Interpreter, toolchain: ToolchainConfig) -> Self {
        Self { base, toolchain }
    }

    pub fn run(&self, options: &HarnessOptions) -> Result<RunReport> {
        let started_at = Utc::now();
        let run_dir = RunDir::create(options.workdir_root.as_deref(), options.keep_workdir)?;
        info!(workdir = %run_dir.path().display(), source = %options.source.display(), "starting run");

        let dist_dir = run_dir.path().join("dist");
        std::fs::create_dir_all(&dist_dir).map_err(|source| HarnessError::Io {
            path: dist_dir.clone(),
            source,
        })?;

        let build_options = BuildOptions {
            kind: DistributionKind::Wheel,
            installer: options.installer,
            config_settings: options.config_settings.clone(),
        };
        let wheel_path = wheelcheck_build::build(
            &options.source,
            &dist_dir,
            &build_options,
            &self.base,
            &self.toolchain,
        )?;
        let artifact = wheelcheck_build::inspect(&wheel_path)?;
        let distribution = check_artifact(&artifact, options)?;

        let target = match options.python_target {
            Some(ref python) => TargetEnvironment::from_interpreter(Interpreter::at(python))?,
            None => TargetEnvironment::provision(&self.base, &run_dir.path().join("env"), options.symlinks)?,
        };
        let verifier = Verifier::new(target.interpreter().clone());
        verifier.assert_not_importable(&options.module)?;
        // A provisioned install must stay invisible to the base interpreter.
        let host = match target.kind() {
            TargetKind::Provisioned { .. } => {
                let host = Verifier::new(self.base.clone());
                match host.probe(&options.module, &distribution)? {
                    ImportProbe::NotImportable { .. } => Some(host),
                    ImportProbe::Importable { .. } => {
                        debug!(module = %options.module, "base interpreter already provides the module");
                        None
                    }
                }
            }
            TargetKind::Interpreter => None,
        };

        let mut wheel = WheelFile::open(&wheel_path)?;
        let installed = wheelcheck_install::install(
            &mut wheel,
            &target.destination(false),
            &AdditionalMetadata::new(),
        )?;

        let checked = check_installed(&verifier, host.as_ref(), &target, &wheel, &distribution, options);
        // The interpreter target is restored whether or not the checks passed.
        let teardown = self.teardown(&verifier, &target, &distribution, options, run_dir.kept().is_some());
        let scripts_checked = checked?;
        let teardown = teardown?;

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            workdir: run_dir.kept(),
            artifact,
            python: target.interpreter().executable().to_path_buf(),
            target: target.kind().clone(),
            installed,
            scripts_checked,
            teardown,
        };
        observability::record_event(
            "run_finished",
            json!({
                "distribution": distribution,
                "version": options.expected_version,
                "python": report.python.display().to_string(),
                "target": report.target,
                "teardown": report.teardown,
            }),
        );
        info!(distribution = %distribution, version = %options.expected_version, "run passed");
        Ok(report)
    }

    fn teardown(
        &self,
        verifier: &Verifier,
        target: &TargetEnvironment,
        distribution: &str,
        options: &HarnessOptions,
        kept: bool,
    ) -> Result<TeardownReport> {
        if let TargetKind::Provisioned { .. } = target.kind() {
            return Ok(TeardownReport::Discarded { kept });
        }
        let python = target.interpreter().executable();
        let removed = match options.teardown {
            TeardownMode::Installer => {
                let installer = installer_for(options.installer, &self.toolchain);
                installer.uninstall(python, &[distribution.to_string()])?;
                // The installer does not report what it removed.
                0
            }
            TeardownMode::Record => wheelcheck_install::uninstall(target.scheme(), distribution)?
                .removed
                .len(),
        };
        if let Err(e) = verifier.assert_not_importable(&options.module) {
            warn!(module = %options.module, error = %e, "package still importable after teardown");
            return Err(e.into());
        }
        Ok(TeardownReport::Uninstalled {
            mode: options.teardown,
            removed,
        })
    }
}

/// Version check plus optional console-script runs. `host` re-checks that the
/// base interpreter still cannot see the module.
fn check_installed(
    verifier: &Verifier,
    host: Option<&Verifier>,
    target: &TargetEnvironment,
    wheel: &WheelFile,
    distribution: &str,
    options: &HarnessOptions,
) -> Result<Vec<String>> {
    verifier.assert_version(&options.module, distribution, &options.expected_version)?;
    if let Some(host) = host {
        host.assert_not_importable(&options.module)?;
    }
    if !options.run_scripts {
        return Ok(Vec::new());
    }
    let mut checked = Vec::new();
    for entry in wheel
        .entry_points()
        .iter()
        .filter(|e| e.section == ScriptSection::Console)
    {
        let script = target.scheme().scripts.join(&entry.name);
        let output = run_captured(&mut Command::new(&script))?;
        if !output.status.success() {
            return Err(HarnessError::ScriptFailed {
                script: entry.name.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        info!(script = %entry.name, "script ran");
        checked.push(entry.name.clone());
    }
    Ok(checked)
}

/// The built wheel must carry the expected name and version. Returns the
/// distribution name to verify against.
fn check_artifact(artifact: &BuiltArtifact, options: &HarnessOptions) -> Result<String> {
    let found_name = &artifact.metadata.name;
    let found_version = &artifact.metadata.version;
    let distribution = options
        .distribution
        .clone()
        .unwrap_or_else(|| found_name.clone());
    if normalize_name(found_name) != normalize_name(&distribution)
        || *found_version != options.expected_version
    {
        return Err(HarnessError::UnexpectedArtifact {
            expected: format!("{} {}", distribution, options.expected_version),
            found: format!("{} {}", found_name, found_version),
        });
    }
    Ok(distribution)
}
