//! PEP 517 build frontend.
//!
//! [`build`] turns a source tree into one distribution file: it acquires an
//! [`IsolatedEnv`], installs the static `[build-system].requires`, asks the
//! backend for its dynamic requirements and installs those, then calls the
//! backend's build hook. The environment is released on every exit path.

pub mod artifact;
pub mod builder;
pub mod error;
pub mod hooks;
pub mod pyproject;

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;
use wheelcheck_core::config::ToolchainConfig;
use wheelcheck_core::observability;
use wheelcheck_core::{ConfigSettings, DistributionKind, InstallerKind};
use wheelcheck_env::{Interpreter, IsolatedEnv};

pub use artifact::{inspect, BuiltArtifact};
pub use builder::ProjectBuilder;
pub use error::{BuildError, Result};
pub use pyproject::Backend;

/// What to build and how to satisfy build requirements.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub kind: DistributionKind,
    pub installer: InstallerKind,
    pub config_settings: ConfigSettings,
}

/// Build the project at `source` into `destination` and return the artifact path.
pub fn build(
    source: &Path,
    destination: &Path,
    options: &BuildOptions,
    base: &Interpreter,
    toolchain: &ToolchainConfig,
) -> Result<PathBuf> {
    if !source.is_dir() {
        return Err(BuildError::InvalidSource {
            path: source.to_path_buf(),
            reason: "not an existing directory".to_string(),
        });
    }
    if !destination.is_dir() {
        return Err(BuildError::InvalidDestination(destination.to_path_buf()));
    }

    let env = IsolatedEnv::create(base, options.installer, toolchain)?;
    let builder = ProjectBuilder::from_isolated_env(&env, source)?;

    env.install(builder.build_system_requires())?;
    let dynamic = builder.get_requires_for_build(options.kind, &options.config_settings)?;
    env.install(&dynamic)?;

    let artifact = builder.build(options.kind, destination, &options.config_settings)?;
    info!(
        source = %builder.source_dir().display(),
        artifact = %artifact.display(),
        "build finished"
    );
    observability::record_event(
        "build_finished",
        json!({
            "source": builder.source_dir().display().to_string(),
            "artifact": artifact.display().to_string(),
            "kind": options.kind,
        }),
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejects_missing_source_before_spawning() {
        let tmp = tempfile::tempdir().unwrap();
        let err = build(
            &tmp.path().join("missing"),
            tmp.path(),
            &BuildOptions::default(),
            &Interpreter::at("/nonexistent/python"),
            &ToolchainConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::InvalidSource { .. }));
    }

    #[test]
    fn test_build_rejects_missing_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let err = build(
            tmp.path(),
            &tmp.path().join("dist"),
            &BuildOptions::default(),
            &Interpreter::at("/nonexistent/python"),
            &ToolchainConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::InvalidDestination(_)));
    }

    #[test]
    fn test_environment_failure_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let err = build(
            tmp.path(),
            tmp.path(),
            &BuildOptions::default(),
            &Interpreter::at("/nonexistent/python"),
            &ToolchainConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Env(_)));
    }
}
