//! Package installers used to populate and tear down environments.
//!
//! Implement [`PackageInstaller`] to add another frontend. Every call runs
//! exactly once; a non-zero exit is returned as `EnvError::InstallerFailed`
//! with the captured stderr.

use std::path::Path;
use std::process::Command;

use tracing::info;
use wheelcheck_core::config::ToolchainConfig;
use wheelcheck_core::InstallerKind;

use crate::command::run_captured;
use crate::error::{EnvError, Result};

/// Installs and removes distributions in the environment of a given interpreter.
pub trait PackageInstaller: Send + Sync {
    fn name(&self) -> &'static str;

    /// Install `requirements` (PEP 508 strings). Empty input is a no-op.
    fn install(&self, python: &Path, requirements: &[String]) -> Result<()>;

    /// Uninstall `distributions` by name. Empty input is a no-op.
    fn uninstall(&self, python: &Path, distributions: &[String]) -> Result<()>;
}

/// `uv pip install --python <py> ...`
#[derive(Debug, Clone)]
pub struct UvInstaller {
    pub binary: String,
}

/// `<py> -m pip install ...`; the target environment must have pip.
#[derive(Debug, Clone, Default)]
pub struct PipInstaller;

impl PackageInstaller for UvInstaller {
    fn name(&self) -> &'static str {
        "uv"
    }

    fn install(&self, python: &Path, requirements: &[String]) -> Result<()> {
        if requirements.is_empty() {
            return Ok(());
        }
        let mut cmd = Command::new(&self.binary);
        cmd.args(["pip", "install", "--python"]).arg(python).args(requirements);
        run_checked(self.name(), "install", &mut cmd)
    }

    fn uninstall(&self, python: &Path, distributions: &[String]) -> Result<()> {
        if distributions.is_empty() {
            return Ok(());
        }
        let mut cmd = Command::new(&self.binary);
        cmd.args(["pip", "uninstall", "--python"]).arg(python).args(distributions);
        run_checked(self.name(), "uninstall", &mut cmd)
    }
}

impl PackageInstaller for PipInstaller {
    fn name(&self) -> &'static str {
        "pip"
    }

    fn install(&self, python: &Path, requirements: &[String]) -> Result<()> {
        if requirements.is_empty() {
            return Ok(());
        }
        let mut cmd = Command::new(python);
        cmd.args(["-m", "pip", "install", "--disable-pip-version-check"])
            .args(requirements);
        run_checked(self.name(), "install", &mut cmd)
    }

    fn uninstall(&self, python: &Path, distributions: &[String]) -> Result<()> {
        if distributions.is_empty() {
            return Ok(());
        }
        let mut cmd = Command::new(python);
        cmd.args(["-m", "pip", "uninstall", "-y", "--disable-pip-version-check"])
            .args(distributions);
        run_checked(self.name(), "uninstall", &mut cmd)
    }
}

/// Installer implementation for `kind`.
pub fn installer_for(kind: InstallerKind, toolchain: &ToolchainConfig) -> Box<dyn PackageInstaller> {
    match kind {
        InstallerKind::Uv => Box::new(UvInstaller {
            binary: toolchain.uv.clone(),
        }),
        InstallerKind::Pip => Box::new(PipInstaller),
    }
}

fn run_checked(installer: &'static str, action: &'static str, cmd: &mut Command) -> Result<()> {
    let output = run_captured(cmd)?;
    if !output.status.success() {
        return Err(EnvError::InstallerFailed {
            installer,
            action,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    info!(installer, action, "package operation finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_uv() -> UvInstaller {
        UvInstaller {
            binary: "/nonexistent/wheelcheck/uv".to_string(),
        }
    }

    #[test]
    fn test_empty_requirements_spawn_nothing() {
        let uv = missing_uv();
        uv.install(Path::new("python3"), &[]).unwrap();
        uv.uninstall(Path::new("python3"), &[]).unwrap();
        PipInstaller
            .install(Path::new("/nonexistent/python"), &[])
            .unwrap();
    }

    #[test]
    fn test_missing_binary_is_a_spawn_error() {
        let err = missing_uv()
            .install(Path::new("python3"), &["setuptools>=40.8.0".to_string()])
            .unwrap_err();
        assert!(matches!(err, EnvError::Spawn { .. }));
    }

    #[test]
    fn test_installer_for_kind() {
        let toolchain = ToolchainConfig::default();
        assert_eq!(installer_for(InstallerKind::Uv, &toolchain).name(), "uv");
        assert_eq!(installer_for(InstallerKind::Pip, &toolchain).name(), "pip");
    }
}
