//! Scoped build environments.
//!
//! An [`IsolatedEnv`] owns a temporary virtual environment for exactly one
//! build. The directory is removed when the guard drops, whichever way the
//! build ends.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use tracing::{debug, info, warn};
use wheelcheck_core::config::ToolchainConfig;
use wheelcheck_core::InstallerKind;

use crate::error::{EnvError, Result};
use crate::installer::{installer_for, PackageInstaller};
use crate::interpreter::Interpreter;
use crate::venv::{VenvOptions, VirtualEnv};

pub struct IsolatedEnv {
    venv: VirtualEnv,
    installer: Box<dyn PackageInstaller>,
    dir: Option<TempDir>,
}

impl IsolatedEnv {
    /// Create a fresh environment from `base`. pip is only seeded when
    /// `kind` is pip; uv installs into a bare environment.
    pub fn create(base: &Interpreter, kind: InstallerKind, toolchain: &ToolchainConfig) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("wheelcheck-build-env-")
            .tempdir()
            .map_err(|source| EnvError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let options = VenvOptions {
            symlinks: true,
            with_pip: kind == InstallerKind::Pip,
        };
        let venv = VirtualEnv::create(base, dir.path(), &options)?;
        info!(root = %dir.path().display(), installer = %kind, "acquired isolated build environment");
        Ok(Self {
            venv,
            installer: installer_for(kind, toolchain),
            dir: Some(dir),
        })
    }

    /// Install requirements into the environment. Empty input spawns nothing.
    pub fn install(&self, requirements: &[String]) -> Result<()> {
        if requirements.is_empty() {
            debug!("no requirements to install");
            return Ok(());
        }
        info!(
            installer = self.installer.name(),
            requirements = ?requirements,
            "installing build requirements"
        );
        self.installer.install(self.venv.python(), requirements)
    }

    pub fn python(&self) -> &Path {
        self.venv.python()
    }

    /// Make `cmd` run as if this environment were activated.
    pub fn apply_to(&self, cmd: &mut Command) {
        let bin = self.venv.bin_dir();
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let path = std::iter::once(bin.clone()).chain(std::env::split_paths(&inherited));
        match std::env::join_paths(path) {
            Ok(joined) => {
                cmd.env("PATH", joined);
            }
            Err(_) => {
                cmd.env("PATH", OsString::from(bin.as_os_str()));
            }
        }
        cmd.env("VIRTUAL_ENV", self.venv.root());
        cmd.env_remove("PYTHONHOME");
    }
}

impl Drop for IsolatedEnv {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(root = %path.display(), "released isolated build environment"),
                Err(e) => warn!(root = %path.display(), error = %e, "failed to remove isolated build environment"),
            }
        }
    }
}
