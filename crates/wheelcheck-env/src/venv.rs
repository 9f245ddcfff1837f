//! Virtual environment provisioning via the base interpreter's `venv` module.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::run_captured;
use crate::error::{EnvError, Result};
use crate::interpreter::{Interpreter, InterpreterInfo};

/// How to lay out a new environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VenvOptions {
    /// Symlink the interpreter binaries instead of copying them
    pub symlinks: bool,
    /// Seed pip via `ensurepip`
    pub with_pip: bool,
}

impl Default for VenvOptions {
    fn default() -> Self {
        Self {
            symlinks: true,
            with_pip: false,
        }
    }
}

/// An isolated interpreter environment rooted at a directory.
#[derive(Debug, Clone)]
pub struct VirtualEnv {
    root: PathBuf,
    interpreter: Interpreter,
}

impl VirtualEnv {
    /// Create a new environment at `path` from `base`.
    ///
    /// `path` must not exist or must be an empty directory.
    pub fn create(base: &Interpreter, path: &Path, options: &VenvOptions) -> Result<Self> {
        ensure_vacant(path)?;

        let mut cmd = base.command();
        cmd.args(venv_args(path, options));
        let output = run_captured(&mut cmd)?;
        if !output.status.success() {
            return Err(EnvError::VenvCreate {
                path: path.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let venv = Self::open(path)?;
        info!(
            root = %venv.root.display(),
            base = %base.executable().display(),
            symlinks = options.symlinks,
            "created virtual environment"
        );
        Ok(venv)
    }

    /// Open an existing environment.
    pub fn open(path: &Path) -> Result<Self> {
        let python = env_python(path).ok_or_else(|| EnvError::MissingEnvInterpreter(path.to_path_buf()))?;
        Ok(Self {
            root: path.to_path_buf(),
            interpreter: Interpreter::at(python),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn python(&self) -> &Path {
        self.interpreter.executable()
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Directory holding the environment's executables.
    pub fn bin_dir(&self) -> PathBuf {
        self.python()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.join("bin"))
    }

    pub fn query_scheme(&self) -> Result<InterpreterInfo> {
        self.interpreter.query_scheme()
    }
}

fn ensure_vacant(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut entries = std::fs::read_dir(path).map_err(|source| EnvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if entries.next().is_some() {
        return Err(EnvError::TargetExists(path.to_path_buf()));
    }
    Ok(())
}

fn venv_args(path: &Path, options: &VenvOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-m".into(), "venv".into()];
    args.push(if options.symlinks { "--symlinks" } else { "--copies" }.into());
    if !options.with_pip {
        args.push("--without-pip".into());
    }
    args.push(path.as_os_str().to_os_string());
    args
}

/// Interpreter inside an environment directory, POSIX or Windows layout.
fn env_python(root: &Path) -> Option<PathBuf> {
    [
        root.join("bin").join("python"),
        root.join("bin").join("python3"),
        root.join("Scripts").join("python.exe"),
    ]
    .into_iter()
    .find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venv_args_default() {
        let args = venv_args(Path::new("/tmp/env"), &VenvOptions::default());
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["-m", "venv", "--symlinks", "--without-pip", "/tmp/env"]);
    }

    #[test]
    fn test_venv_args_copies_with_pip() {
        let opts = VenvOptions {
            symlinks: false,
            with_pip: true,
        };
        let args = venv_args(Path::new("env"), &opts);
        assert!(args.iter().any(|a| a == "--copies"));
        assert!(!args.iter().any(|a| a == "--without-pip"));
    }

    #[test]
    fn test_create_refuses_non_empty_target() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("occupied"), "x").unwrap();
        let err = VirtualEnv::create(
            &Interpreter::at("/nonexistent/python"),
            tmp.path(),
            &VenvOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EnvError::TargetExists(_)));
    }

    #[test]
    fn test_open_finds_posix_layout() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            VirtualEnv::open(tmp.path()).unwrap_err(),
            EnvError::MissingEnvInterpreter(_)
        ));
        std::fs::create_dir_all(tmp.path().join("bin")).unwrap();
        std::fs::write(tmp.path().join("bin").join("python"), "").unwrap();
        let venv = VirtualEnv::open(tmp.path()).unwrap();
        assert_eq!(venv.bin_dir(), tmp.path().join("bin"));
    }
}
