//! The environment a wheel is installed into.

use std::path::{Path, PathBuf};

use serde::Serialize;
use wheelcheck_core::Scheme;
use wheelcheck_env::{Interpreter, InterpreterInfo, Result, VenvOptions, VirtualEnv};
use wheelcheck_install::{ScriptKind, SchemeDictionaryDestination};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetKind {
    /// An existing interpreter installation, mutated in place.
    Interpreter,
    /// A virtual environment created for this run.
    Provisioned { root: PathBuf },
}

/// Interpreter plus the scheme it installs into.
#[derive(Debug, Clone)]
pub struct TargetEnvironment {
    interpreter: Interpreter,
    info: InterpreterInfo,
    kind: TargetKind,
}

impl TargetEnvironment {
    /// Target `interpreter`'s own installation. Its scheme is queried out of process.
    pub fn from_interpreter(interpreter: Interpreter) -> Result<Self> {
        let info = interpreter.query_scheme()?;
        Ok(Self {
            interpreter,
            info,
            kind: TargetKind::Interpreter,
        })
    }

    /// Create a virtual environment at `path` from `base` and target it.
    pub fn provision(base: &Interpreter, path: &Path, symlinks: bool) -> Result<Self> {
        let options = VenvOptions {
            symlinks,
            ..VenvOptions::default()
        };
        let venv = VirtualEnv::create(base, path, &options)?;
        let info = venv.query_scheme()?;
        Ok(Self {
            interpreter: venv.interpreter().clone(),
            info,
            kind: TargetKind::Provisioned {
                root: venv.root().to_path_buf(),
            },
        })
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn scheme(&self) -> &Scheme {
        &self.info.scheme
    }

    pub fn info(&self) -> &InterpreterInfo {
        &self.info
    }

    pub fn kind(&self) -> &TargetKind {
        &self.kind
    }

    /// Install destination whose generated scripts run under this target's interpreter.
    pub fn destination(&self, overwrite_existing: bool) -> SchemeDictionaryDestination {
        SchemeDictionaryDestination::new(
            self.info.scheme.clone(),
            self.interpreter.executable().to_path_buf(),
            ScriptKind::Posix,
        )
        .overwrite_existing(overwrite_existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheelcheck_env::EnvError;

    #[test]
    fn test_from_missing_interpreter_fails() {
        let err = TargetEnvironment::from_interpreter(Interpreter::at("/nonexistent/bin/python"))
            .unwrap_err();
        assert!(matches!(err, EnvError::Spawn { .. }));
    }

    #[test]
    fn test_provision_refuses_populated_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("keep.txt"), b"x").unwrap();
        let err = TargetEnvironment::provision(&Interpreter::at("/nonexistent/bin/python"), tmp.path(), true)
            .unwrap_err();
        assert!(matches!(err, EnvError::TargetExists(_)));
    }
}
