//! Import and distribution-version checks run inside a target interpreter.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use wheelcheck_env::command::{parse_marked, run_captured, PROBE_MARKER};
use wheelcheck_env::{EnvError, Interpreter};

/// Imports `argv[1]`, then reads the version of distribution `argv[2]`.
const IMPORT_PROBE: &str = r#"
import importlib, json, sys
module, dist = sys.argv[1], sys.argv[2]
try:
    importlib.import_module(module)
except ImportError as exc:
    result = {"importable": False, "error": "%s: %s" % (type(exc).__name__, exc)}
else:
    from importlib import metadata
    try:
        result = {"importable": True, "version": metadata.version(dist)}
    except metadata.PackageNotFoundError:
        result = {"importable": True, "version": None}
sys.stdout.write("\n" + MARKER + json.dumps(result) + "\n")
"#;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("module '{module}' is not importable: {error}")]
    NotImportable { module: String, error: String },

    #[error("module imports but distribution '{distribution}' has no installed metadata")]
    MissingMetadata { distribution: String },

    #[error("distribution '{distribution}' has version {found}, expected {expected}")]
    VersionMismatch {
        distribution: String,
        expected: String,
        found: String,
    },

    #[error("module '{module}' is importable but should not be")]
    UnexpectedlyImportable { module: String },

    #[error("import probe produced no usable result: {0}")]
    ProbeOutput(String),

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Outcome of one import probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportProbe {
    Importable { version: Option<String> },
    NotImportable { error: String },
}

#[derive(Debug, Deserialize)]
struct RawProbe {
    importable: bool,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl From<RawProbe> for ImportProbe {
    fn from(raw: RawProbe) -> Self {
        if raw.importable {
            Self::Importable {
                version: raw.version,
            }
        } else {
            Self::NotImportable {
                error: raw.error.unwrap_or_else(|| "ImportError".to_string()),
            }
        }
    }
}

/// Runs checks in a fresh interpreter process, so nothing is cached between
/// probes and the checking process never imports the package itself.
#[derive(Debug, Clone)]
pub struct Verifier {
    interpreter: Interpreter,
}

impl Verifier {
    pub fn new(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }

    pub fn python(&self) -> &Path {
        self.interpreter.executable()
    }

    /// Try to import `module` and read the version of `distribution`.
    pub fn probe(&self, module: &str, distribution: &str) -> Result<ImportProbe, VerifyError> {
        let script = IMPORT_PROBE.replace("MARKER", &format!("{:?}", PROBE_MARKER));
        let mut cmd = self.interpreter.command();
        // -I keeps the working directory and user site off sys.path.
        cmd.arg("-I").arg("-c").arg(script).arg(module).arg(distribution);
        let output = run_captured(&mut cmd)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let raw: RawProbe = match parse_marked(&stdout) {
            Some(Ok(raw)) => raw,
            Some(Err(e)) => return Err(VerifyError::ProbeOutput(e.to_string())),
            None => {
                return Err(VerifyError::ProbeOutput(format!(
                    "exit status {}; stderr: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )))
            }
        };
        let probe = ImportProbe::from(raw);
        debug!(python = %self.python().display(), module, ?probe, "import probe");
        Ok(probe)
    }

    /// `module` imports and `distribution` reports exactly `expected`.
    pub fn assert_version(
        &self,
        module: &str,
        distribution: &str,
        expected: &str,
    ) -> Result<(), VerifyError> {
        match self.probe(module, distribution)? {
            ImportProbe::NotImportable { error } => Err(VerifyError::NotImportable {
                module: module.to_string(),
                error,
            }),
            ImportProbe::Importable { version: None } => Err(VerifyError::MissingMetadata {
                distribution: distribution.to_string(),
            }),
            ImportProbe::Importable {
                version: Some(found),
            } if found != expected => Err(VerifyError::VersionMismatch {
                distribution: distribution.to_string(),
                expected: expected.to_string(),
                found,
            }),
            ImportProbe::Importable { .. } => {
                info!(module, distribution, version = expected, "version verified");
                Ok(())
            }
        }
    }

    /// Importing `module` fails with an import-resolution error.
    pub fn assert_not_importable(&self, module: &str) -> Result<(), VerifyError> {
        match self.probe(module, module)? {
            ImportProbe::NotImportable { error } => {
                debug!(module, %error, "not importable, as expected");
                Ok(())
            }
            ImportProbe::Importable { .. } => Err(VerifyError::UnexpectedlyImportable {
                module: module.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_probe_conversion() {
        let raw: RawProbe =
            serde_json::from_str(r#"{"importable": true, "version": "0.0.1"}"#).unwrap();
        assert_eq!(
            ImportProbe::from(raw),
            ImportProbe::Importable {
                version: Some("0.0.1".to_string())
            }
        );
        let raw: RawProbe = serde_json::from_str(
            r#"{"importable": false, "error": "ModuleNotFoundError: No module named 'test_pkg'"}"#,
        )
        .unwrap();
        assert!(matches!(ImportProbe::from(raw), ImportProbe::NotImportable { .. }));
    }

    #[test]
    fn test_probe_with_missing_interpreter() {
        let verifier = Verifier::new(Interpreter::at("/nonexistent/bin/python"));
        assert!(matches!(
            verifier.probe("test_pkg", "test-pkg").unwrap_err(),
            VerifyError::Env(EnvError::Spawn { .. })
        ));
    }
}
