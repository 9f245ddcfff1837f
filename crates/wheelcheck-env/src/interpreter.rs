//! Interpreter handles and install scheme queries.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wheelcheck_core::config::ToolchainConfig;
use wheelcheck_core::Scheme;

use crate::command::{parse_marked, run_captured, PROBE_MARKER};
use crate::error::{EnvError, Result};

const DEFAULT_NAMES: &[&str] = &["python3", "python"];

/// Prints the interpreter's `sysconfig` paths as one marked JSON line.
const SCHEME_PROBE: &str = r#"
import json, os, sys, sysconfig
paths = sysconfig.get_paths()
ver = sys.version_info
info = {
    "sys_executable": sys.executable,
    "prefix": sys.prefix,
    "base_prefix": getattr(sys, "base_prefix", sys.prefix),
    "version": [ver[0], ver[1]],
    "scheme": {
        "purelib": paths["purelib"],
        "platlib": paths["platlib"],
        "headers": os.path.join(sys.prefix, "include", "site", "python%d.%d" % (ver[0], ver[1])),
        "scripts": paths["scripts"],
        "data": paths["data"],
    },
}
sys.stdout.write("\n" + MARKER + json.dumps(info) + "\n")
"#;

/// A Python interpreter identified by its executable path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    executable: PathBuf,
}

/// What a scheme query reports about an interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterInfo {
    pub sys_executable: PathBuf,
    pub prefix: PathBuf,
    pub base_prefix: PathBuf,
    pub version: (u8, u8),
    pub scheme: Scheme,
}

impl InterpreterInfo {
    /// True when the interpreter runs inside a virtual environment.
    pub fn is_virtualenv(&self) -> bool {
        self.prefix != self.base_prefix
    }
}

impl Interpreter {
    /// Use the interpreter at `executable` as-is.
    pub fn at(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Resolve the base interpreter: the configured one, else `python3`/`python` on PATH.
    pub fn discover(toolchain: &ToolchainConfig) -> Result<Self> {
        if let Some(ref configured) = toolchain.python {
            return which::which(configured)
                .map(Self::at)
                .map_err(|_| EnvError::InterpreterNotFound {
                    tried: configured.display().to_string(),
                });
        }
        for name in DEFAULT_NAMES {
            if let Ok(path) = which::which(name) {
                debug!(python = %path.display(), "discovered interpreter");
                return Ok(Self::at(path));
            }
        }
        Err(EnvError::InterpreterNotFound {
            tried: DEFAULT_NAMES.join(", "),
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// A command that runs this interpreter.
    pub fn command(&self) -> Command {
        Command::new(&self.executable)
    }

    /// Ask the interpreter for its install scheme in a subprocess.
    ///
    /// Stderr of a failed query is carried in the error for diagnosis.
    pub fn query_scheme(&self) -> Result<InterpreterInfo> {
        let script = SCHEME_PROBE.replace("MARKER", &format!("{:?}", PROBE_MARKER));
        let mut cmd = self.command();
        cmd.arg("-I").arg("-c").arg(script);
        let output = run_captured(&mut cmd)?;
        if !output.status.success() {
            return Err(EnvError::ProbeFailed {
                interpreter: self.executable.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let info = decode_probe(&self.executable, &String::from_utf8_lossy(&output.stdout))?;
        info!(
            python = %self.executable.display(),
            purelib = %info.scheme.purelib.display(),
            "queried install scheme"
        );
        Ok(info)
    }
}

fn decode_probe(interpreter: &Path, stdout: &str) -> Result<InterpreterInfo> {
    match parse_marked::<InterpreterInfo>(stdout) {
        Some(Ok(info)) => Ok(info),
        Some(Err(e)) => Err(EnvError::ProbeOutput {
            interpreter: interpreter.to_path_buf(),
            message: e.to_string(),
        }),
        None => Err(EnvError::ProbeOutput {
            interpreter: interpreter.to_path_buf(),
            message: "no scheme line in output".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_probe_payload() {
        let stdout = format!(
            "noise from sitecustomize\n{}{}\n",
            PROBE_MARKER,
            r#"{"sys_executable": "/env/bin/python", "prefix": "/env", "base_prefix": "/usr",
                "version": [3, 11],
                "scheme": {"purelib": "/env/lib/python3.11/site-packages",
                           "platlib": "/env/lib/python3.11/site-packages",
                           "headers": "/env/include/site/python3.11",
                           "scripts": "/env/bin", "data": "/env"}}"#
                .replace('\n', " ")
        );
        let info = decode_probe(Path::new("/env/bin/python"), &stdout).unwrap();
        assert_eq!(info.version, (3, 11));
        assert!(info.is_virtualenv());
        assert_eq!(info.scheme, Scheme::for_prefix(Path::new("/env"), (3, 11)));
    }

    #[test]
    fn test_decode_probe_without_marker() {
        let err = decode_probe(Path::new("python3"), "{}\n").unwrap_err();
        assert!(matches!(err, EnvError::ProbeOutput { .. }));
    }

    #[test]
    fn test_discover_configured_missing() {
        let toolchain = ToolchainConfig {
            python: Some(PathBuf::from("/nonexistent/wheelcheck/python9")),
            ..ToolchainConfig::default()
        };
        let err = Interpreter::discover(&toolchain).unwrap_err();
        assert!(matches!(err, EnvError::InterpreterNotFound { .. }));
    }

    #[test]
    fn test_query_scheme_spawn_failure() {
        let err = Interpreter::at("/nonexistent/wheelcheck/python9")
            .query_scheme()
            .unwrap_err();
        assert!(matches!(err, EnvError::Spawn { .. }));
    }
}
