use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while locating, querying or provisioning environments.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("no Python interpreter found (tried {tried}); set WHEELCHECK_PYTHON")]
    InterpreterNotFound { tried: String },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("scheme query against {} failed ({status}):\n{stderr}", .interpreter.display())]
    ProbeFailed {
        interpreter: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unreadable output from {}: {message}", .interpreter.display())]
    ProbeOutput {
        interpreter: PathBuf,
        message: String,
    },

    #[error("environment target {} already exists and is not empty", .0.display())]
    TargetExists(PathBuf),

    #[error("failed to create virtual environment at {} ({status}):\n{stderr}", .path.display())]
    VenvCreate {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("no interpreter found in environment {}", .0.display())]
    MissingEnvInterpreter(PathBuf),

    #[error("{installer} {action} failed ({status}):\n{stderr}")]
    InstallerFailed {
        installer: &'static str,
        action: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EnvError>;
