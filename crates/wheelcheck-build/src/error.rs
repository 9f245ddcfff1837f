use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;
use wheelcheck_env::EnvError;

/// Errors raised by the build frontend.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid source project {}: {reason}", .path.display())]
    InvalidSource { path: PathBuf, reason: String },

    #[error("destination {} is not an existing directory", .0.display())]
    InvalidDestination(PathBuf),

    #[error("invalid {}: {message}", .path.display())]
    InvalidPyProject { path: PathBuf, message: String },

    #[error("backend-path entry '{entry}' must name a directory inside the source tree")]
    InvalidBackendPath { entry: String },

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("build backend '{backend}' could not be imported:\n{traceback}")]
    BackendUnavailable { backend: String, traceback: String },

    #[error("backend hook '{hook}' raised:\n{traceback}")]
    HookFailed { hook: String, traceback: String },

    #[error("backend hook '{hook}' exited without a result ({status}):\n{stderr}")]
    HookCrashed {
        hook: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("build backend does not provide the '{hook}' hook")]
    HookMissing { hook: String },

    #[error("backend hook '{hook}' returned an unexpected value: {message}")]
    HookResponse { hook: String, message: String },

    #[error("backend reported {} but the file does not exist", .0.display())]
    MissingArtifact(PathBuf),

    #[error("cannot read artifact {}: {message}", .path.display())]
    Artifact { path: PathBuf, message: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BuildError>;
