use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, installing or uninstalling a wheel.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read wheel archive {}: {message}", .path.display())]
    Archive { path: PathBuf, message: String },

    #[error("invalid wheel filename '{filename}': {reason}")]
    InvalidFilename { filename: String, reason: String },

    #[error("wheel {} has no usable .dist-info directory: {reason}", .wheel.display())]
    MissingDistInfo { wheel: PathBuf, reason: String },

    #[error("invalid {file}: {reason}")]
    InvalidWheelMetadata { file: String, reason: String },

    #[error("unsupported Wheel-Version {0} (only 1.x is supported)")]
    UnsupportedWheelVersion(String),

    #[error("invalid RECORD: {0}")]
    InvalidRecord(String),

    #[error("RECORD mismatch for '{path}': {reason}")]
    RecordMismatch { path: String, reason: String },

    #[error("refusing unsafe archive path '{0}'")]
    UnsafePath(String),

    #[error("no destination mapped for install category '{0}'")]
    UnmappedCategory(String),

    #[error("unsupported script kind '{0}' (only posix is supported)")]
    UnsupportedScriptKind(String),

    #[error("invalid entry point: {0}")]
    InvalidEntryPoint(String),

    #[error("refusing to overwrite existing file {}", .0.display())]
    FileExists(PathBuf),

    #[error("distribution '{0}' is not installed in this scheme")]
    NotInstalled(String),
}

pub type Result<T> = std::result::Result<T, InstallError>;

pub(crate) fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> InstallError {
    let path = path.into();
    move |source| InstallError::Io { path, source }
}
