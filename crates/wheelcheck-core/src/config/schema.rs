//! Configuration structs grouped by concern.
//!
//! Loaded from environment variables with a shared fallback chain.

use super::env_keys::{observability as obv_keys, toolchain, workdir};
use super::loader::{env_bool, env_optional, env_or};
use std::path::PathBuf;

/// Interpreter and installer selection.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Explicit base interpreter; `None` means look up `python3`/`python` on PATH
    pub python: Option<PathBuf>,
    /// `uv` or `pip`, parsed later into `InstallerKind`
    pub installer: String,
    /// uv executable name or path
    pub uv: String,
}

impl ToolchainConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            python: env_optional(toolchain::WHEELCHECK_PYTHON, toolchain::PYTHON_ALIASES)
                .map(PathBuf::from),
            installer: env_or(toolchain::WHEELCHECK_INSTALLER, &[], || "uv".to_string()),
            uv: env_or(toolchain::WHEELCHECK_UV, toolchain::UV_ALIASES, || {
                "uv".to_string()
            }),
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            python: None,
            installer: "uv".to_string(),
            uv: "uv".to_string(),
        }
    }
}

/// Where run directories are created and whether they survive the run.
#[derive(Debug, Clone, Default)]
pub struct WorkdirConfig {
    /// Parent directory for run directories; `None` uses the system temp dir
    pub root: Option<PathBuf>,
    pub keep: bool,
}

impl WorkdirConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            root: env_optional(workdir::WHEELCHECK_WORKDIR, &[]).map(PathBuf::from),
            keep: env_bool(workdir::WHEELCHECK_KEEP_WORKDIR, &[], false),
        }
    }
}

/// Observability: quiet, log_level, log_json, events_log
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub events_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::WHEELCHECK_QUIET, &[], false),
                log_level: env_or(obv_keys::WHEELCHECK_LOG_LEVEL, &[], || {
                    "wheelcheck=info".to_string()
                }),
                log_json: env_bool(obv_keys::WHEELCHECK_LOG_JSON, &[], false),
                events_log: env_optional(obv_keys::WHEELCHECK_EVENTS_LOG, &[]),
            }
        })
    }
}
