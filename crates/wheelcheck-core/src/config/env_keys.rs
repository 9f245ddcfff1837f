//! Environment variable keys.

/// Interpreter and package installer selection
pub mod toolchain {
    /// Base interpreter used to create environments (default: `python3`, then `python` on PATH)
    pub const WHEELCHECK_PYTHON: &str = "WHEELCHECK_PYTHON";
    pub const PYTHON_ALIASES: &[&str] = &["PYTHON"];

    /// Package installer used for build requirements and teardown: `uv` (default) or `pip`
    pub const WHEELCHECK_INSTALLER: &str = "WHEELCHECK_INSTALLER";

    /// uv executable
    pub const WHEELCHECK_UV: &str = "WHEELCHECK_UV";
    pub const UV_ALIASES: &[&str] = &["UV"];
}

/// Run directories
pub mod workdir {
    pub const WHEELCHECK_WORKDIR: &str = "WHEELCHECK_WORKDIR";
    pub const WHEELCHECK_KEEP_WORKDIR: &str = "WHEELCHECK_KEEP_WORKDIR";
}

/// Logging and event log
pub mod observability {
    pub const WHEELCHECK_QUIET: &str = "WHEELCHECK_QUIET";
    pub const WHEELCHECK_LOG_LEVEL: &str = "WHEELCHECK_LOG_LEVEL";
    pub const WHEELCHECK_LOG_JSON: &str = "WHEELCHECK_LOG_JSON";
    pub const WHEELCHECK_EVENTS_LOG: &str = "WHEELCHECK_EVENTS_LOG";
}
