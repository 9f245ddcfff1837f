use std::path::Path;

use anyhow::Result;
use serde_json::json;
use wheelcheck_core::config::ToolchainConfig;
use wheelcheck_env::{VenvOptions, VirtualEnv};

use super::{interpreter, print_json};

/// `wheelcheck venv`
pub fn cmd_venv(path: &Path, copies: bool, with_pip: bool) -> Result<()> {
    let toolchain = ToolchainConfig::from_env();
    let base = interpreter(None, &toolchain)?;
    let options = VenvOptions {
        symlinks: !copies,
        with_pip,
    };
    let venv = VirtualEnv::create(&base, path, &options)?;
    print_json(&json!({
        "root": venv.root(),
        "python": venv.python(),
    }))
}
