use std::path::Path;

use anyhow::Result;
use wheelcheck_core::config::ToolchainConfig;

use super::{interpreter, print_json};

/// `wheelcheck scheme`
pub fn cmd_scheme(python: Option<&Path>) -> Result<()> {
    let toolchain = ToolchainConfig::from_env();
    let info = interpreter(python, &toolchain)?.query_scheme()?;
    print_json(&info)
}
