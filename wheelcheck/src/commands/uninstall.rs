use std::path::Path;

use anyhow::Result;
use wheelcheck::TargetEnvironment;
use wheelcheck_core::config::ToolchainConfig;

use super::{interpreter, print_json};

/// `wheelcheck uninstall`
pub fn cmd_uninstall(distribution: &str, python: Option<&Path>) -> Result<()> {
    let toolchain = ToolchainConfig::from_env();
    let target = TargetEnvironment::from_interpreter(interpreter(python, &toolchain)?)?;
    let report = wheelcheck_install::uninstall(target.scheme(), distribution)?;
    print_json(&report)
}
