use std::path::Path;

use anyhow::{Context, Result};
use wheelcheck::TargetEnvironment;
use wheelcheck_core::config::ToolchainConfig;
use wheelcheck_env::VirtualEnv;
use wheelcheck_install::{AdditionalMetadata, WheelFile};

use super::{interpreter, print_json};

/// `wheelcheck install`
pub fn cmd_install(
    wheel: &Path,
    python: Option<&Path>,
    venv: Option<&Path>,
    overwrite: bool,
) -> Result<()> {
    let toolchain = ToolchainConfig::from_env();
    let target_python = match venv {
        Some(dir) => VirtualEnv::open(dir)?.interpreter().clone(),
        None => interpreter(python, &toolchain)?,
    };
    let target = TargetEnvironment::from_interpreter(target_python)?;
    let mut wheel_file =
        WheelFile::open(wheel).with_context(|| format!("cannot open {}", wheel.display()))?;
    let installed = wheelcheck_install::install(
        &mut wheel_file,
        &target.destination(overwrite),
        &AdditionalMetadata::new(),
    )?;
    print_json(&installed)
}
