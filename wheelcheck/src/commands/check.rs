use std::path::PathBuf;

use anyhow::{Context, Result};
use wheelcheck::{Harness, HarnessOptions, TeardownMode};
use wheelcheck_core::config::{ToolchainConfig, WorkdirConfig};
use wheelcheck_core::InstallerKind;

use super::{installer_kind, interpreter, parse_config_settings, print_json};

pub struct CheckArgs {
    pub source: PathBuf,
    pub module: String,
    pub version: String,
    pub distribution: Option<String>,
    pub python_target: Option<PathBuf>,
    pub teardown: TeardownMode,
    pub installer: Option<InstallerKind>,
    pub config_settings: Vec<String>,
    pub run_scripts: bool,
    pub keep: bool,
}

/// `wheelcheck check`
pub fn cmd_check(args: CheckArgs) -> Result<()> {
    let toolchain = ToolchainConfig::from_env();
    let workdir = WorkdirConfig::from_env();
    let base = interpreter(None, &toolchain)?;

    let mut options = HarnessOptions::new(args.source.clone(), args.module, args.version);
    options.distribution = args.distribution;
    options.python_target = args.python_target;
    options.teardown = args.teardown;
    options.installer = installer_kind(args.installer, &toolchain)?;
    options.config_settings = parse_config_settings(&args.config_settings)?;
    options.run_scripts = args.run_scripts;
    options.workdir_root = workdir.root;
    options.keep_workdir = args.keep || workdir.keep;

    let report = Harness::new(base, toolchain)
        .run(&options)
        .with_context(|| format!("check of {} failed", args.source.display()))?;
    print_json(&report)
}
