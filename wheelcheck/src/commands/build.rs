use std::path::Path;

use anyhow::{Context, Result};
use wheelcheck_build::BuildOptions;
use wheelcheck_core::config::ToolchainConfig;
use wheelcheck_core::{DistributionKind, InstallerKind};

use super::{installer_kind, interpreter, parse_config_settings};

/// `wheelcheck build`
pub fn cmd_build(
    source: &Path,
    out: &Path,
    sdist: bool,
    installer: Option<InstallerKind>,
    config_settings: &[String],
) -> Result<()> {
    let toolchain = ToolchainConfig::from_env();
    let base = interpreter(None, &toolchain)?;
    std::fs::create_dir_all(out)
        .with_context(|| format!("cannot create output directory {}", out.display()))?;
    let options = BuildOptions {
        kind: if sdist {
            DistributionKind::Sdist
        } else {
            DistributionKind::Wheel
        },
        installer: installer_kind(installer, &toolchain)?,
        config_settings: parse_config_settings(config_settings)?,
    };
    let artifact = wheelcheck_build::build(source, out, &options, &base, &toolchain)
        .with_context(|| format!("building {} failed", source.display()))?;
    println!("{}", artifact.display());
    Ok(())
}
