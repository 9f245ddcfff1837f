use std::path::Path;

use anyhow::Result;
use wheelcheck::Verifier;
use wheelcheck_core::config::ToolchainConfig;

use super::interpreter;

/// `wheelcheck verify`
pub fn cmd_verify(
    module: &str,
    version: Option<&str>,
    distribution: Option<&str>,
    python: Option<&Path>,
    absent: bool,
) -> Result<()> {
    let toolchain = ToolchainConfig::from_env();
    let verifier = Verifier::new(interpreter(python, &toolchain)?);
    if absent {
        verifier.assert_not_importable(module)?;
        println!("{} is not importable", module);
        return Ok(());
    }
    let distribution = distribution.unwrap_or(module);
    let expected = version.unwrap_or_default();
    verifier.assert_version(module, distribution, expected)?;
    println!("{} {} OK", distribution, expected);
    Ok(())
}
