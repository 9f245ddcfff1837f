//! Subcommand handlers. Each prints its result to stdout; logs go to stderr.

pub mod build;
pub mod check;
pub mod install;
pub mod scheme;
pub mod uninstall;
pub mod venv;
pub mod verify;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::Value;
use wheelcheck_core::config::ToolchainConfig;
use wheelcheck_core::{ConfigSettings, InstallerKind};
use wheelcheck_env::Interpreter;

/// `--python` if given, else the configured or discovered base interpreter.
pub(crate) fn interpreter(python: Option<&Path>, toolchain: &ToolchainConfig) -> Result<Interpreter> {
    match python {
        Some(python) => Ok(Interpreter::at(python)),
        None => Interpreter::discover(toolchain).context("no Python interpreter available"),
    }
}

/// CLI choice first, then WHEELCHECK_INSTALLER.
pub(crate) fn installer_kind(
    cli: Option<InstallerKind>,
    toolchain: &ToolchainConfig,
) -> Result<InstallerKind> {
    match cli {
        Some(kind) => Ok(kind),
        None => toolchain
            .installer
            .parse()
            .map_err(|e: String| anyhow!(e))
            .context("invalid WHEELCHECK_INSTALLER"),
    }
}

/// `-C key=value` pairs. A repeated key collects its values into a list.
pub(crate) fn parse_config_settings(pairs: &[String]) -> Result<ConfigSettings> {
    let mut settings = ConfigSettings::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("config setting '{}' is not KEY=VALUE", pair))?;
        let value = Value::String(value.to_string());
        match settings.get_mut(key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                settings.insert(key.to_string(), value);
            }
        }
    }
    Ok(settings)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
