//! Small value types shared by the build, install and harness crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Backend-specific `config_settings` passed through to PEP 517 hooks.
pub type ConfigSettings = BTreeMap<String, serde_json::Value>;

/// Which distribution the build backend is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    Sdist,
    #[default]
    Wheel,
}

impl DistributionKind {
    /// Suffix of the PEP 517 hook names (`build_wheel`, `get_requires_for_build_sdist`, ...).
    pub fn hook_suffix(self) -> &'static str {
        match self {
            Self::Sdist => "sdist",
            Self::Wheel => "wheel",
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hook_suffix())
    }
}

impl FromStr for DistributionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sdist" => Ok(Self::Sdist),
            "wheel" => Ok(Self::Wheel),
            other => Err(format!(
                "unknown distribution kind '{}' (expected sdist or wheel)",
                other
            )),
        }
    }
}

/// Package installer used inside environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerKind {
    #[default]
    Uv,
    Pip,
}

impl InstallerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uv => "uv",
            Self::Pip => "pip",
        }
    }
}

impl fmt::Display for InstallerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uv" => Ok(Self::Uv),
            "pip" => Ok(Self::Pip),
            other => Err(format!("unknown installer '{}' (expected uv or pip)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_kind_parse() {
        assert_eq!("wheel".parse::<DistributionKind>().unwrap(), DistributionKind::Wheel);
        assert_eq!(" SDIST ".parse::<DistributionKind>().unwrap(), DistributionKind::Sdist);
        assert!("egg".parse::<DistributionKind>().is_err());
        assert_eq!(DistributionKind::default(), DistributionKind::Wheel);
    }

    #[test]
    fn test_installer_kind_parse() {
        assert_eq!("pip".parse::<InstallerKind>().unwrap(), InstallerKind::Pip);
        assert_eq!(InstallerKind::default().to_string(), "uv");
        assert!("poetry".parse::<InstallerKind>().is_err());
    }
}
