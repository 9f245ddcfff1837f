//! Wheel filename convention:
//! `{name}-{version}(-{build})?-{python}-{abi}-{platform}.whl`.

use std::fmt;
use std::str::FromStr;

use crate::error::{InstallError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    /// Escaped distribution name, as it appears in the filename
    pub name: String,
    pub version: String,
    pub build_tag: Option<String>,
    pub python_tags: Vec<String>,
    pub abi_tags: Vec<String>,
    pub platform_tags: Vec<String>,
}

impl WheelFilename {
    pub fn parse(filename: &str) -> Result<Self> {
        let invalid = |reason: &str| InstallError::InvalidFilename {
            filename: filename.to_string(),
            reason: reason.to_string(),
        };
        let stem = filename
            .strip_suffix(".whl")
            .ok_or_else(|| invalid("missing .whl extension"))?;
        let parts: Vec<&str> = stem.split('-').collect();
        let (name, version, build_tag, tags) = match parts.as_slice() {
            [name, version, py, abi, plat] => (*name, *version, None, [*py, *abi, *plat]),
            [name, version, build, py, abi, plat] => {
                if !build.starts_with(|c: char| c.is_ascii_digit()) {
                    return Err(invalid("build tag must start with a digit"));
                }
                (*name, *version, Some(build.to_string()), [*py, *abi, *plat])
            }
            _ => return Err(invalid("expected 5 or 6 dash-separated components")),
        };
        if name.is_empty() || version.is_empty() || tags.iter().any(|t| t.is_empty()) {
            return Err(invalid("empty component"));
        }
        let split = |t: &str| t.split('.').map(str::to_string).collect::<Vec<_>>();
        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            build_tag,
            python_tags: split(tags[0]),
            abi_tags: split(tags[1]),
            platform_tags: split(tags[2]),
        })
    }

    /// `{name}-{version}.dist-info`
    pub fn dist_info_dir(&self) -> String {
        format!("{}-{}.dist-info", self.name, self.version)
    }

    /// `{name}-{version}.data`
    pub fn data_dir(&self) -> String {
        format!("{}-{}.data", self.name, self.version)
    }
}

impl FromStr for WheelFilename {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for WheelFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)?;
        if let Some(ref build) = self.build_tag {
            write!(f, "-{}", build)?;
        }
        write!(
            f,
            "-{}-{}-{}.whl",
            self.python_tags.join("."),
            self.abi_tags.join("."),
            self.platform_tags.join(".")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pure_wheel() {
        let wf = WheelFilename::parse("test_pkg-0.0.1-py3-none-any.whl").unwrap();
        assert_eq!(wf.name, "test_pkg");
        assert_eq!(wf.version, "0.0.1");
        assert_eq!(wf.build_tag, None);
        assert_eq!(wf.dist_info_dir(), "test_pkg-0.0.1.dist-info");
        assert_eq!(wf.data_dir(), "test_pkg-0.0.1.data");
        assert_eq!(wf.to_string(), "test_pkg-0.0.1-py3-none-any.whl");
    }

    #[test]
    fn test_parse_build_tag_and_compressed_tags() {
        let wf: WheelFilename = "pkg-1.0-1abc-py2.py3-none-manylinux_2_17_x86_64.manylinux2014_x86_64.whl"
            .parse()
            .unwrap();
        assert_eq!(wf.build_tag.as_deref(), Some("1abc"));
        assert_eq!(wf.python_tags, vec!["py2", "py3"]);
        assert_eq!(wf.platform_tags.len(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        assert!(WheelFilename::parse("pkg-1.0.tar.gz").is_err());
        assert!(WheelFilename::parse("pkg-1.0-py3-none.whl").is_err());
        assert!(WheelFilename::parse("pkg-1.0-x-py3-none-any.whl").is_err());
        assert!(WheelFilename::parse("-1.0-py3-none-any.whl").is_err());
    }
}
