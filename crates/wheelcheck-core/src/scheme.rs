//! Install destination schemes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Logical install category of a wheel entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Purelib,
    Platlib,
    Headers,
    Scripts,
    Data,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purelib => "purelib",
            Self::Platlib => "platlib",
            Self::Headers => "headers",
            Self::Scripts => "scripts",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purelib" => Ok(Self::Purelib),
            "platlib" => Ok(Self::Platlib),
            "headers" => Ok(Self::Headers),
            "scripts" => Ok(Self::Scripts),
            "data" => Ok(Self::Data),
            other => Err(format!("unknown install category '{}'", other)),
        }
    }
}

/// Mapping from install category to an absolute directory, as reported by
/// `sysconfig.get_paths()` of the target interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    pub purelib: PathBuf,
    pub platlib: PathBuf,
    /// Parent of per-distribution header directories
    pub headers: PathBuf,
    pub scripts: PathBuf,
    pub data: PathBuf,
}

impl Scheme {
    /// Conventional POSIX virtual environment layout under `prefix`.
    pub fn for_prefix(prefix: &Path, python_version: (u8, u8)) -> Self {
        let py = format!("python{}.{}", python_version.0, python_version.1);
        let site = prefix.join("lib").join(&py).join("site-packages");
        Self {
            purelib: site.clone(),
            platlib: site,
            headers: prefix.join("include").join("site").join(&py),
            scripts: prefix.join("bin"),
            data: prefix.to_path_buf(),
        }
    }

    pub fn path_for(&self, category: Category) -> &Path {
        match category {
            Category::Purelib => &self.purelib,
            Category::Platlib => &self.platlib,
            Category::Headers => &self.headers,
            Category::Scripts => &self.scripts,
            Category::Data => &self.data,
        }
    }

    /// Directories that may hold `*.dist-info` metadata (deduplicated).
    pub fn site_dirs(&self) -> Vec<&Path> {
        if self.purelib == self.platlib {
            vec![self.purelib.as_path()]
        } else {
            vec![self.purelib.as_path(), self.platlib.as_path()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_prefix_layout() {
        let scheme = Scheme::for_prefix(Path::new("/tmp/env"), (3, 12));
        assert_eq!(
            scheme.purelib,
            PathBuf::from("/tmp/env/lib/python3.12/site-packages")
        );
        assert_eq!(scheme.path_for(Category::Scripts), Path::new("/tmp/env/bin"));
        assert_eq!(scheme.site_dirs().len(), 1);
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for cat in [
            Category::Purelib,
            Category::Platlib,
            Category::Headers,
            Category::Scripts,
            Category::Data,
        ] {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
        assert!("lib".parse::<Category>().is_err());
    }
}
