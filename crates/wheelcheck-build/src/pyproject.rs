//! `pyproject.toml` build-system declaration and backend resolution (PEP 517/518).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BuildError, Result};

/// Backend used when a project has no `[build-system]` or names no backend.
pub const DEFAULT_BACKEND: &str = "setuptools.build_meta:__legacy__";

/// Requirements of the default backend when nothing is declared.
pub const DEFAULT_REQUIRES: &[&str] = &["setuptools >= 40.8.0"];

/// The subset of `pyproject.toml` a build frontend reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PyProjectToml {
    pub build_system: Option<BuildSystem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSystem {
    /// PEP 508 requirements needed to import the backend
    pub requires: Vec<String>,
    pub build_backend: Option<String>,
    /// In-tree directories prepended to `sys.path` before importing the backend
    pub backend_path: Option<Vec<String>>,
}

impl PyProjectToml {
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BuildError::InvalidPyProject {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// A resolved build backend: the object to import and what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Backend {
    /// `module[:object]` reference
    pub backend: String,
    /// Absolute in-tree directories
    pub backend_path: Vec<PathBuf>,
    /// Static build requirements
    pub requirements: Vec<String>,
}

impl Backend {
    fn default_with(requirements: Vec<String>) -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            backend_path: Vec::new(),
            requirements,
        }
    }

    /// Resolve the backend declared by the project in `source_dir`.
    pub fn resolve(source_dir: &Path) -> Result<Self> {
        let pyproject_path = source_dir.join("pyproject.toml");
        let pyproject = if pyproject_path.is_file() {
            let content = std::fs::read_to_string(&pyproject_path).map_err(|source| BuildError::Io {
                path: pyproject_path.clone(),
                source,
            })?;
            Some(PyProjectToml::parse(&pyproject_path, &content)?)
        } else {
            None
        };

        let backend = match pyproject.and_then(|p| p.build_system) {
            Some(BuildSystem {
                requires,
                build_backend: Some(backend),
                backend_path,
            }) => Self {
                backend,
                backend_path: resolve_backend_path(source_dir, backend_path.unwrap_or_default())?,
                requirements: requires,
            },
            Some(BuildSystem {
                requires,
                build_backend: None,
                ..
            }) => Self::default_with(requires),
            None => {
                if !source_dir.join("setup.py").is_file() {
                    return Err(BuildError::InvalidSource {
                        path: source_dir.to_path_buf(),
                        reason: "neither a [build-system] table in pyproject.toml nor setup.py".to_string(),
                    });
                }
                Self::default_with(DEFAULT_REQUIRES.iter().map(|s| s.to_string()).collect())
            }
        };
        debug!(backend = %backend.backend, requires = ?backend.requirements, "resolved build backend");
        Ok(backend)
    }
}

fn resolve_backend_path(source_dir: &Path, entries: Vec<String>) -> Result<Vec<PathBuf>> {
    let root = source_dir.canonicalize().map_err(|source| BuildError::Io {
        path: source_dir.to_path_buf(),
        source,
    })?;
    entries
        .into_iter()
        .map(|entry| {
            let resolved = root
                .join(&entry)
                .canonicalize()
                .map_err(|_| BuildError::InvalidBackendPath { entry: entry.clone() })?;
            if !resolved.starts_with(&root) || !resolved.is_dir() {
                return Err(BuildError::InvalidBackendPath { entry });
            }
            Ok(resolved)
        })
        .collect()
}
