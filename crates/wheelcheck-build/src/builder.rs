//! Project builder bound to one isolated environment.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::info;
use wheelcheck_core::{ConfigSettings, DistributionKind};
use wheelcheck_env::IsolatedEnv;

use crate::error::{BuildError, Result};
use crate::hooks::{basename_from, requirements_from, HookCaller};
use crate::pyproject::Backend;

pub struct ProjectBuilder<'env> {
    source_dir: PathBuf,
    backend: Backend,
    env: &'env IsolatedEnv,
}

impl<'env> ProjectBuilder<'env> {
    /// Bind the project at `source_dir` to `env`, which runs every hook.
    pub fn from_isolated_env(env: &'env IsolatedEnv, source_dir: &Path) -> Result<Self> {
        let source_dir = canonical_dir(source_dir).ok_or_else(|| BuildError::InvalidSource {
            path: source_dir.to_path_buf(),
            reason: "not an existing directory".to_string(),
        })?;
        let backend = Backend::resolve(&source_dir)?;
        Ok(Self {
            source_dir,
            backend,
            env,
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Static requirements from `[build-system].requires`.
    pub fn build_system_requires(&self) -> &[String] {
        &self.backend.requirements
    }

    /// Dynamic requirements reported by the backend for `kind`.
    pub fn get_requires_for_build(
        &self,
        kind: DistributionKind,
        config_settings: &ConfigSettings,
    ) -> Result<Vec<String>> {
        let hook = format!("get_requires_for_build_{}", kind.hook_suffix());
        let value = self.hooks().call(&hook, json!({ "config_settings": config_settings }))?;
        requirements_from(&hook, value)
    }

    /// Build `kind` into `out_dir` and return the absolute artifact path.
    pub fn build(
        &self,
        kind: DistributionKind,
        out_dir: &Path,
        config_settings: &ConfigSettings,
    ) -> Result<PathBuf> {
        let out_dir = canonical_dir(out_dir).ok_or_else(|| BuildError::InvalidDestination(out_dir.to_path_buf()))?;
        let hook = format!("build_{}", kind.hook_suffix());
        let directory_arg = format!("{}_directory", kind.hook_suffix());

        let mut kwargs = json!({ "config_settings": config_settings });
        if let Value::Object(ref mut map) = kwargs {
            map.insert(directory_arg, Value::String(out_dir.to_string_lossy().into_owned()));
        }

        let basename = basename_from(&hook, self.hooks().call(&hook, kwargs)?)?;
        let artifact = out_dir.join(basename);
        if !artifact.is_file() {
            return Err(BuildError::MissingArtifact(artifact));
        }
        info!(artifact = %artifact.display(), "built {}", kind);
        Ok(artifact)
    }

    fn hooks(&self) -> HookCaller<'_> {
        HookCaller::new(&self.backend, &self.source_dir, self.env)
    }
}

fn canonical_dir(path: &Path) -> Option<PathBuf> {
    path.canonicalize().ok().filter(|p| p.is_dir())
}
