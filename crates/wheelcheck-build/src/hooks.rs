//! PEP 517 hook invocation.
//!
//! Each hook runs in a fresh interpreter of the isolated environment. The
//! request and the result travel through JSON files, so whatever the backend
//! prints on stdout cannot corrupt the exchange.

use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use wheelcheck_env::command::run_captured;
use wheelcheck_env::IsolatedEnv;

use crate::error::{BuildError, Result};
use crate::pyproject::Backend;

const HOOK_RUNNER: &str = r#"
import importlib, json, os, sys, traceback

sys.dont_write_bytecode = True

with open(sys.argv[1], encoding="utf-8") as f:
    request = json.load(f)

def respond(obj):
    with open(sys.argv[2], "w", encoding="utf-8") as f:
        json.dump(obj, f)

for entry in reversed(request["backend_path"]):
    sys.path.insert(0, entry)

module_name, _, object_path = request["backend"].partition(":")
try:
    backend = importlib.import_module(module_name)
    for attr in filter(None, object_path.split(".")):
        backend = getattr(backend, attr)
except Exception:
    respond({"kind": "backend_unavailable", "traceback": traceback.format_exc()})
    sys.exit(1)

hook = getattr(backend, request["hook"], None)
if hook is None:
    respond({"kind": "hook_missing"})
    sys.exit(0)

try:
    result = hook(**request["kwargs"])
except Exception:
    respond({"kind": "hook_failed", "traceback": traceback.format_exc()})
    sys.exit(1)

respond({"kind": "ok", "return": result})
"#;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum HookResponse {
    Ok {
        #[serde(rename = "return")]
        value: Value,
    },
    HookMissing,
    BackendUnavailable {
        traceback: String,
    },
    HookFailed {
        traceback: String,
    },
}

/// Calls hooks of one backend for one source tree inside an isolated environment.
pub struct HookCaller<'a> {
    backend: &'a Backend,
    source_dir: &'a Path,
    env: &'a IsolatedEnv,
}

impl<'a> HookCaller<'a> {
    pub fn new(backend: &'a Backend, source_dir: &'a Path, env: &'a IsolatedEnv) -> Self {
        Self {
            backend,
            source_dir,
            env,
        }
    }

    /// Call `hook(**kwargs)`. `Ok(None)` means the backend does not define it.
    pub fn call(&self, hook: &str, kwargs: Value) -> Result<Option<Value>> {
        let scratch = tempfile::Builder::new()
            .prefix("wheelcheck-hook-")
            .tempdir()
            .map_err(|source| BuildError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let request_path = scratch.path().join("request.json");
        let response_path = scratch.path().join("response.json");

        let backend_path: Vec<String> = self
            .backend
            .backend_path
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let request = json!({
            "backend": self.backend.backend,
            "backend_path": backend_path,
            "hook": hook,
            "kwargs": kwargs,
        });
        std::fs::write(&request_path, request.to_string()).map_err(|source| BuildError::Io {
            path: request_path.clone(),
            source,
        })?;

        let mut cmd = std::process::Command::new(self.env.python());
        cmd.arg("-c")
            .arg(HOOK_RUNNER)
            .arg(&request_path)
            .arg(&response_path)
            .current_dir(self.source_dir);
        self.env.apply_to(&mut cmd);

        info!(hook, backend = %self.backend.backend, "calling backend hook");
        let output = run_captured(&mut cmd)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(hook, output = %stdout.trim_end(), "backend output");
        }

        let raw = match std::fs::read_to_string(&response_path) {
            Ok(raw) => raw,
            Err(_) => {
                return Err(BuildError::HookCrashed {
                    hook: hook.to_string(),
                    status: output.status,
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
        };
        decode_response(hook, &self.backend.backend, &raw)
    }
}

fn decode_response(hook: &str, backend: &str, raw: &str) -> Result<Option<Value>> {
    let response: HookResponse = serde_json::from_str(raw).map_err(|e| BuildError::HookResponse {
        hook: hook.to_string(),
        message: e.to_string(),
    })?;
    match response {
        HookResponse::Ok { value } => Ok(Some(value)),
        HookResponse::HookMissing => Ok(None),
        HookResponse::BackendUnavailable { traceback } => Err(BuildError::BackendUnavailable {
            backend: backend.to_string(),
            traceback,
        }),
        HookResponse::HookFailed { traceback } => Err(BuildError::HookFailed {
            hook: hook.to_string(),
            traceback,
        }),
    }
}

/// Interpret a `get_requires_for_build_*` result.
pub(crate) fn requirements_from(hook: &str, value: Option<Value>) -> Result<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v).map_err(|e| BuildError::HookResponse {
            hook: hook.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Interpret a `build_*` result: the basename of the produced file.
pub(crate) fn basename_from(hook: &str, value: Option<Value>) -> Result<String> {
    match value {
        None => Err(BuildError::HookMissing {
            hook: hook.to_string(),
        }),
        Some(Value::String(name)) if !name.is_empty() && !name.contains(['/', '\\']) => Ok(name),
        Some(other) => Err(BuildError::HookResponse {
            hook: hook.to_string(),
            message: format!("expected a file name, got {}", other),
        }),
    }
}
