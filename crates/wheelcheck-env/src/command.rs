//! Subprocess helpers shared by every crate that shells out to Python.

use std::process::{Command, Output, Stdio};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{EnvError, Result};

/// Prefix of the single stdout line a probe script emits its JSON on.
/// Anything else the interpreter prints (site hooks, warnings) is ignored.
pub const PROBE_MARKER: &str = "__WHEELCHECK_PROBE__";

/// Run `cmd` to completion with stdin closed, capturing stdout and stderr.
/// A non-zero exit is not an error here; callers decide.
pub fn run_captured(cmd: &mut Command) -> Result<Output> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!(command = ?cmd, "spawning");
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| EnvError::Spawn {
            program: program.clone(),
            source,
        })?;
    debug!(program = %program, status = %output.status, "process exited");
    Ok(output)
}

/// Find the last `PROBE_MARKER` line in `stdout` and decode its JSON payload.
/// Returns `None` when no marker line is present.
pub fn parse_marked<T: DeserializeOwned>(stdout: &str) -> Option<serde_json::Result<T>> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim_end().strip_prefix(PROBE_MARKER))
        .map(serde_json::from_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        ok: bool,
    }

    #[test]
    fn test_parse_marked_ignores_noise() {
        let stdout = format!(
            "welcome banner\n{{\"ok\": false}}\n{}{{\"ok\": true}}\ntrailing\n",
            PROBE_MARKER
        );
        let parsed: Payload = parse_marked(&stdout).unwrap().unwrap();
        assert_eq!(parsed, Payload { ok: true });
    }

    #[test]
    fn test_parse_marked_without_marker() {
        assert!(parse_marked::<Payload>("{\"ok\": true}\n").is_none());
        let bad = format!("{}not json", PROBE_MARKER);
        assert!(parse_marked::<Payload>(&bad).unwrap().is_err());
    }

    #[test]
    fn test_run_captured_missing_program() {
        let err = run_captured(&mut Command::new("wheelcheck-definitely-missing-binary"))
            .unwrap_err();
        assert!(matches!(err, EnvError::Spawn { .. }));
    }
}
