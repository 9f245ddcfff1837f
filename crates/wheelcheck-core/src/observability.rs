//! Observability: tracing init and the JSONL run event log.
//!
//! Uses `config::ObservabilityConfig` for WHEELCHECK_QUIET, LOG_LEVEL, LOG_JSON, EVENTS_LOG.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde_json::{json, Value};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// Initialize tracing. Call once at process startup.
/// When WHEELCHECK_QUIET=1 only WARN and above are logged.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "wheelcheck=warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}

/// Append a pipeline event to WHEELCHECK_EVENTS_LOG, if configured.
///
/// `fields` must be a JSON object; its keys are merged next to `ts` and `event`.
pub fn record_event(event: &str, fields: Value) {
    if let Some(path) = ObservabilityConfig::from_env().events_log.as_deref() {
        append_event(Path::new(path), event, fields);
    }
}

/// Append one event line to `path`. Write failures are ignored.
pub fn append_event(path: &Path, event: &str, fields: Value) {
    let mut record = json!({
        "ts": Utc::now().to_rfc3339(),
        "event": event,
    });
    if let (Some(obj), Value::Object(extra)) = (record.as_object_mut(), fields) {
        obj.extend(extra);
    }
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        if let Ok(line) = serde_json::to_string(&record) {
            let _ = writeln!(f, "{}", line);
        }
    }
}
