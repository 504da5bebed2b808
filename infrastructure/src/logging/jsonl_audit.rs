//! Append-only JSONL audit trail.
//!
//! Each [`AuditEvent`] becomes one JSON line carrying its payload fields plus
//! `type`, `timestamp` and a per-process `seq`. Existing files are appended
//! to, never truncated.

use civic_application::{AuditEvent, AuditLogger};
use serde_json::{Map, Value, json};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL audit logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex`; the sequence number is assigned under the same
/// lock as the write, so line order and `seq` order agree.
pub struct JsonlAuditLogger {
    writer: Mutex<(u64, BufWriter<File>)>,
    path: PathBuf,
}

impl JsonlAuditLogger {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new((0, BufWriter::new(file))),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: AuditEvent, seq: u64) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut map = match event.payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), json!(event.event_type));
        map.insert("timestamp".to_string(), json!(timestamp));
        map.insert("seq".to_string(), json!(seq));
        Value::Object(map)
    }
}

impl AuditLogger for JsonlAuditLogger {
    fn log(&self, event: AuditEvent) {
        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        let (seq, writer) = &mut *guard;
        *seq += 1;

        let event_type = event.event_type;
        let line = match serde_json::to_string(&Self::record(event, *seq)) {
            Ok(line) => line,
            Err(e) => {
                warn!("Could not serialize audit event {}: {}", event_type, e);
                return;
            }
        };

        // Flushed per line so a crash loses at most the event in flight
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Could not write audit log {}: {}", self.path.display(), e);
        }
    }
}
