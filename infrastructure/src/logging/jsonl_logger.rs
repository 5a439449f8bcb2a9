//! JSONL audit trail for session events.
//!
//! One line per event, keyed by session:
//!
//! ```text
//! {"seq":7,"timestamp":"…","type":"mutation_applied","session_id":"s1","version":3,…}
//! ```
//!
//! `seq` keeps counting across reopenings of the same file, so the lines of
//! one session can be ordered even when several runs share a log.

use dialogos_application::{SessionEvent, SessionEventLogger};
use dialogos_domain::SessionId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Keys owned by the record header; payload fields with these names are dropped.
const HEADER_KEYS: [&str; 4] = ["seq", "timestamp", "type", "session_id"];

#[derive(Serialize)]
struct AuditRecord<'a> {
    seq: u64,
    timestamp: String,
    #[serde(rename = "type")]
    event_type: &'static str,
    session_id: &'a SessionId,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

struct AuditWriter {
    out: BufWriter<File>,
    next_seq: u64,
}

/// Append-only audit log, one JSON object per line.
pub struct JsonlSessionLogger {
    writer: Mutex<AuditWriter>,
    path: PathBuf,
}

impl JsonlSessionLogger {
    /// Open (or create) the audit log at `path`, creating parent directories.
    ///
    /// Returns `None` when the file cannot be opened; the session runs
    /// without an audit trail in that case.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create audit log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
        {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log file {}: {}", path.display(), e);
                return None;
            }
        };

        let existing = BufReader::new(&file).lines().map_while(Result::ok).count() as u64;

        Some(Self {
            writer: Mutex::new(AuditWriter {
                out: BufWriter::new(file),
                next_seq: existing + 1,
            }),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fields_of(payload: Value) -> Map<String, Value> {
        match payload {
            Value::Object(mut map) => {
                map.retain(|key, _| !HEADER_KEYS.contains(&key.as_str()));
                map
            }
            Value::Null => Map::new(),
            other => Map::from_iter([("data".to_string(), other)]),
        }
    }
}

impl SessionEventLogger for JsonlSessionLogger {
    fn log(&self, event: SessionEvent) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };

        let record = AuditRecord {
            seq: writer.next_seq,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event_type: event.event_type,
            session_id: &event.session_id,
            fields: Self::fields_of(event.payload),
        };
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if writeln!(writer.out, "{}", line).is_ok() {
            writer.next_seq += 1;
        }
        let _ = writer.out.flush();
    }
}

impl Drop for JsonlSessionLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn event(event_type: &'static str, session: &str, payload: Value) -> SessionEvent {
        SessionEvent::new(event_type, SessionId::new(session), payload)
    }

    #[test]
    fn test_records_carry_session_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("sessions.jsonl");
        let logger = JsonlSessionLogger::new(&path).unwrap();
        assert_eq!(logger.path(), path.as_path());

        logger.log(event(
            "session_created",
            "s1",
            serde_json::json!({ "host": "u1" }),
        ));
        logger.log(event(
            "mutation_applied",
            "s1-g2",
            serde_json::json!({ "version": 2 }),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r["timestamp"].is_string()));
        assert_eq!(records[0]["seq"], 1);
        assert_eq!(records[0]["type"], "session_created");
        assert_eq!(records[0]["session_id"], "s1");
        assert_eq!(records[0]["host"], "u1");
        assert_eq!(records[1]["seq"], 2);
        assert_eq!(records[1]["session_id"], "s1-g2");
        assert_eq!(records[1]["version"], 2);
    }

    #[test]
    fn test_payload_cannot_override_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.jsonl");
        let logger = JsonlSessionLogger::new(&path).unwrap();

        logger.log(event(
            "mutation_rejected",
            "s1",
            serde_json::json!({ "session_id": "other", "type": "bogus", "error": "nope" }),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["session_id"], "s1");
        assert_eq!(records[0]["type"], "mutation_rejected");
        assert_eq!(records[0]["error"], "nope");
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.jsonl");
        let logger = JsonlSessionLogger::new(&path).unwrap();

        logger.log(event("note", "s1", serde_json::json!("just a string")));
        logger.log(event("ping", "s1", Value::Null));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["data"], "just a string");
        assert!(records[1].get("data").is_none());
    }

    #[test]
    fn test_reopening_appends_and_continues_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.jsonl");

        for id in ["s1", "s2"] {
            let logger = JsonlSessionLogger::new(&path).unwrap();
            logger.log(event("session_created", id, serde_json::json!({})));
        }

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["session_id"], "s2");
        assert_eq!(records[1]["seq"], 2);
    }

    #[test]
    fn test_unwritable_path_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // a regular file cannot be a parent directory
        assert!(JsonlSessionLogger::new(blocker.join("sessions.jsonl")).is_none());
    }
}
