//! Logging infrastructure: the session audit trail.
//!
//! Provides [`JsonlSessionLogger`], a JSONL file writer that implements
//! the [`SessionEventLogger`](dialogos_application::SessionEventLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlSessionLogger;
