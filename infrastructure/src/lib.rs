//! Infrastructure layer for dialogos
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the authoritative session store, its
//! auto-advance timer, a local video call, configuration file loading
//! and the JSONL audit log.

pub mod config;
pub mod logging;
pub mod scheduler;
pub mod store;
pub mod video;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileConfig, FileLoggingConfig, FileOutputConfig, FileSafetyConfig,
    FileSessionConfig,
};
pub use logging::JsonlSessionLogger;
pub use scheduler::AutoAdvanceScheduler;
pub use store::InMemorySessionStore;
pub use video::LocalVideoCall;
