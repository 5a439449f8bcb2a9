//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod session_event_logger;
pub mod session_store;
pub mod video_call;
