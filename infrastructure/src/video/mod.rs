//! Video call adapters.

mod local;

pub use local::LocalVideoCall;
