//! Use cases (application services)

pub mod create_session;
pub mod resolve_partition;
pub mod session_client;
