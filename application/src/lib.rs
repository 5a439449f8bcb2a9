//! Application layer for dialogos
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::SessionPolicyConfig;
pub use ports::{
    session_event_logger::{NoSessionEventLogger, SessionEvent, SessionEventLogger},
    session_store::{SessionStoreGateway, SessionSubscription, StoreError},
    video_call::{NoVideoCall, VideoCallController, VideoCallError, disable_video},
};
pub use use_cases::create_session::{CreateSessionInput, CreateSessionUseCase};
pub use use_cases::resolve_partition::{PartitionOutcome, ResolvePartitionUseCase};
pub use use_cases::session_client::{SessionClient, SessionClientError};
