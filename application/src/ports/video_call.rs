//! Video call controller port
//!
//! The session core only ever turns off the local participant's own
//! camera (safety timeout); everything else about the call is owned by
//! the video provider.

use async_trait::async_trait;
use dialogos_domain::ConnectionStatus;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VideoCallError {
    #[error("Not connected to a call")]
    NotConnected,

    #[error("Video provider error: {0}")]
    Provider(String),
}

/// Local participant's call transport
#[async_trait]
pub trait VideoCallController: Send + Sync {
    /// Flip the camera; returns whether video is now enabled
    async fn toggle_video(&self) -> Result<bool, VideoCallError>;

    /// Flip the microphone; returns whether audio is now muted
    async fn toggle_mute(&self) -> Result<bool, VideoCallError>;

    fn is_video_enabled(&self) -> bool;

    fn connection_state(&self) -> ConnectionStatus;
}

/// Turn the camera off if it is on. Never turns it back on.
pub async fn disable_video(controller: &dyn VideoCallController) -> Result<(), VideoCallError> {
    if controller.is_video_enabled() {
        controller.toggle_video().await?;
    }
    Ok(())
}

/// No-op controller for sessions without a call attached.
pub struct NoVideoCall;

#[async_trait]
impl VideoCallController for NoVideoCall {
    async fn toggle_video(&self) -> Result<bool, VideoCallError> {
        Err(VideoCallError::NotConnected)
    }

    async fn toggle_mute(&self) -> Result<bool, VideoCallError> {
        Err(VideoCallError::NotConnected)
    }

    fn is_video_enabled(&self) -> bool {
        false
    }

    fn connection_state(&self) -> ConnectionStatus {
        ConnectionStatus::Disconnected
    }
}
