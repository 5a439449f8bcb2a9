//! Local, provider-less call transport.
//!
//! Tracks camera and microphone state in memory. Used by the simulator and
//! by sessions that run without a video provider attached.

use async_trait::async_trait;
use dialogos_application::{VideoCallController, VideoCallError};
use dialogos_domain::{ConnectionStatus, UserId};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

pub struct LocalVideoCall {
    user: UserId,
    video: AtomicBool,
    muted: AtomicBool,
    connection: Mutex<ConnectionStatus>,
}

impl LocalVideoCall {
    /// A connected call with camera on and microphone live.
    pub fn connected(user: impl Into<UserId>) -> Self {
        Self {
            user: user.into(),
            video: AtomicBool::new(true),
            muted: AtomicBool::new(false),
            connection: Mutex::new(ConnectionStatus::Good),
        }
    }

    pub fn set_connection(&self, status: ConnectionStatus) {
        if let Ok(mut connection) = self.connection.lock() {
            *connection = status;
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<(), VideoCallError> {
        if self.connection_state() == ConnectionStatus::Disconnected {
            Err(VideoCallError::NotConnected)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl VideoCallController for LocalVideoCall {
    async fn toggle_video(&self) -> Result<bool, VideoCallError> {
        self.ensure_connected()?;
        let enabled = !self.video.fetch_xor(true, Ordering::SeqCst);
        info!("Video for {} {}", self.user, if enabled { "on" } else { "off" });
        Ok(enabled)
    }

    async fn toggle_mute(&self) -> Result<bool, VideoCallError> {
        self.ensure_connected()?;
        let muted = !self.muted.fetch_xor(true, Ordering::SeqCst);
        info!("Microphone for {} {}", self.user, if muted { "muted" } else { "live" });
        Ok(muted)
    }

    fn is_video_enabled(&self) -> bool {
        self.video.load(Ordering::SeqCst)
    }

    fn connection_state(&self) -> ConnectionStatus {
        self.connection
            .lock()
            .map(|c| *c)
            .unwrap_or(ConnectionStatus::Disconnected)
    }
}
