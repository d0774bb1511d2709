//! Hosting environment abstraction.
//!
//! The monitor never talks to a browser directly. Everything it needs from
//! its surroundings (capture grants, tap subscriptions, fullscreen control)
//! goes through the [`Host`] trait.
//!
//! Host methods other than [`Host::acquire`] are invoked while the monitor
//! holds its session lock, so they must not call back into the monitor.
//! Reporters run after the lock is released and may.

pub mod scripted;

use crate::signal::{Subscription, Tap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use scripted::{GrantPolicy, HostCounters, ScriptedHost};

/// A capture device the monitor can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    Camera,
    ScreenShare,
}

impl CaptureKind {
    /// The tap that reports this capture's track lifecycle.
    pub fn tap(self) -> Tap {
        match self {
            CaptureKind::Camera => Tap::Camera,
            CaptureKind::ScreenShare => Tap::ScreenShare,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaptureKind::Camera => "camera",
            CaptureKind::ScreenShare => "screen share",
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by the hosting environment.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("{0} permission denied")]
    PermissionDenied(CaptureKind),

    #[error("{0} unavailable: {1}")]
    Unavailable(CaptureKind, String),

    #[error("fullscreen request rejected: {0}")]
    FullscreenRejected(String),

    #[error("snapshot failed: {0}")]
    SnapshotFailed(String),
}

/// A still frame grabbed from a capture stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A granted capture stream, exclusively owned by the active session.
pub trait CaptureStream: Send {
    fn kind(&self) -> CaptureKind;

    /// Grab a still frame. Must return promptly.
    fn snapshot(&mut self) -> Result<Frame, HostError>;

    /// Stop every track of the stream.
    fn release(&mut self);
}

/// The environment a monitor runs in.
#[async_trait]
pub trait Host: Send + Sync + 'static {
    /// Request a capture grant. Resolves when the user answers the prompt.
    async fn acquire(&self, kind: CaptureKind) -> Result<Box<dyn CaptureStream>, HostError>;

    /// Attach a listener for `tap`. Signals from it are delivered to
    /// [`SessionMonitor::dispatch`](crate::monitor::SessionMonitor::dispatch).
    fn subscribe(&self, tap: Tap) -> Subscription;

    /// Enter exclusive fullscreen presentation.
    fn request_fullscreen(&self) -> Result<(), HostError>;

    fn exit_fullscreen(&self);

    fn is_fullscreen(&self) -> bool;
}
