//! Scripted host used for replays and tests.
//!
//! No real devices are touched: grants resolve according to a per-device
//! [`GrantPolicy`], subscriptions and releases are only counted, and camera
//! snapshots return synthetic frames.

use super::{CaptureKind, CaptureStream, Frame, Host, HostError};
use crate::signal::{Subscription, Tap};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// How a scripted capture request resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantPolicy {
    /// Granted immediately
    Grant,
    /// Refused immediately
    Deny,
    /// Granted once [`ScriptedHost::resolve`] is called
    Manual,
}

/// Side-effect counters, for asserting on what a session did.
#[derive(Debug, Default)]
pub struct HostCounters {
    subscribed: AtomicUsize,
    disposed: AtomicUsize,
    acquisitions: AtomicUsize,
    released: AtomicUsize,
    fullscreen_requests: AtomicUsize,
    fullscreen_exits: AtomicUsize,
}

impl HostCounters {
    pub fn subscribed(&self) -> usize {
        self.subscribed.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Subscriptions attached and not yet disposed.
    pub fn live_subscriptions(&self) -> usize {
        self.subscribed().saturating_sub(self.disposed())
    }

    /// Streams handed out.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Streams released.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn fullscreen_requests(&self) -> usize {
        self.fullscreen_requests.load(Ordering::SeqCst)
    }

    pub fn fullscreen_exits(&self) -> usize {
        self.fullscreen_exits.load(Ordering::SeqCst)
    }
}

/// A host whose behavior is fixed up front.
pub struct ScriptedHost {
    camera: GrantPolicy,
    screen_share: GrantPolicy,
    reject_fullscreen: bool,
    fullscreen: AtomicBool,
    fail_snapshots: Arc<AtomicBool>,
    counters: Arc<HostCounters>,
    camera_gate: Notify,
    screen_share_gate: Notify,
}

impl ScriptedHost {
    /// A host that grants everything.
    pub fn new() -> Self {
        Self {
            camera: GrantPolicy::Grant,
            screen_share: GrantPolicy::Grant,
            reject_fullscreen: false,
            fullscreen: AtomicBool::new(false),
            fail_snapshots: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(HostCounters::default()),
            camera_gate: Notify::new(),
            screen_share_gate: Notify::new(),
        }
    }

    /// Build a host that refuses the devices named in a comma-separated
    /// list (`camera`, `screen`, or `all`).
    pub fn denying(csv: &str) -> Self {
        let names: Vec<String> = csv.split(',').map(|s| s.trim().to_lowercase()).collect();
        let denied = |name: &str| names.iter().any(|n| n == name || n == "all");

        let mut host = Self::new();
        if denied("camera") {
            host.camera = GrantPolicy::Deny;
        }
        if denied("screen") {
            host.screen_share = GrantPolicy::Deny;
        }
        host
    }

    /// Set the grant policy for one device.
    pub fn with_policy(mut self, kind: CaptureKind, policy: GrantPolicy) -> Self {
        match kind {
            CaptureKind::Camera => self.camera = policy,
            CaptureKind::ScreenShare => self.screen_share = policy,
        }
        self
    }

    /// Make every fullscreen request fail.
    pub fn rejecting_fullscreen(mut self) -> Self {
        self.reject_fullscreen = true;
        self
    }

    /// Make camera snapshots fail (or succeed again).
    pub fn fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.store(fail, Ordering::SeqCst);
    }

    /// Let a pending [`GrantPolicy::Manual`] request for `kind` resolve.
    pub fn resolve(&self, kind: CaptureKind) {
        self.gate(kind).notify_one();
    }

    /// Simulate the user leaving fullscreen outside the monitor's control.
    pub fn set_fullscreen(&self, active: bool) {
        self.fullscreen.store(active, Ordering::SeqCst);
    }

    pub fn counters(&self) -> &HostCounters {
        &self.counters
    }

    fn policy(&self, kind: CaptureKind) -> GrantPolicy {
        match kind {
            CaptureKind::Camera => self.camera,
            CaptureKind::ScreenShare => self.screen_share,
        }
    }

    fn gate(&self, kind: CaptureKind) -> &Notify {
        match kind {
            CaptureKind::Camera => &self.camera_gate,
            CaptureKind::ScreenShare => &self.screen_share_gate,
        }
    }

    fn grant(&self, kind: CaptureKind) -> Box<dyn CaptureStream> {
        self.counters.acquisitions.fetch_add(1, Ordering::SeqCst);
        Box::new(ScriptedStream {
            kind,
            frames: 0,
            released: false,
            fail_snapshots: self.fail_snapshots.clone(),
            counters: self.counters.clone(),
        })
    }
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for ScriptedHost {
    async fn acquire(&self, kind: CaptureKind) -> Result<Box<dyn CaptureStream>, HostError> {
        match self.policy(kind) {
            GrantPolicy::Grant => Ok(self.grant(kind)),
            GrantPolicy::Deny => Err(HostError::PermissionDenied(kind)),
            GrantPolicy::Manual => {
                self.gate(kind).notified().await;
                Ok(self.grant(kind))
            }
        }
    }

    fn subscribe(&self, tap: Tap) -> Subscription {
        self.counters.subscribed.fetch_add(1, Ordering::SeqCst);
        let counters = self.counters.clone();
        Subscription::new(tap, move || {
            counters.disposed.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn request_fullscreen(&self) -> Result<(), HostError> {
        self.counters
            .fullscreen_requests
            .fetch_add(1, Ordering::SeqCst);
        if self.reject_fullscreen {
            return Err(HostError::FullscreenRejected(
                "request not triggered by user activation".to_string(),
            ));
        }
        self.fullscreen.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit_fullscreen(&self) {
        self.counters.fullscreen_exits.fetch_add(1, Ordering::SeqCst);
        self.fullscreen.store(false, Ordering::SeqCst);
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }
}

/// A synthetic capture stream.
struct ScriptedStream {
    kind: CaptureKind,
    frames: u64,
    released: bool,
    fail_snapshots: Arc<AtomicBool>,
    counters: Arc<HostCounters>,
}

impl CaptureStream for ScriptedStream {
    fn kind(&self) -> CaptureKind {
        self.kind
    }

    fn snapshot(&mut self) -> Result<Frame, HostError> {
        if self.released {
            return Err(HostError::Unavailable(self.kind, "stream released".to_string()));
        }
        if self.fail_snapshots.load(Ordering::SeqCst) {
            return Err(HostError::SnapshotFailed("video not ready".to_string()));
        }
        self.frames += 1;
        Ok(Frame {
            content_type: "image/jpeg".to_string(),
            data: format!("{}-frame-{}", self.kind.as_str(), self.frames).into_bytes(),
        })
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_grant_and_release() {
        let host = ScriptedHost::new();
        let mut stream = host.acquire(CaptureKind::Camera).await.unwrap();

        assert_eq!(stream.kind(), CaptureKind::Camera);
        assert!(stream.snapshot().is_ok());

        stream.release();
        stream.release();
        assert_eq!(host.counters().released(), 1);
        assert!(stream.snapshot().is_err());
    }

    #[tokio::test]
    async fn test_denying_parses_list() {
        let host = ScriptedHost::denying("screen");
        assert!(host.acquire(CaptureKind::Camera).await.is_ok());
        assert!(matches!(
            host.acquire(CaptureKind::ScreenShare).await,
            Err(HostError::PermissionDenied(CaptureKind::ScreenShare))
        ));

        let host = ScriptedHost::denying("all");
        assert!(host.acquire(CaptureKind::Camera).await.is_err());
    }

    #[tokio::test]
    async fn test_manual_grant_waits_for_resolve() {
        let host = Arc::new(
            ScriptedHost::new().with_policy(CaptureKind::Camera, GrantPolicy::Manual),
        );
        let pending = {
            let host = host.clone();
            tokio::spawn(async move { host.acquire(CaptureKind::Camera).await.is_ok() })
        };

        tokio::task::yield_now().await;
        assert_eq!(host.counters().acquisitions(), 0);

        host.resolve(CaptureKind::Camera);
        assert!(pending.await.unwrap());
        assert_eq!(host.counters().acquisitions(), 1);
    }

    #[test]
    fn test_subscriptions_are_counted() {
        let host = ScriptedHost::new();
        let sub = host.subscribe(Tap::Keyboard);
        assert_eq!(host.counters().live_subscriptions(), 1);
        drop(sub);
        assert_eq!(host.counters().live_subscriptions(), 0);
    }

    #[test]
    fn test_fullscreen_rejection() {
        let host = ScriptedHost::new().rejecting_fullscreen();
        assert!(host.request_fullscreen().is_err());
        assert!(!host.is_fullscreen());
        assert_eq!(host.counters().fullscreen_requests(), 1);
    }
}
