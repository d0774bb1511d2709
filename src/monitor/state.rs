//! Per-session state guarded by the monitor's lock.

use crate::config::SessionConfig;
use crate::core::{Evidence, Violation, ViolationKind};
use crate::host::{CaptureKind, CaptureStream};
use crate::report::{Notification, UiEvent, ViolationLog, ViolationReporter};
use crate::signal::{Subscription, Tap};
use chrono::{DateTime, Utc};
use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle of one capture source within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    /// Not requested, or released at session end
    Off,
    /// Requested, grant outstanding
    Pending,
    /// Granted and held by the session
    Active,
    /// Refused or could not be obtained
    Unavailable,
    /// The track ended during the session
    Ended,
}

/// Which monitoring features are currently engaged.
///
/// Starts from the session's [`SessionConfig`] and degrades as sources
/// are refused or end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStatus {
    pub camera: SourceState,
    pub screen_share: SourceState,
    pub lockdown: bool,
    /// Requires an active camera
    pub face_detection: bool,
}

impl FeatureStatus {
    pub fn inactive() -> Self {
        Self {
            camera: SourceState::Off,
            screen_share: SourceState::Off,
            lockdown: false,
            face_detection: false,
        }
    }

    fn requested(config: &SessionConfig) -> Self {
        let requested = |on: bool| {
            if on {
                SourceState::Pending
            } else {
                SourceState::Off
            }
        };
        Self {
            camera: requested(config.camera_enabled),
            screen_share: requested(config.screen_share_enabled),
            lockdown: config.lockdown_enabled,
            face_detection: config.face_detection_enabled && config.camera_enabled,
        }
    }

    pub fn camera_enabled(&self) -> bool {
        self.camera == SourceState::Active
    }

    pub fn screen_share_enabled(&self) -> bool {
        self.screen_share == SourceState::Active
    }

    pub fn source(&self, kind: CaptureKind) -> SourceState {
        match kind {
            CaptureKind::Camera => self.camera,
            CaptureKind::ScreenShare => self.screen_share,
        }
    }

    fn set(&mut self, kind: CaptureKind, state: SourceState) {
        match kind {
            CaptureKind::Camera => {
                self.camera = state;
                if state != SourceState::Active && state != SourceState::Pending {
                    self.face_detection = false;
                }
            }
            CaptureKind::ScreenShare => self.screen_share = state,
        }
    }
}

impl Default for FeatureStatus {
    fn default() -> Self {
        Self::inactive()
    }
}

pub(crate) struct SessionState {
    /// Incremented on every start; stale acquisitions compare against it
    pub(crate) epoch: u64,
    pub(crate) active: bool,
    pub(crate) session_id: Option<Uuid>,
    pub(crate) config: SessionConfig,
    pub(crate) features: FeatureStatus,
    pub(crate) log: ViolationLog,
    camera: Option<Box<dyn CaptureStream>>,
    screen_share: Option<Box<dyn CaptureStream>>,
    subscriptions: Vec<Subscription>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            epoch: 0,
            active: false,
            session_id: None,
            config: SessionConfig::none(),
            features: FeatureStatus::inactive(),
            log: ViolationLog::new(),
            camera: None,
            screen_share: None,
            subscriptions: Vec::new(),
        }
    }

    /// Reset for a new session starting at `started_at` and return its epoch.
    pub(crate) fn begin(&mut self, config: SessionConfig, started_at: DateTime<Utc>) -> u64 {
        self.epoch += 1;
        self.active = true;
        self.session_id = Some(Uuid::new_v4());
        self.config = config;
        self.features = FeatureStatus::requested(&config);
        self.log = ViolationLog::starting_at(started_at);
        self.epoch
    }

    /// Whether `epoch` still names the running session.
    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.active && self.epoch == epoch
    }

    pub(crate) fn subscribe(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub(crate) fn is_subscribed(&self, tap: Tap) -> bool {
        self.subscriptions.iter().any(|s| s.tap() == tap)
    }

    /// Take ownership of a granted stream and its track tap.
    pub(crate) fn install(
        &mut self,
        kind: CaptureKind,
        stream: Box<dyn CaptureStream>,
        subscription: Subscription,
    ) {
        let slot = self.slot(kind);
        if let Some(mut previous) = slot.replace(stream) {
            previous.release();
        }
        self.subscriptions.push(subscription);
        self.features.set(kind, SourceState::Active);
    }

    /// Mark a source as failed without it ever being held.
    pub(crate) fn mark_unavailable(&mut self, kind: CaptureKind) {
        self.features.set(kind, SourceState::Unavailable);
    }

    /// Release a held stream and detach its tap. Returns whether a stream
    /// was held.
    pub(crate) fn release(&mut self, kind: CaptureKind, next: SourceState) -> bool {
        let held = match self.slot(kind).take() {
            Some(mut stream) => {
                stream.release();
                true
            }
            None => false,
        };
        let tap = kind.tap();
        self.subscriptions.retain(|s| s.tap() != tap);
        self.features.set(kind, next);
        held
    }

    /// Release every source and dispose every subscription.
    pub(crate) fn release_all(&mut self) {
        self.release(CaptureKind::Camera, SourceState::Off);
        self.release(CaptureKind::ScreenShare, SourceState::Off);
        self.subscriptions.clear();
        self.features = FeatureStatus::inactive();
    }

    /// Best-effort still from the camera.
    pub(crate) fn capture_evidence(&mut self) -> Option<Evidence> {
        let stream = self.camera.as_mut()?;
        match stream.snapshot() {
            Ok(frame) => Some(Evidence {
                captured_at: Utc::now(),
                content_type: frame.content_type,
                data: frame.data,
            }),
            Err(e) => {
                debug!("evidence capture failed: {e}");
                None
            }
        }
    }

    fn slot(&mut self, kind: CaptureKind) -> &mut Option<Box<dyn CaptureStream>> {
        match kind {
            CaptureKind::Camera => &mut self.camera,
            CaptureKind::ScreenShare => &mut self.screen_share,
        }
    }
}

/// State shared between the monitor and its acquisition tasks.
pub(crate) struct Inner {
    state: Mutex<SessionState>,
    reporter: Arc<dyn ViolationReporter>,
    ui: Sender<UiEvent>,
}

impl Inner {
    pub(crate) fn new(reporter: Arc<dyn ViolationReporter>, ui: Sender<UiEvent>) -> Self {
        Self {
            state: Mutex::new(SessionState::new()),
            reporter,
            ui,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a UI event without blocking.
    pub(crate) fn emit(&self, event: UiEvent) {
        match self.ui.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("ui channel full, dropping event"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Build a violation and append it to the session log.
    ///
    /// Returns `None` when the session is not active; never fails otherwise.
    /// The caller hands the result to [`Inner::publish`] once the session
    /// lock is released.
    pub(crate) fn record(
        &self,
        state: &mut SessionState,
        kind: ViolationKind,
        at: DateTime<Utc>,
    ) -> Option<Violation> {
        if !state.active {
            return None;
        }

        let evidence = state.capture_evidence();
        let violation = Violation::new(kind, state.log.stamp(at), evidence);
        if let Err(e) = state.log.append(violation.clone()) {
            warn!(%kind, "violation dropped: {e}");
            return None;
        }

        debug!(%kind, severity = %violation.severity(), "violation recorded");
        Some(violation)
    }

    /// Report a recorded violation and notify the UI.
    ///
    /// Must run without the session lock held: reporters may stop the
    /// session.
    pub(crate) fn publish(&self, violation: &Violation) {
        self.reporter.report(violation.kind(), violation.severity());
        self.emit(UiEvent::Notify(Notification::for_violation(violation.kind())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_features() {
        let features = FeatureStatus::requested(&SessionConfig::default());
        assert_eq!(features.camera, SourceState::Pending);
        assert_eq!(features.screen_share, SourceState::Pending);
        assert!(features.lockdown);
        assert!(!features.camera_enabled());

        let config = SessionConfig {
            face_detection_enabled: true,
            ..SessionConfig::lockdown_only()
        };
        let features = FeatureStatus::requested(&config);
        assert_eq!(features.camera, SourceState::Off);
        assert!(!features.face_detection);
    }

    #[test]
    fn test_camera_loss_disables_face_detection() {
        let mut features = FeatureStatus::requested(&SessionConfig::from_csv("camera,face"));
        assert!(features.face_detection);

        features.set(CaptureKind::Camera, SourceState::Active);
        assert!(features.face_detection);

        features.set(CaptureKind::Camera, SourceState::Ended);
        assert!(!features.face_detection);
    }

    #[test]
    fn test_epoch_advances_per_session() {
        let mut state = SessionState::new();
        let first = state.begin(SessionConfig::none(), Utc::now());
        assert!(state.is_current(first));

        state.active = false;
        let second = state.begin(SessionConfig::none(), Utc::now());
        assert!(!state.is_current(first));
        assert!(state.is_current(second));
    }
}
