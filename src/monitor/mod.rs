//! Session lifecycle controller.
//!
//! [`SessionMonitor`] ties the pieces together: it acquires capture sources
//! and tap subscriptions from the [`Host`] on start, classifies every
//! dispatched signal, records violations, and tears everything down on
//! stop (or drop).
//!
//! Signals are handled one at a time and run to completion; violations are
//! appended in the order their signals were dispatched.

mod acquire;
pub mod state;

use crate::config::SessionConfig;
use crate::core::{rules, Violation};
use crate::host::{CaptureKind, Host};
use crate::report::{SessionReport, SessionStatus, UiEvent, ViolationReporter, ViolationStats};
use crate::signal::{Signal, SignalEvent, Tap};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver};
use state::Inner;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use state::{FeatureStatus, SourceState};

/// Taps held for every session.
const BASE_TAPS: [Tap; 3] = [Tap::Visibility, Tap::Pointer, Tap::PageLifecycle];

/// Taps added under lockdown.
const LOCKDOWN_TAPS: [Tap; 4] = [Tap::ContextMenu, Tap::Keyboard, Tap::Focus, Tap::Fullscreen];

/// Default capacity of the UI event channel.
const UI_CHANNEL_CAPACITY: usize = 1_000;

/// Result of dispatching one signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalOutcome {
    /// The violation recorded for this signal, if any
    pub violation: Option<Violation>,
    /// Whether the host should cancel the signal's default action
    pub prevent_default: bool,
}

/// Outstanding capture requests issued by [`SessionMonitor::start`].
#[derive(Debug, Default)]
pub struct Acquisitions {
    handles: Vec<JoinHandle<()>>,
}

impl Acquisitions {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait until every request has resolved and been handled.
    pub async fn settle(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("acquisition task failed: {e}");
            }
        }
    }
}

/// Monitors one proctored session at a time.
pub struct SessionMonitor<H: Host> {
    host: Arc<H>,
    inner: Arc<Inner>,
    ui_receiver: Receiver<UiEvent>,
}

impl<H: Host> SessionMonitor<H> {
    /// Create a monitor that reports violations to `reporter`.
    pub fn new(host: Arc<H>, reporter: impl ViolationReporter + 'static) -> Self {
        Self::with_ui_capacity(host, reporter, UI_CHANNEL_CAPACITY)
    }

    /// Create a monitor with a custom UI channel capacity.
    pub fn with_ui_capacity(
        host: Arc<H>,
        reporter: impl ViolationReporter + 'static,
        capacity: usize,
    ) -> Self {
        // Bounded so an unread UI channel cannot grow without limit
        let (sender, receiver) = bounded(capacity);
        Self {
            host,
            inner: Arc::new(Inner::new(Arc::new(reporter), sender)),
            ui_receiver: receiver,
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Start monitoring.
    ///
    /// Returns `None` without side effects if a session is already active.
    /// Otherwise subscribes the taps, requests fullscreen under lockdown,
    /// and issues one capture request per enabled device. The returned
    /// [`Acquisitions`] may be awaited or simply dropped; the requests
    /// complete on their own either way.
    pub fn start(&self, config: SessionConfig) -> Option<Acquisitions> {
        self.start_at(config, Utc::now())
    }

    /// Start a session whose clock begins at `started_at`.
    ///
    /// Used when signals carry their own timestamps, as in a replayed
    /// script. Capture failures are stamped with this time.
    pub fn start_at(
        &self,
        config: SessionConfig,
        started_at: DateTime<Utc>,
    ) -> Option<Acquisitions> {
        let epoch = {
            let mut state = self.inner.lock();
            if state.active {
                debug!("start ignored: session already active");
                return None;
            }

            let epoch = state.begin(config, started_at);
            for tap in BASE_TAPS {
                state.subscribe(self.host.subscribe(tap));
            }
            if config.lockdown_enabled {
                for tap in LOCKDOWN_TAPS {
                    state.subscribe(self.host.subscribe(tap));
                }
                if let Err(e) = self.host.request_fullscreen() {
                    warn!("fullscreen request failed: {e}");
                }
            }

            info!(
                session_id = ?state.session_id,
                "monitoring activated ({config})"
            );
            epoch
        };

        self.inner.emit(UiEvent::Status {
            status: SessionStatus::Activated,
        });

        let mut acquisitions = Acquisitions::default();
        let requested = [
            (CaptureKind::Camera, config.camera_enabled),
            (CaptureKind::ScreenShare, config.screen_share_enabled),
        ];
        for (kind, enabled) in requested {
            if !enabled {
                continue;
            }
            if let Some(handle) =
                acquire::spawn(self.host.clone(), self.inner.clone(), epoch, kind)
            {
                acquisitions.handles.push(handle);
            }
        }

        Some(acquisitions)
    }

    /// Stop monitoring: release every source, dispose every subscription,
    /// leave fullscreen. Calling it with no active session does nothing.
    pub fn stop(&self) {
        self.stop_at(Utc::now());
    }

    /// Stop monitoring, closing the log at `ended_at` on the session clock.
    pub fn stop_at(&self, ended_at: DateTime<Utc>) {
        let recorded = {
            let mut state = self.inner.lock();
            if !state.active {
                return;
            }

            state.active = false;
            state.log.seal_at(ended_at);
            state.release_all();
            if self.host.is_fullscreen() {
                self.host.exit_fullscreen();
            }
            state.log.len()
        };

        info!(violations = recorded, "monitoring deactivated");
        self.inner.emit(UiEvent::Status {
            status: SessionStatus::Deactivated,
        });
    }

    /// Feed one signal from the host through the rule engine.
    ///
    /// Signals arriving with no active session, or on a tap the session
    /// does not hold, are ignored.
    pub fn dispatch(&self, event: impl Into<SignalEvent>) -> SignalOutcome {
        let event = event.into();
        let tap = event.tap();

        let mut state = self.inner.lock();
        if !state.active {
            debug!(%tap, "signal ignored: no active session");
            return SignalOutcome::default();
        }
        if !state.is_subscribed(tap) {
            debug!(%tap, "signal ignored: tap not subscribed");
            return SignalOutcome::default();
        }

        let lost = match &event.signal {
            Signal::PageUnload => {
                drop(state);
                info!("page unloading, ending session");
                self.stop_at(event.observed_at);
                return SignalOutcome::default();
            }
            Signal::ScreenShareEnded => state
                .release(CaptureKind::ScreenShare, SourceState::Ended)
                .then_some(CaptureKind::ScreenShare),
            Signal::CameraEnded => state
                .release(CaptureKind::Camera, SourceState::Ended)
                .then_some(CaptureKind::Camera),
            _ => None,
        };

        let prevent_default = rules::suppresses_default(&event.signal);
        let violation = rules::classify(&event.signal)
            .and_then(|kind| self.inner.record(&mut state, kind, event.observed_at));
        drop(state);

        if let Some(violation) = &violation {
            self.inner.publish(violation);
        }

        if let Some(kind) = lost {
            self.inner.emit(UiEvent::Status {
                status: SessionStatus::SourceLost(kind),
            });
        }

        SignalOutcome {
            violation,
            prevent_default,
        }
    }

    /// Check if a session is currently active.
    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    /// Identifier of the current (or most recent) session.
    pub fn session_id(&self) -> Option<Uuid> {
        self.inner.lock().session_id
    }

    pub fn config(&self) -> SessionConfig {
        self.inner.lock().config
    }

    pub fn features(&self) -> FeatureStatus {
        self.inner.lock().features
    }

    /// Violations of the current (or most recent) session.
    pub fn violations(&self) -> Vec<Violation> {
        self.inner.lock().log.violations().to_vec()
    }

    pub fn violation_count(&self) -> usize {
        self.inner.lock().log.len()
    }

    pub fn stats(&self) -> ViolationStats {
        self.inner.lock().log.stats()
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        self.inner.lock().log.summary()
    }

    /// Export the current (or most recent) session.
    pub fn report(&self) -> Option<SessionReport> {
        let state = self.inner.lock();
        let session_id = state.session_id?;
        Some(SessionReport::new(session_id, state.config, &state.log))
    }

    /// Get the receiver for UI events.
    pub fn ui_receiver(&self) -> &Receiver<UiEvent> {
        &self.ui_receiver
    }

    /// Try to receive a UI event without blocking.
    pub fn try_recv_ui(&self) -> Option<UiEvent> {
        self.ui_receiver.try_recv().ok()
    }
}

impl<H: Host> Drop for SessionMonitor<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, ViolationKind};
    use crate::host::ScriptedHost;
    use crate::report::TracingReporter;
    use crate::signal::KeyPress;

    fn monitor() -> SessionMonitor<ScriptedHost> {
        SessionMonitor::new(Arc::new(ScriptedHost::new()), TracingReporter)
    }

    #[test]
    fn test_lockdown_taps_and_fullscreen() {
        let monitor = monitor();
        let acquisitions = monitor.start(SessionConfig::lockdown_only()).unwrap();

        assert!(acquisitions.is_empty());
        assert!(monitor.is_active());
        assert_eq!(
            monitor.host().counters().live_subscriptions(),
            BASE_TAPS.len() + LOCKDOWN_TAPS.len()
        );
        assert!(monitor.host().is_fullscreen());
    }

    #[test]
    fn test_keyboard_ignored_without_lockdown() {
        let monitor = monitor();
        monitor.start(SessionConfig::none()).unwrap();

        let outcome = monitor.dispatch(Signal::KeyDown(KeyPress::plain("F12")));
        assert!(outcome.violation.is_none());
        assert!(!outcome.prevent_default);
        assert_eq!(monitor.violation_count(), 0);

        // Visibility is always watched
        let outcome = monitor.dispatch(Signal::VisibilityChanged { hidden: true });
        assert_eq!(
            outcome.violation.map(|v| v.kind()),
            Some(ViolationKind::TabSwitch)
        );
    }

    #[test]
    fn test_second_start_is_noop() {
        let monitor = monitor();
        monitor.start(SessionConfig::lockdown_only()).unwrap();
        let id = monitor.session_id();
        let subscribed = monitor.host().counters().subscribed();

        assert!(monitor.start(SessionConfig::none()).is_none());
        assert_eq!(monitor.session_id(), id);
        assert_eq!(monitor.host().counters().subscribed(), subscribed);
        assert!(monitor.config().lockdown_enabled);
    }

    #[test]
    fn test_context_menu_suppressed_and_low() {
        let monitor = monitor();
        monitor.start(SessionConfig::lockdown_only()).unwrap();

        let outcome = monitor.dispatch(Signal::ContextMenu);
        assert!(outcome.prevent_default);
        let violation = outcome.violation.unwrap();
        assert_eq!(violation.kind(), ViolationKind::RightClickAttempt);
        assert_eq!(violation.severity(), Severity::Low);
    }

    #[test]
    fn test_page_unload_ends_session() {
        let monitor = monitor();
        monitor.start(SessionConfig::lockdown_only()).unwrap();

        monitor.dispatch(Signal::PageUnload);
        assert!(!monitor.is_active());
        assert_eq!(monitor.host().counters().live_subscriptions(), 0);
        assert!(!monitor.host().is_fullscreen());
    }

    #[test]
    fn test_capture_without_runtime_degrades() {
        let monitor = monitor();
        let acquisitions = monitor.start(SessionConfig::default()).unwrap();

        assert!(acquisitions.is_empty());
        assert_eq!(monitor.features().camera, SourceState::Unavailable);
        assert_eq!(monitor.features().screen_share, SourceState::Unavailable);
        let kinds: Vec<_> = monitor.violations().iter().map(|v| v.kind()).collect();
        assert_eq!(kinds, vec![ViolationKind::ScreenShareDenied]);
        assert!(monitor.is_active());
    }
}
