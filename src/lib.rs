//! Proctor Monitor - session integrity monitoring for proctored exams.
//!
//! This library watches the environment an exam runs in (tab visibility,
//! window focus, fullscreen, key shortcuts, pointer bounds, capture tracks)
//! and reduces those signals to a single stream of classified violations.
//!
//! # Guarantees
//!
//! - **Fixed rules**: every violation kind has exactly one severity
//! - **Append only**: a session's log only grows, and is frozen at stop
//! - **Never fatal**: refused devices and failed snapshots degrade the
//!   session instead of ending it
//! - **Clean teardown**: every source and tap is released exactly once
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Session Monitor                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │    Host     │──▶│    Rules    │──▶│  Violation  │       │
//! │  │ (taps, A/V) │   │ (classify)  │   │     Log     │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         ▲                                    │              │
//! │         │                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │  Lifecycle  │                     │  Reporter   │       │
//! │  │ start/stop  │                     │  + UI feed  │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use proctor_monitor::{ScriptedHost, SessionConfig, SessionMonitor, Signal, TracingReporter};
//!
//! # async fn run() {
//! let monitor = SessionMonitor::new(Arc::new(ScriptedHost::new()), TracingReporter);
//!
//! if let Some(acquisitions) = monitor.start(SessionConfig::default()) {
//!     acquisitions.settle().await;
//! }
//!
//! let outcome = monitor.dispatch(Signal::VisibilityChanged { hidden: true });
//! assert!(outcome.violation.is_some());
//!
//! monitor.stop();
//! # }
//! ```

pub mod config;
pub mod core;
pub mod host;
pub mod monitor;
pub mod replay;
pub mod report;
pub mod signal;

// Re-export key types at crate root for convenience
pub use config::{Config, SessionConfig};
pub use crate::core::{classify, Evidence, Severity, Violation, ViolationKind};
pub use host::{CaptureKind, CaptureStream, Host, HostError, ScriptedHost};
pub use monitor::{Acquisitions, FeatureStatus, SessionMonitor, SignalOutcome, SourceState};
pub use report::{
    ChannelReporter, SessionReport, TracingReporter, UiEvent, ViolationLog, ViolationReporter,
    ViolationStats,
};
pub use signal::{KeyPress, Signal, SignalEvent, Subscription, Tap};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Monitoring notice that can be displayed to candidates.
pub const MONITORING_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║             PROCTOR MONITOR - EXAM MONITORING NOTICE             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This exam session is monitored for integrity.                   ║
║                                                                  ║
║  ✓ WHAT IS OBSERVED:                                             ║
║    • Switching tabs or leaving the exam window                   ║
║    • Leaving fullscreen mode (when lockdown is on)               ║
║    • Developer tools shortcuts and right clicks                  ║
║    • The pointer leaving the exam window                         ║
║    • Stopping camera or screen sharing                           ║
║                                                                  ║
║  ✗ WHAT IS NEVER RECORDED:                                       ║
║    • What you type                                               ║
║    • Other applications or tabs                                  ║
║    • Continuous video (only a still at each violation)           ║
║                                                                  ║
║  Violations are reported to your exam provider as they occur.    ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
