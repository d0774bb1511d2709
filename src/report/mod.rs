//! Reporting module for the proctor monitor.
//!
//! Covers where violations go once recorded: the session log, the external
//! reporter, and the UI notification channel.

pub mod log;
pub mod notify;
pub mod reporter;

// Re-export commonly used types
pub use log::{LogError, SessionReport, ViolationLog, ViolationStats};
pub use notify::{Notification, SessionStatus, UiEvent, Urgency};
pub use reporter::{ChannelReporter, TracingReporter, ViolationReporter};
