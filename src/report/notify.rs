//! UI-facing events: session status changes and user notifications.
//!
//! These feed the presentation layer only and are separate from the
//! violation stream.

use crate::core::{Severity, ViolationKind};
use crate::host::CaptureKind;
use serde::{Deserialize, Serialize};

/// Notification styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Info,
    Error,
}

impl From<Severity> for Urgency {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Urgency::Info,
            Severity::Medium | Severity::High => Urgency::Error,
        }
    }
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub urgency: Urgency,
    pub message: String,
}

impl Notification {
    pub fn for_violation(kind: ViolationKind) -> Self {
        Self {
            urgency: kind.severity().into(),
            message: kind.description().to_string(),
        }
    }
}

/// Session status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Activated,
    Deactivated,
    /// A capture source became active
    SourceActive(CaptureKind),
    /// A capture source was refused, ended, or could not be obtained
    SourceLost(CaptureKind),
}

/// Event for the UI channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    Status { status: SessionStatus },
    Notify(Notification),
}
