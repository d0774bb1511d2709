//! External violation reporters.
//!
//! A reporter is the one outward sink the monitor calls, synchronously,
//! for every recorded violation. Persisting or transmitting the violation
//! is the reporter's business.

use crate::core::{Severity, ViolationKind};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Receives `(kind, severity)` for each recorded violation.
///
/// Called after the violation is in the log and the session lock is
/// released, so an implementation may end the session from here.
pub trait ViolationReporter: Send + Sync {
    fn report(&self, kind: ViolationKind, severity: Severity);
}

impl<F> ViolationReporter for F
where
    F: Fn(ViolationKind, Severity) + Send + Sync,
{
    fn report(&self, kind: ViolationKind, severity: Severity) {
        self(kind, severity)
    }
}

/// Logs every violation through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ViolationReporter for TracingReporter {
    fn report(&self, kind: ViolationKind, severity: Severity) {
        match severity {
            Severity::Low => tracing::info!(%kind, %severity, "violation"),
            Severity::Medium | Severity::High => tracing::warn!(%kind, %severity, "violation"),
        }
    }
}

/// Forwards violations over a bounded channel.
///
/// Never blocks: when the channel is full the violation is dropped from the
/// channel (it is still in the session log).
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: Sender<(ViolationKind, Severity)>,
}

impl ChannelReporter {
    /// Create a reporter and the receiving end of its channel.
    pub fn new(capacity: usize) -> (Self, Receiver<(ViolationKind, Severity)>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl ViolationReporter for ChannelReporter {
    fn report(&self, kind: ViolationKind, severity: Severity) {
        match self.sender.try_send((kind, severity)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(%kind, "reporter channel full, dropping violation");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!(%kind, "reporter channel disconnected");
            }
        }
    }
}
