//! Capture acquisition.
//!
//! Each requested device gets its own task. The task awaits the host's
//! grant, then takes the session lock and stores the stream only if the
//! session that asked for it is still running. Grants that land after
//! `stop()` (or after a restart) are released on the spot.

use super::state::Inner;
use crate::core::ViolationKind;
use crate::host::{CaptureKind, CaptureStream, Host};
use crate::report::{SessionStatus, UiEvent};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawn the acquisition task for `kind` on the current runtime.
///
/// Outside a Tokio runtime nothing can be awaited, so the request fails
/// immediately and the source is marked unavailable.
pub(crate) fn spawn<H: Host>(
    host: Arc<H>,
    inner: Arc<Inner>,
    epoch: u64,
    kind: CaptureKind,
) -> Option<JoinHandle<()>> {
    match Handle::try_current() {
        Ok(handle) => Some(handle.spawn(acquire(host, inner, epoch, kind))),
        Err(e) => {
            failed(&inner, epoch, kind, &format!("no async runtime: {e}"));
            None
        }
    }
}

async fn acquire<H: Host>(host: Arc<H>, inner: Arc<Inner>, epoch: u64, kind: CaptureKind) {
    debug!(%kind, epoch, "requesting capture");
    match host.acquire(kind).await {
        Ok(stream) => granted(host.as_ref(), &inner, epoch, kind, stream),
        Err(e) => failed(&inner, epoch, kind, &e.to_string()),
    }
}

fn granted<H: Host>(
    host: &H,
    inner: &Inner,
    epoch: u64,
    kind: CaptureKind,
    mut stream: Box<dyn CaptureStream>,
) {
    let mut state = inner.lock();
    if !state.is_current(epoch) {
        drop(state);
        stream.release();
        warn!(%kind, epoch, "capture granted after session ended, released");
        return;
    }

    let subscription = host.subscribe(kind.tap());
    state.install(kind, stream, subscription);
    drop(state);

    info!(%kind, "capture source active");
    inner.emit(UiEvent::Status {
        status: SessionStatus::SourceActive(kind),
    });
}

fn failed(inner: &Inner, epoch: u64, kind: CaptureKind, reason: &str) {
    let mut state = inner.lock();
    if !state.is_current(epoch) {
        debug!(%kind, epoch, "capture failure for ended session ignored");
        return;
    }

    warn!(%kind, "capture unavailable: {reason}");
    state.mark_unavailable(kind);
    // Attributed to the request, on the session's own clock
    let violation = match kind {
        CaptureKind::ScreenShare => {
            let requested_at = state.log.started_at();
            inner.record(&mut state, ViolationKind::ScreenShareDenied, requested_at)
        }
        CaptureKind::Camera => None,
    };
    drop(state);

    if let Some(violation) = &violation {
        inner.publish(violation);
    }
    inner.emit(UiEvent::Status {
        status: SessionStatus::SourceLost(kind),
    });
}
