//! Replaying recorded signal scripts through a monitor.
//!
//! A script is JSON lines, one [`SignalEvent`] per line:
//!
//! ```text
//! {"type":"visibility_changed","hidden":true}
//! {"type":"key_down","key":"F12"}
//! {"type":"pointer_moved","x":-5,"y":50,"width":1280,"height":720}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::config::SessionConfig;
use crate::host::Host;
use crate::monitor::{SessionMonitor, SignalOutcome};
use crate::signal::SignalEvent;
use chrono::Utc;
use std::path::Path;
use thiserror::Error;

/// Errors from reading a signal script.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse one script line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str, number: usize) -> Result<Option<SignalEvent>, ReplayError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| ReplayError::Parse {
            line: number,
            source,
        })
}

/// Parse a whole script.
pub fn parse_script(script: &str) -> Result<Vec<SignalEvent>, ReplayError> {
    let mut events = Vec::new();
    for (index, line) in script.lines().enumerate() {
        if let Some(event) = parse_line(line, index + 1)? {
            events.push(event);
        }
    }
    Ok(events)
}

/// Read and parse a script file.
pub fn read_script(path: &Path) -> Result<Vec<SignalEvent>, ReplayError> {
    let content = std::fs::read_to_string(path)?;
    parse_script(&content)
}

/// Run one complete session over `events`.
///
/// Starts the monitor, waits for capture requests to resolve, dispatches
/// every event in order, then stops. The session runs on the script's
/// clock: it starts at the first event and ends at the last. Returns one
/// outcome per event.
pub async fn run<H: Host>(
    monitor: &SessionMonitor<H>,
    config: SessionConfig,
    events: Vec<SignalEvent>,
) -> Vec<SignalOutcome> {
    let started_at = events.first().map_or_else(Utc::now, |e| e.observed_at);
    let ended_at = events.last().map_or(started_at, |e| e.observed_at);

    if let Some(acquisitions) = monitor.start_at(config, started_at) {
        acquisitions.settle().await;
    }

    let outcomes = events
        .into_iter()
        .map(|event| monitor.dispatch(event))
        .collect();

    monitor.stop_at(ended_at);
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{KeyPress, Signal};

    #[test]
    fn test_parse_script_skips_comments() {
        let script = "\
# warm-up
{\"type\":\"focus_changed\",\"focused\":false}

{\"type\":\"key_down\",\"key\":\"u\",\"ctrl\":true}
";
        let events = parse_script(script).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].signal, Signal::FocusChanged { focused: false });
        assert_eq!(events[1].signal, Signal::KeyDown(KeyPress::ctrl("u")));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let script = "{\"type\":\"context_menu\"}\n{\"type\":\"teleport\"}\n";
        match parse_script(script) {
            Err(ReplayError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
