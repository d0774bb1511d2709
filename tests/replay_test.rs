//! Integration tests for signal script replay

use proctor_monitor::replay::{self, ReplayError};
use proctor_monitor::{
    ScriptedHost, SessionConfig, SessionMonitor, TracingReporter, ViolationKind,
};
use std::path::Path;
use std::sync::Arc;

const SAMPLE: &str = include_str!("../demos/sample_session.jsonl");

#[tokio::test]
async fn test_sample_session_replay() {
    let events = replay::parse_script(SAMPLE).expect("sample script parses");
    assert_eq!(events.len(), 10);

    let monitor = SessionMonitor::new(Arc::new(ScriptedHost::new()), TracingReporter);
    let outcomes = replay::run(&monitor, SessionConfig::from_csv("all"), events).await;

    assert_eq!(outcomes.len(), 10);
    assert!(!monitor.is_active());

    let kinds: Vec<_> = monitor.violations().iter().map(|v| v.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ViolationKind::ForbiddenKey,
            ViolationKind::ForbiddenCombination,
            ViolationKind::RightClickAttempt,
            ViolationKind::TabSwitch,
            ViolationKind::MouseLeftWindow,
            ViolationKind::ScreenShareStopped,
        ]
    );

    // Camera was granted, so every violation carries a still
    assert!(monitor.violations().iter().all(|v| v.evidence().is_some()));

    let stats = monitor.stats();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.high, 2);
    assert_eq!(stats.medium, 3);
    assert_eq!(stats.low, 1);

    let suppressed = outcomes.iter().filter(|o| o.prevent_default).count();
    assert_eq!(suppressed, 3);
}

#[tokio::test]
async fn test_replay_without_lockdown_only_sees_base_taps() {
    let events = replay::parse_script(SAMPLE).unwrap();
    let monitor = SessionMonitor::new(Arc::new(ScriptedHost::denying("all")), TracingReporter);

    replay::run(&monitor, SessionConfig::from_csv("screen"), events).await;

    let kinds: Vec<_> = monitor.violations().iter().map(|v| v.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ViolationKind::ScreenShareDenied,
            ViolationKind::TabSwitch,
            ViolationKind::MouseLeftWindow,
        ]
    );
}

#[tokio::test]
async fn test_replay_keeps_script_times() {
    let events = replay::parse_script(SAMPLE).unwrap();
    let monitor = SessionMonitor::new(Arc::new(ScriptedHost::denying("all")), TracingReporter);

    replay::run(&monitor, SessionConfig::from_csv("screen"), events).await;

    let times: Vec<String> = monitor
        .violations()
        .iter()
        .map(|v| v.occurred_at().to_rfc3339())
        .collect();
    assert_eq!(
        times,
        vec![
            "2024-05-01T10:00:00+00:00",
            "2024-05-01T10:01:00+00:00",
            "2024-05-01T10:02:00+00:00",
        ]
    );

    // First to last scripted event
    assert_eq!(monitor.stats().session_duration_secs, 240);
}

#[tokio::test]
async fn test_report_written_after_replay() {
    let dir = tempfile::tempdir().unwrap();
    let events = replay::parse_script(SAMPLE).unwrap();
    let monitor = SessionMonitor::new(Arc::new(ScriptedHost::new()), TracingReporter);
    replay::run(&monitor, SessionConfig::lockdown_only(), events).await;

    let report = monitor.report().expect("session ran");
    let path = dir.path().join(report.file_name());
    report.save(&path).unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["config"]["lockdown_enabled"], true);
    assert_eq!(saved["stats"]["total"], 5);
    assert_eq!(saved["violations"][0]["kind"], "forbidden_key");
}

#[test]
fn test_missing_script_is_io_error() {
    let result = replay::read_script(Path::new("/nonexistent/script.jsonl"));
    assert!(matches!(result, Err(ReplayError::Io(_))));
}
