//! Demonstration of the Proctor Monitor.
//!
//! This example shows how to:
//! 1. Create a monitor over a host with a reporter callback
//! 2. Start a lockdown session and wait for camera/screen grants
//! 3. Dispatch signals and inspect the outcomes
//! 4. Stop the session and print the summary
//!
//! Run with: cargo run --example replay_demo

use std::sync::Arc;

use proctor_monitor::{
    report::UiEvent, KeyPress, ScriptedHost, SessionConfig, SessionMonitor, Severity, Signal,
    ViolationKind, MONITORING_NOTICE,
};

#[tokio::main]
async fn main() {
    println!("Proctor Monitor - Replay Demo");
    println!("=============================");
    println!();

    // Display monitoring notice
    println!("{MONITORING_NOTICE}");
    println!();

    let reporter = |kind: ViolationKind, severity: Severity| {
        println!("  -> reported {kind} ({severity})");
    };
    let monitor = SessionMonitor::new(Arc::new(ScriptedHost::new()), reporter);

    println!("Starting session...");
    if let Some(acquisitions) = monitor.start(SessionConfig::default()) {
        acquisitions.settle().await;
    }
    let features = monitor.features();
    println!(
        "  Camera: {:?}, Screen share: {:?}, Lockdown: {}",
        features.camera, features.screen_share, features.lockdown
    );
    println!();

    let signals = vec![
        Signal::FocusChanged { focused: true },
        Signal::KeyDown(KeyPress::plain("F12")),
        Signal::KeyDown(KeyPress::ctrl_shift("I")),
        Signal::ContextMenu,
        Signal::VisibilityChanged { hidden: true },
        Signal::VisibilityChanged { hidden: false },
        Signal::pointer(-5.0, 50.0, 1280.0, 720.0),
        Signal::ScreenShareEnded,
    ];

    for signal in signals {
        println!("Signal: {signal:?}");
        let outcome = monitor.dispatch(signal);
        if outcome.prevent_default {
            println!("  -> default action suppressed");
        }
        if let Some(violation) = outcome.violation {
            println!(
                "  -> recorded {} with{} evidence",
                violation.kind(),
                if violation.evidence().is_some() { "" } else { "out" }
            );
        }
    }
    println!();

    println!("Stopping session...");
    monitor.stop();

    while let Some(event) = monitor.try_recv_ui() {
        if let UiEvent::Status { status } = event {
            println!("  status: {status:?}");
        }
    }
    println!();

    println!("{}", monitor.summary());
}
