//! Rule engine: maps raw signals to violation kinds.
//!
//! The mapping is a fixed table. It holds no state and performs no I/O, so
//! the same signal always yields the same verdict:
//!
//! | Signal                                   | Kind                    | Severity |
//! |------------------------------------------|-------------------------|----------|
//! | screen-share track ended                 | `screen_share_stopped`  | high     |
//! | context menu invoked                     | `right_click_attempt`   | low      |
//! | F12 or F11                               | `forbidden_key`         | medium   |
//! | Ctrl+Shift+I/J/C, Ctrl+U                 | `forbidden_combination` | medium   |
//! | window loses focus                       | `window_focus_lost`     | high     |
//! | fullscreen exited                        | `fullscreen_exit`       | high     |
//! | page becomes hidden                      | `tab_switch`            | high     |
//! | pointer outside the viewport             | `mouse_left_window`     | medium   |
//!
//! Fullscreen exits only reach the engine under lockdown, because the
//! fullscreen tap is only subscribed then. `screen_share_denied` (high) has
//! no signal: it is recorded when a screen-capture request fails.

use crate::signal::{KeyPress, Signal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Violation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of violations the monitor can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    ScreenShareStopped,
    ScreenShareDenied,
    RightClickAttempt,
    ForbiddenKey,
    ForbiddenCombination,
    WindowFocusLost,
    FullscreenExit,
    TabSwitch,
    MouseLeftWindow,
}

impl ViolationKind {
    /// Every kind, in table order.
    pub const ALL: [ViolationKind; 9] = [
        ViolationKind::ScreenShareStopped,
        ViolationKind::ScreenShareDenied,
        ViolationKind::RightClickAttempt,
        ViolationKind::ForbiddenKey,
        ViolationKind::ForbiddenCombination,
        ViolationKind::WindowFocusLost,
        ViolationKind::FullscreenExit,
        ViolationKind::TabSwitch,
        ViolationKind::MouseLeftWindow,
    ];

    /// Severity is fixed per kind.
    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::RightClickAttempt => Severity::Low,
            ViolationKind::ForbiddenKey
            | ViolationKind::ForbiddenCombination
            | ViolationKind::MouseLeftWindow => Severity::Medium,
            ViolationKind::ScreenShareStopped
            | ViolationKind::ScreenShareDenied
            | ViolationKind::WindowFocusLost
            | ViolationKind::FullscreenExit
            | ViolationKind::TabSwitch => Severity::High,
        }
    }

    /// Wire name passed to reporters.
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::ScreenShareStopped => "screen_share_stopped",
            ViolationKind::ScreenShareDenied => "screen_share_denied",
            ViolationKind::RightClickAttempt => "right_click_attempt",
            ViolationKind::ForbiddenKey => "forbidden_key",
            ViolationKind::ForbiddenCombination => "forbidden_combination",
            ViolationKind::WindowFocusLost => "window_focus_lost",
            ViolationKind::FullscreenExit => "fullscreen_exit",
            ViolationKind::TabSwitch => "tab_switch",
            ViolationKind::MouseLeftWindow => "mouse_left_window",
        }
    }

    /// Human-readable message for notifications.
    pub fn description(self) -> &'static str {
        match self {
            ViolationKind::ScreenShareStopped => "Screen sharing was stopped",
            ViolationKind::ScreenShareDenied => "Screen sharing permission was denied",
            ViolationKind::RightClickAttempt => "Right click is disabled during the exam",
            ViolationKind::ForbiddenKey => "Developer tools keys are disabled",
            ViolationKind::ForbiddenCombination => "Developer tools shortcuts are disabled",
            ViolationKind::WindowFocusLost => "The exam window lost focus",
            ViolationKind::FullscreenExit => "Fullscreen mode was exited",
            ViolationKind::TabSwitch => "Switched away from the exam tab",
            ViolationKind::MouseLeftWindow => "Pointer left the exam window",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys that are forbidden on their own.
const FORBIDDEN_KEYS: [&str; 2] = ["F12", "F11"];

/// Keys forbidden together with Ctrl+Shift.
const CTRL_SHIFT_KEYS: [&str; 3] = ["I", "J", "C"];

/// Keys forbidden together with Ctrl.
const CTRL_KEYS: [&str; 1] = ["U"];

/// Classify a signal. Signals with no matching rule yield `None`.
pub fn classify(signal: &Signal) -> Option<ViolationKind> {
    match signal {
        Signal::ScreenShareEnded => Some(ViolationKind::ScreenShareStopped),
        Signal::ContextMenu => Some(ViolationKind::RightClickAttempt),
        Signal::KeyDown(press) => classify_key(press),
        Signal::FocusChanged { focused: false } => Some(ViolationKind::WindowFocusLost),
        Signal::FullscreenChanged { active: false } => Some(ViolationKind::FullscreenExit),
        Signal::VisibilityChanged { hidden: true } => Some(ViolationKind::TabSwitch),
        Signal::PointerMoved {
            x,
            y,
            width,
            height,
        } if outside_viewport(*x, *y, *width, *height) => Some(ViolationKind::MouseLeftWindow),
        _ => None,
    }
}

/// Classify a key press.
pub fn classify_key(press: &KeyPress) -> Option<ViolationKind> {
    if FORBIDDEN_KEYS.iter().any(|k| press.is(k)) {
        return Some(ViolationKind::ForbiddenKey);
    }
    if is_forbidden_combination(press) {
        return Some(ViolationKind::ForbiddenCombination);
    }
    None
}

fn is_forbidden_combination(press: &KeyPress) -> bool {
    if !press.ctrl {
        return false;
    }
    if press.shift && CTRL_SHIFT_KEYS.iter().any(|k| press.is(k)) {
        return true;
    }
    CTRL_KEYS.iter().any(|k| press.is(k))
}

/// Whether a point lies outside a viewport of the given size.
///
/// The edges themselves count as inside.
pub fn outside_viewport(x: f64, y: f64, width: f64, height: f64) -> bool {
    x < 0.0 || y < 0.0 || x > width || y > height
}

/// Whether the host should cancel the default action for this signal.
///
/// Context menus and forbidden key presses are swallowed; everything else
/// passes through untouched.
pub fn suppresses_default(signal: &Signal) -> bool {
    match signal {
        Signal::ContextMenu => true,
        Signal::KeyDown(press) => classify_key(press).is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_table() {
        use ViolationKind::*;
        let expected = [
            (ScreenShareStopped, Severity::High),
            (ScreenShareDenied, Severity::High),
            (RightClickAttempt, Severity::Low),
            (ForbiddenKey, Severity::Medium),
            (ForbiddenCombination, Severity::Medium),
            (WindowFocusLost, Severity::High),
            (FullscreenExit, Severity::High),
            (TabSwitch, Severity::High),
            (MouseLeftWindow, Severity::Medium),
        ];
        for (kind, severity) in expected {
            assert_eq!(kind.severity(), severity, "{kind}");
        }
        assert_eq!(ViolationKind::ALL.len(), expected.len());
    }

    #[test]
    fn test_forbidden_keys() {
        assert_eq!(
            classify(&Signal::KeyDown(KeyPress::plain("F12"))),
            Some(ViolationKind::ForbiddenKey)
        );
        assert_eq!(
            classify(&Signal::KeyDown(KeyPress::plain("F11"))),
            Some(ViolationKind::ForbiddenKey)
        );
        assert_eq!(classify(&Signal::KeyDown(KeyPress::plain("F5"))), None);
        assert_eq!(classify(&Signal::KeyDown(KeyPress::plain("a"))), None);
    }

    #[test]
    fn test_forbidden_combinations() {
        for key in ["I", "J", "C", "i", "j", "c"] {
            assert_eq!(
                classify(&Signal::KeyDown(KeyPress::ctrl_shift(key))),
                Some(ViolationKind::ForbiddenCombination),
                "Ctrl+Shift+{key}"
            );
        }
        assert_eq!(
            classify(&Signal::KeyDown(KeyPress::ctrl("u"))),
            Some(ViolationKind::ForbiddenCombination)
        );

        // Copy and plain Shift+I are allowed
        assert_eq!(classify(&Signal::KeyDown(KeyPress::ctrl("c"))), None);
        let shift_i = KeyPress {
            shift: true,
            ..KeyPress::plain("I")
        };
        assert_eq!(classify(&Signal::KeyDown(shift_i)), None);
    }

    #[test]
    fn test_focus_and_visibility() {
        assert_eq!(
            classify(&Signal::FocusChanged { focused: false }),
            Some(ViolationKind::WindowFocusLost)
        );
        assert_eq!(classify(&Signal::FocusChanged { focused: true }), None);
        assert_eq!(
            classify(&Signal::VisibilityChanged { hidden: true }),
            Some(ViolationKind::TabSwitch)
        );
        assert_eq!(classify(&Signal::VisibilityChanged { hidden: false }), None);
        assert_eq!(
            classify(&Signal::FullscreenChanged { active: false }),
            Some(ViolationKind::FullscreenExit)
        );
        assert_eq!(classify(&Signal::FullscreenChanged { active: true }), None);
    }

    #[test]
    fn test_pointer_bounds() {
        assert_eq!(
            classify(&Signal::pointer(-5.0, 50.0, 1280.0, 720.0)),
            Some(ViolationKind::MouseLeftWindow)
        );
        assert_eq!(
            classify(&Signal::pointer(100.0, 721.0, 1280.0, 720.0)),
            Some(ViolationKind::MouseLeftWindow)
        );
        assert_eq!(classify(&Signal::pointer(0.0, 0.0, 1280.0, 720.0)), None);
        assert_eq!(classify(&Signal::pointer(1280.0, 720.0, 1280.0, 720.0)), None);
    }

    #[test]
    fn test_lifecycle_signals_are_not_violations() {
        assert_eq!(classify(&Signal::CameraEnded), None);
        assert_eq!(classify(&Signal::PageUnload), None);
    }

    #[test]
    fn test_default_suppression() {
        assert!(suppresses_default(&Signal::ContextMenu));
        assert!(suppresses_default(&Signal::KeyDown(KeyPress::plain("F12"))));
        assert!(suppresses_default(&Signal::KeyDown(KeyPress::ctrl("U"))));
        assert!(!suppresses_default(&Signal::KeyDown(KeyPress::plain("Enter"))));
        assert!(!suppresses_default(&Signal::VisibilityChanged { hidden: true }));
    }
}
