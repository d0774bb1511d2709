//! Inbound signal types for the proctor monitor.
//!
//! Every observation the hosting environment delivers is a [`SignalEvent`]:
//! the raw payload plus the time it was observed. Nothing in this module
//! interprets signals; classification lives in [`crate::core::rules`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subscription point on the hosting environment.
///
/// The monitor only reacts to signals arriving on taps it currently holds a
/// [`Subscription`](super::Subscription) for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tap {
    /// Page visibility (tab switches)
    Visibility,
    /// Window focus and blur
    Focus,
    /// Fullscreen enter/exit
    Fullscreen,
    /// Context menu invocation
    ContextMenu,
    /// Key presses
    Keyboard,
    /// Pointer movement
    Pointer,
    /// Screen-capture track lifecycle
    ScreenShare,
    /// Camera track lifecycle
    Camera,
    /// Page unload / view teardown
    PageLifecycle,
}

impl Tap {
    pub fn as_str(self) -> &'static str {
        match self {
            Tap::Visibility => "visibility",
            Tap::Focus => "focus",
            Tap::Fullscreen => "fullscreen",
            Tap::ContextMenu => "context_menu",
            Tap::Keyboard => "keyboard",
            Tap::Pointer => "pointer",
            Tap::ScreenShare => "screen_share",
            Tap::Camera => "camera",
            Tap::PageLifecycle => "page_lifecycle",
        }
    }
}

impl fmt::Display for Tap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key press with its modifier state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    /// Key name as reported by the host (`"F12"`, `"i"`, `"U"`, ...)
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyPress {
    /// A key pressed without modifiers.
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    /// A key pressed with Ctrl held.
    pub fn ctrl(key: impl Into<String>) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    /// A key pressed with Ctrl and Shift held.
    pub fn ctrl_shift(key: impl Into<String>) -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::plain(key)
        }
    }

    /// Case-insensitive comparison of the key name.
    pub fn is(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

/// Raw signal payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// Page visibility changed
    VisibilityChanged { hidden: bool },
    /// Window gained or lost input focus
    FocusChanged { focused: bool },
    /// Fullscreen presentation entered or exited
    FullscreenChanged { active: bool },
    /// Context menu requested (right click)
    ContextMenu,
    /// Key pressed
    KeyDown(KeyPress),
    /// Pointer moved; coordinates are relative to the viewport origin
    PointerMoved {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// The user ended the screen-capture track
    ScreenShareEnded,
    /// The camera track ended
    CameraEnded,
    /// The page is unloading or the owning view is being torn down
    PageUnload,
}

impl Signal {
    /// The tap this signal is delivered on.
    pub fn tap(&self) -> Tap {
        match self {
            Signal::VisibilityChanged { .. } => Tap::Visibility,
            Signal::FocusChanged { .. } => Tap::Focus,
            Signal::FullscreenChanged { .. } => Tap::Fullscreen,
            Signal::ContextMenu => Tap::ContextMenu,
            Signal::KeyDown(_) => Tap::Keyboard,
            Signal::PointerMoved { .. } => Tap::Pointer,
            Signal::ScreenShareEnded => Tap::ScreenShare,
            Signal::CameraEnded => Tap::Camera,
            Signal::PageUnload => Tap::PageLifecycle,
        }
    }

    /// Pointer movement within a viewport of the given size.
    pub fn pointer(x: f64, y: f64, width: f64, height: f64) -> Self {
        Signal::PointerMoved {
            x,
            y,
            width,
            height,
        }
    }
}

/// A signal together with its observation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    /// When the host observed the signal
    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub signal: Signal,
}

impl SignalEvent {
    /// Wrap a signal observed now.
    pub fn new(signal: Signal) -> Self {
        Self {
            observed_at: Utc::now(),
            signal,
        }
    }

    pub fn tap(&self) -> Tap {
        self.signal.tap()
    }
}

impl From<Signal> for SignalEvent {
    fn from(signal: Signal) -> Self {
        Self::new(signal)
    }
}
