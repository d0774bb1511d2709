//! Signal intake for the proctor monitor.
//!
//! Signals are the raw observations a hosting environment reports (focus,
//! visibility, keys, pointer, capture tracks). Taps are the subscription
//! points they arrive on.

pub mod subscription;
pub mod types;

pub use subscription::Subscription;
pub use types::{KeyPress, Signal, SignalEvent, Tap};
