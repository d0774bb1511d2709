//! Core detection logic for the proctor monitor.
//!
//! This module contains:
//! - The rule engine mapping signals to violation kinds and severities
//! - The immutable violation record

pub mod rules;
pub mod violation;

// Re-export commonly used types
pub use rules::{classify, Severity, ViolationKind};
pub use violation::{Evidence, Violation};
