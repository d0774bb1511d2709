//! Append-only violation log.
//!
//! Holds every violation recorded during one session, in the order the
//! originating signals were observed. Entries are never mutated or
//! removed; once the session ends the log is sealed and refuses appends.

use crate::config::SessionConfig;
use crate::core::{Severity, Violation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Errors from appending to the log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogError {
    #[error("violation log is sealed")]
    Sealed,
}

/// Violations of one session.
#[derive(Debug, Clone)]
pub struct ViolationLog {
    violations: Vec<Violation>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl ViolationLog {
    /// Create an empty, open log starting now.
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Create an empty, open log for a session that started at `at`.
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self {
            violations: Vec::new(),
            started_at: at,
            ended_at: None,
        }
    }

    /// Clamp `at` so timestamps never go backwards within the log.
    pub fn stamp(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.violations.last() {
            Some(last) if last.occurred_at() > at => last.occurred_at(),
            _ => at,
        }
    }

    /// Append a violation.
    pub fn append(&mut self, violation: Violation) -> Result<(), LogError> {
        if self.is_sealed() {
            return Err(LogError::Sealed);
        }
        debug_assert!(self
            .violations
            .last()
            .map_or(true, |last| last.occurred_at() <= violation.occurred_at()));
        self.violations.push(violation);
        Ok(())
    }

    /// Close the log now. Later seals keep the first end time.
    pub fn seal(&mut self) {
        self.seal_at(Utc::now());
    }

    /// Close the log at `at`, never before its start or its last entry.
    pub fn seal_at(&mut self, at: DateTime<Utc>) {
        if self.ended_at.is_none() {
            let floor = self.stamp(self.started_at);
            self.ended_at = Some(at.max(floor));
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ViolationStats {
        let mut stats = ViolationStats {
            total: self.violations.len() as u64,
            low: 0,
            medium: 0,
            high: 0,
            with_evidence: 0,
            by_kind: BTreeMap::new(),
            session_start: self.started_at,
            session_duration_secs: (self.ended_at.unwrap_or_else(Utc::now) - self.started_at)
                .num_seconds()
                .max(0) as u64,
        };

        for violation in &self.violations {
            match violation.severity() {
                Severity::Low => stats.low += 1,
                Severity::Medium => stats.medium += 1,
                Severity::High => stats.high += 1,
            }
            if violation.evidence().is_some() {
                stats.with_evidence += 1;
            }
            *stats
                .by_kind
                .entry(violation.kind().as_str().to_string())
                .or_insert(0) += 1;
        }

        stats
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let mut out = format!(
            "Session Statistics:\n\
             - Violations recorded: {}\n\
             - High severity: {}\n\
             - Medium severity: {}\n\
             - Low severity: {}\n\
             - With camera evidence: {}\n\
             - Session duration: {} seconds",
            stats.total,
            stats.high,
            stats.medium,
            stats.low,
            stats.with_evidence,
            stats.session_duration_secs
        );
        if !stats.by_kind.is_empty() {
            out.push_str("\n\nBy kind:");
            for (kind, count) in &stats.by_kind {
                out.push_str(&format!("\n  {kind:<24} {count}"));
            }
        }
        out
    }
}

impl Default for ViolationLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of violation statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationStats {
    pub total: u64,
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub with_evidence: u64,
    pub by_kind: BTreeMap<String, u64>,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Everything known about one session, for export.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub config: SessionConfig,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub stats: ViolationStats,
    pub violations: Vec<Violation>,
}

impl SessionReport {
    pub fn new(session_id: Uuid, config: SessionConfig, log: &ViolationLog) -> Self {
        Self {
            session_id,
            config,
            started_at: log.started_at(),
            ended_at: log.ended_at(),
            stats: log.stats(),
            violations: log.violations().to_vec(),
        }
    }

    /// Default file name for this report.
    pub fn file_name(&self) -> String {
        format!("session-{}.json", self.session_id)
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
