//! Recorded violations.

use super::rules::{Severity, ViolationKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A still image captured from the camera when a violation was detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub captured_at: DateTime<Utc>,
    /// MIME type of `data`, e.g. `image/jpeg`
    pub content_type: String,
    pub data: Vec<u8>,
}

/// One detected irregularity. Immutable once built.
///
/// Severity is derived from the kind at construction and cannot be set
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    id: Uuid,
    kind: ViolationKind,
    severity: Severity,
    occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evidence: Option<Evidence>,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        occurred_at: DateTime<Utc>,
        evidence: Option<Evidence>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            severity: kind.severity(),
            occurred_at,
            evidence,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn evidence(&self) -> Option<&Evidence> {
        self.evidence.as_ref()
    }
}
