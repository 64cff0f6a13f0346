//! Reports derived from snapshots. Plain data for the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject used for findings about the portfolio summary.
pub const SUMMARY_SUBJECT: &str = "Portfolio";

/// Rule that produced a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    MissingTotalValue,
    NegativeTotalValue,
    MissingPair,
    MissingBalance,
    InvertedRange,
    InRangeMismatch,
    ExtremeApy,
    NegativeApy,
    NegativeBalance,
}

/// One validation finding keyed by a human-readable subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub subject: String,
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    pub fn new(subject: impl Into<String>, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Hard errors and soft anomalies found in one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub passed: bool,
}

impl ValidationReport {
    pub fn from_findings(issues: Vec<Finding>, warnings: Vec<Finding>) -> Self {
        let passed = issues.is_empty();
        Self {
            issues,
            warnings,
            passed,
        }
    }

    pub fn has_issue(&self, subject: &str, kind: FindingKind) -> bool {
        self.issues
            .iter()
            .any(|f| f.subject == subject && f.kind == kind)
    }

    pub fn has_warning(&self, subject: &str, kind: FindingKind) -> bool {
        self.warnings
            .iter()
            .any(|f| f.subject == subject && f.kind == kind)
    }
}

/// Differences between a snapshot and the previous one for the same protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub previous_timestamp: DateTime<Utc>,
    pub positions_added: Vec<String>,
    pub positions_removed: Vec<String>,
    pub significant_changes: Vec<String>,
    pub critical_changes: Vec<String>,
}

impl ComparisonReport {
    pub fn new(previous_timestamp: DateTime<Utc>) -> Self {
        Self {
            previous_timestamp,
            positions_added: Vec::new(),
            positions_removed: Vec::new(),
            significant_changes: Vec::new(),
            critical_changes: Vec::new(),
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.positions_added.is_empty()
            && self.positions_removed.is_empty()
            && self.significant_changes.is_empty()
            && self.critical_changes.is_empty()
    }
}
