use super::snapshot::Snapshot;
use crate::enums::Protocol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A snapshot together with where and when it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub protocol: Protocol,
    pub timestamp: DateTime<Utc>,
    pub snapshot: Snapshot,
    /// Set when extraction failed and `snapshot` is empty.
    pub extraction_error: Option<String>,
}

impl Capture {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        protocol: Protocol,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            title: title.into(),
            protocol,
            timestamp: snapshot.captured_at,
            snapshot,
            extraction_error: None,
        }
    }

    #[must_use]
    pub fn with_extraction_error(mut self, error: impl Into<String>) -> Self {
        self.extraction_error = Some(error.into());
        self
    }

    pub fn has_positions(&self) -> bool {
        self.snapshot.has_positions()
    }
}
