use super::{capture::Capture, position::Position};
use crate::enums::Protocol;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored position tagged with the capture it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    pub capture_id: Uuid,
    pub protocol: Protocol,
    pub position: Position,
}

impl PositionRecord {
    /// Flattens a capture into one record per position.
    pub fn from_capture(capture: &Capture) -> Vec<Self> {
        capture
            .snapshot
            .positions
            .iter()
            .map(|position| Self {
                capture_id: capture.id,
                protocol: capture.protocol,
                position: position.clone(),
            })
            .collect()
    }
}
