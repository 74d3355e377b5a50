//! Job status as reported by the relationship status endpoint.

use serde::{Deserialize, Serialize};

use crate::constants::{DONE_STATUS, SYNC_ACTIVITY};

/// The latest activity recorded for a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(rename = "status")]
    pub activity_status: String,
}

impl JobStatus {
    pub fn new(activity_type: impl Into<String>, activity_status: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
            activity_status: activity_status.into(),
        }
    }

    /// Pull `activity.type` and `activity.status` out of a status body.
    /// Returns `None` if either is absent or not a string.
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        let activity = body.get("activity")?;
        Some(Self::new(
            activity.get("type")?.as_str()?,
            activity.get("status")?.as_str()?,
        ))
    }

    /// Only `("Sync", "DONE")` is terminal. A finished activity of any other
    /// type still reads as running.
    pub fn is_complete(&self) -> bool {
        self.activity_type == SYNC_ACTIVITY && self.activity_status == DONE_STATUS
    }
}

/// Result of one monitoring call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollOutcome {
    /// The relationship reported `("Sync", "DONE")`.
    Completed,
    /// The poller hit its attempt limit or deadline with the job still running.
    StillRunning,
    /// The caller chose not to wait; the job may still be in progress.
    AbortedByCaller,
}
