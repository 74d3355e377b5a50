//! Relationship records returned by the list endpoint.

use serde::{Deserialize, Serialize};

/// A configured source/destination pairing.
///
/// Only `id`, `source` and `target` are interpreted; every other field the
/// service returns is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub source: serde_json::Value,
    pub target: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Relationship {
    /// Short `id / source / target` rendering used for discovery listings.
    pub fn summary(&self) -> String {
        format!(
            "id: {}\nsource: {}\ntarget: {}",
            self.id,
            serde_json::to_string_pretty(&self.source).unwrap_or_default(),
            serde_json::to_string_pretty(&self.target).unwrap_or_default(),
        )
    }

    /// Protocol of an endpoint description (`nfs`, `s3`, ...), if reported.
    pub fn source_protocol(&self) -> Option<&str> {
        self.source.get("protocol").and_then(|p| p.as_str())
    }

    pub fn target_protocol(&self) -> Option<&str> {
        self.target.get("protocol").and_then(|p| p.as_str())
    }
}
