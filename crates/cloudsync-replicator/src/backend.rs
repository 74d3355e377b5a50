//! Backend-agnostic "start a replication run" interface.
//!
//! - [`CloudSyncBackend`]: REST trigger against a Cloud Sync relationship
//! - [`crate::snapmirror::SnapMirrorBackend`]: Ansible playbook against an ONTAP cluster
//!
//! Only Cloud Sync has a completion contract; see [`crate::Replicator`] for
//! monitoring.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::ReplError;
use crate::orchestrator::Replicator;

/// Which mechanism carried out a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    CloudSync,
    SnapMirror,
}

/// Successful trigger, as reported by any backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOutcome {
    pub backend: BackendKind,
    /// Relationship ID or `source -> destination` path pair.
    pub target: String,
    pub detail: String,
}

/// Starts one replication run. Not idempotent: each call is a new run.
pub trait ReplicationBackend: Send + Sync {
    fn trigger_replication(&self) -> impl Future<Output = Result<TriggerOutcome, ReplError>> + Send;
}

/// Cloud Sync trigger bound to one relationship and refresh token.
pub struct CloudSyncBackend {
    replicator: Replicator,
    refresh_token: String,
    relationship_id: String,
}

impl CloudSyncBackend {
    pub fn new(
        replicator: Replicator,
        refresh_token: impl Into<String>,
        relationship_id: impl Into<String>,
    ) -> Self {
        Self {
            replicator,
            refresh_token: refresh_token.into(),
            relationship_id: relationship_id.into(),
        }
    }

    pub fn relationship_id(&self) -> &str {
        &self.relationship_id
    }
}

impl std::fmt::Debug for CloudSyncBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudSyncBackend")
            .field("refresh_token", &"[REDACTED]")
            .field("relationship_id", &self.relationship_id)
            .finish()
    }
}

impl ReplicationBackend for CloudSyncBackend {
    async fn trigger_replication(&self) -> Result<TriggerOutcome, ReplError> {
        let receipt = self
            .replicator
            .trigger_only(&self.refresh_token, &self.relationship_id)
            .await?;
        Ok(TriggerOutcome {
            backend: BackendKind::CloudSync,
            target: receipt.relationship_id,
            detail: format!("accepted with HTTP {}", receipt.status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_debug_redacts_refresh_token() {
        let replicator = Replicator::new(ClientConfig::default()).unwrap();
        let backend = CloudSyncBackend::new(replicator, "rt-secret", "rel-42");
        let debug = format!("{backend:?}");
        assert!(!debug.contains("rt-secret"));
        assert!(debug.contains("rel-42"));
        assert_eq!(backend.relationship_id(), "rel-42");
    }

    #[test]
    fn test_backend_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&BackendKind::SnapMirror).unwrap(),
            "\"snap-mirror\""
        );
        assert_eq!(
            serde_json::to_string(&BackendKind::CloudSync).unwrap(),
            "\"cloud-sync\""
        );
    }
}
