//! Replication orchestration.
//!
//! Composes token exchange, sync trigger and completion polling into the four
//! public entry points. Each call performs its own exchange; nothing is
//! shared between calls.

use crate::auth::Credential;
use crate::client::{CloudSyncClient, TriggerReceipt};
use crate::config::{ClientConfig, MonitorOptions};
use crate::error::ReplError;
use crate::monitor::{self, AuthenticatedClient};
use crate::relationship::Relationship;
use crate::status::PollOutcome;

/// Entry points for authenticate → trigger → monitor flows.
#[derive(Clone, Debug)]
pub struct Replicator {
    client: CloudSyncClient,
}

impl Replicator {
    pub fn new(config: ClientConfig) -> Result<Self, ReplError> {
        Ok(Self {
            client: CloudSyncClient::new(config)?,
        })
    }

    pub fn with_client(client: CloudSyncClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CloudSyncClient {
        &self.client
    }

    /// Exchange credentials and start a sync run. Does not wait for it.
    pub async fn trigger_only(
        &self,
        refresh_token: &str,
        relationship_id: &str,
    ) -> Result<TriggerReceipt, ReplError> {
        let credential = self.client.exchange(refresh_token).await?;
        self.client.trigger_sync(&credential, relationship_id).await
    }

    /// Exchange credentials and monitor a run started elsewhere.
    pub async fn monitor_only(
        &self,
        refresh_token: &str,
        relationship_id: &str,
        options: &MonitorOptions,
    ) -> Result<PollOutcome, ReplError> {
        let credential = self.client.exchange(refresh_token).await?;
        self.monitor_with(&credential, relationship_id, options).await
    }

    /// Exchange credentials once, start a sync run, then monitor it with the
    /// same credential.
    pub async fn trigger_and_monitor(
        &self,
        refresh_token: &str,
        relationship_id: &str,
        options: &MonitorOptions,
    ) -> Result<PollOutcome, ReplError> {
        let credential = self.client.exchange(refresh_token).await?;
        self.client.trigger_sync(&credential, relationship_id).await?;
        tracing::info!(relationship_id, "Checking progress");
        self.monitor_with(&credential, relationship_id, options).await
    }

    /// Exchange credentials and list every relationship of the account.
    pub async fn list_relationships(
        &self,
        refresh_token: &str,
    ) -> Result<Vec<Relationship>, ReplError> {
        let credential = self.client.exchange(refresh_token).await?;
        self.client.list_relationships(&credential).await
    }

    async fn monitor_with(
        &self,
        credential: &Credential,
        relationship_id: &str,
        options: &MonitorOptions,
    ) -> Result<PollOutcome, ReplError> {
        let source = AuthenticatedClient {
            client: &self.client,
            credential,
        };
        monitor::monitor(&source, relationship_id, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replicator_uses_given_config() {
        let replicator =
            Replicator::new(ClientConfig::with_base_url("http://127.0.0.1:1")).unwrap();
        assert_eq!(
            replicator.client().config().token_url,
            "http://127.0.0.1:1/oauth/token"
        );
    }

    #[tokio::test]
    async fn test_unreachable_token_endpoint_fails_fast() {
        let replicator =
            Replicator::new(ClientConfig::with_base_url("http://127.0.0.1:1")).unwrap();
        let err = replicator.trigger_only("rt-1", "rel-1").await.unwrap_err();
        assert!(matches!(err, ReplError::Http(_)));
        assert!(err.response().is_none());
    }
}
