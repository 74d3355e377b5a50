//! Cloud Sync REST API client.
//!
//! Wraps the relationship endpoints of the Cloud Sync API
//! (`https://cloudsync.netapp.com/api`): sync triggers, per-relationship
//! status, and the relationship list. Token exchange lives in
//! [`crate::auth`].
//!
//! Every call is made exactly once. Failures, including transport errors,
//! surface immediately to the caller.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::Credential;
use crate::config::ClientConfig;
use crate::constants::ACCOUNT_ID_HEADER;
use crate::error::ReplError;
use crate::relationship::Relationship;
use crate::response::RawResponse;
use crate::status::JobStatus;

/// Proof that the service accepted a sync trigger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerReceipt {
    pub relationship_id: String,
    pub account_id: String,
    /// Always 202 for an accepted Cloud Sync trigger.
    pub status: u16,
}

/// Client for the Cloud Sync API.
#[derive(Clone)]
pub struct CloudSyncClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl CloudSyncClient {
    pub fn new(config: ClientConfig) -> Result<Self, ReplError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { http, config })
    }

    /// Create a client with a custom reqwest::Client.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send a request and read the whole response, logging it if enabled.
    pub(crate) async fn dispatch(
        &self,
        method: Method,
        request: reqwest::RequestBuilder,
    ) -> Result<RawResponse, ReplError> {
        let response = request.send().await?;
        let raw = RawResponse::read(&method, response).await?;
        raw.log(self.config.log_responses);
        Ok(raw)
    }

    /// API URL with `segments` appended below the base path. Each segment is
    /// percent-encoded, so an ID cannot reach a different endpoint.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ReplError> {
        let base = &self.config.api_base_url;
        let mut url =
            Url::parse(base).map_err(|e| ReplError::InvalidBaseUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ReplError::InvalidBaseUrl(base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a relationship-scoped request carrying bearer auth and the
    /// account-id header.
    fn relationship_request(
        &self,
        method: Method,
        segments: &[&str],
        credential: &Credential,
    ) -> Result<reqwest::RequestBuilder, ReplError> {
        let url = self.endpoint(segments)?;
        Ok(self
            .http
            .request(method, url)
            .header("Accept", "application/json")
            .header(ACCOUNT_ID_HEADER, credential.account_id())
            .bearer_auth(credential.access_token()))
    }

    /// Start a new sync run for a relationship.
    ///
    /// Only `202 Accepted` counts as success. Calling this twice starts two
    /// runs.
    pub async fn trigger_sync(
        &self,
        credential: &Credential,
        relationship_id: &str,
    ) -> Result<TriggerReceipt, ReplError> {
        let request = self
            .relationship_request(
                Method::PUT,
                &["relationships", relationship_id, "sync"],
                credential,
            )?
            .header("Content-Type", "application/json");

        tracing::info!(relationship_id, "Triggering Cloud Sync update");
        let raw = self.dispatch(Method::PUT, request).await?;

        if raw.status != StatusCode::ACCEPTED.as_u16() {
            tracing::warn!(relationship_id, status = raw.status, "Sync trigger rejected");
            return Err(ReplError::trigger_rejected(raw));
        }

        tracing::info!(relationship_id, "Sync trigger accepted");
        Ok(TriggerReceipt {
            relationship_id: relationship_id.to_string(),
            account_id: credential.account_id().to_string(),
            status: raw.status,
        })
    }

    /// Fetch the latest activity for a relationship.
    pub async fn relationship_status(
        &self,
        credential: &Credential,
        relationship_id: &str,
    ) -> Result<JobStatus, ReplError> {
        let request =
            self.relationship_request(Method::GET, &["relationships-v2", relationship_id], credential)?;
        let raw = self.dispatch(Method::GET, request).await?;

        match raw.json().as_ref().and_then(JobStatus::from_body) {
            Some(status) => Ok(status),
            None => Err(ReplError::status_parse(raw)),
        }
    }

    /// List every relationship visible to the account, in service order.
    pub async fn list_relationships(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Relationship>, ReplError> {
        let request = self.relationship_request(Method::GET, &["relationships-v2"], credential)?;
        let raw = self.dispatch(Method::GET, request).await?;

        if raw.status != StatusCode::OK.as_u16() {
            return Err(ReplError::list_relationships(raw));
        }

        match serde_json::from_str::<Vec<Relationship>>(&raw.body) {
            Ok(relationships) => {
                tracing::debug!(count = relationships.len(), "Listed relationships");
                Ok(relationships)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Relationship list did not parse");
                Err(ReplError::list_relationships(raw))
            }
        }
    }
}

impl std::fmt::Debug for CloudSyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudSyncClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CloudSyncClient::new(ClientConfig::default()).unwrap();
        assert_eq!(
            client.config().api_base_url,
            "https://cloudsync.netapp.com/api"
        );
    }

    #[test]
    fn test_relationship_request_headers() {
        let client = CloudSyncClient::new(ClientConfig::with_base_url("http://localhost:1")).unwrap();
        let credential = Credential::new("at-9", "acct-7");
        let request = client
            .relationship_request(Method::GET, &["relationships-v2", "rel-42"], &credential)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://localhost:1/api/relationships-v2/rel-42"
        );
        assert_eq!(request.headers()["x-account-id"], "acct-7");
        assert_eq!(request.headers()["authorization"], "Bearer at-9");
        assert_eq!(request.headers()["accept"], "application/json");
    }

    #[test]
    fn test_relationship_id_is_one_path_segment() {
        let client = CloudSyncClient::new(ClientConfig::with_base_url("http://localhost:1")).unwrap();

        let url = client
            .endpoint(&["relationships", "../accounts?x=1#frag", "sync"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:1/api/relationships/..%2Faccounts%3Fx=1%23frag/sync"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_trailing_slash_on_base_url() {
        let config = ClientConfig {
            api_base_url: "http://localhost:1/api/".to_string(),
            ..ClientConfig::default()
        };
        let client = CloudSyncClient::new(config).unwrap();
        assert_eq!(
            client.endpoint(&["relationships-v2"]).unwrap().as_str(),
            "http://localhost:1/api/relationships-v2"
        );
    }

    #[test]
    fn test_unparsable_base_url_is_an_error() {
        let config = ClientConfig {
            api_base_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        let client = CloudSyncClient::new(config).unwrap();
        let err = client.endpoint(&["relationships-v2"]).unwrap_err();
        assert!(matches!(err, ReplError::InvalidBaseUrl(_)));
    }
}
