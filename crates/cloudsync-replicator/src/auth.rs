//! Refresh-token exchange.
//!
//! Cloud Sync calls need a short-lived access token and the caller's account
//! ID. Both are derived from the long-lived refresh token on every run; they
//! are never cached or persisted.

use reqwest::Method;
use serde::Serialize;

use crate::client::CloudSyncClient;
use crate::constants::GRANT_TYPE;
use crate::error::ReplError;

/// Access token and account ID obtained from one successful exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    account_id: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            account_id: account_id.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
    client_id: &'a str,
}

impl CloudSyncClient {
    /// Exchange a refresh token for an access token and resolve the account ID.
    pub async fn exchange(&self, refresh_token: &str) -> Result<Credential, ReplError> {
        let access_token = self.request_access_token(refresh_token).await?;
        let account_id = self.resolve_account_id(&access_token).await?;
        tracing::debug!(account_id = %account_id, "Cloud Sync credentials obtained");
        Ok(Credential {
            access_token,
            account_id,
        })
    }

    async fn request_access_token(&self, refresh_token: &str) -> Result<String, ReplError> {
        let grant = RefreshGrant {
            grant_type: GRANT_TYPE,
            refresh_token,
            client_id: &self.config().client_id,
        };
        let request = self
            .http()
            .post(&self.config().token_url)
            .header("Content-Type", "application/json")
            .json(&grant);

        let raw = self.dispatch(Method::POST, request).await?;
        let token = raw
            .json()
            .and_then(|body| body.get("access_token")?.as_str().map(String::from));

        match token {
            Some(token) => Ok(token),
            None => Err(ReplError::auth_exchange(raw)),
        }
    }

    async fn resolve_account_id(&self, access_token: &str) -> Result<String, ReplError> {
        let request = self
            .http()
            .get(&self.config().accounts_url)
            .header("Content-Type", "application/json")
            .bearer_auth(access_token);

        let raw = self.dispatch(Method::GET, request).await?;
        let account_id = raw.json().and_then(|body| {
            body.as_array()?
                .first()?
                .get("accountId")?
                .as_str()
                .map(String::from)
        });

        match account_id {
            Some(id) => Ok(id),
            None => Err(ReplError::account_resolution(raw)),
        }
    }
}
