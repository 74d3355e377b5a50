use thiserror::Error;

use crate::response::RawResponse;

/// Errors returned by replication operations.
///
/// Nothing is retried internally: every variant aborts the current
/// orchestration call. Variants produced from a Cloud Sync response carry
/// that response for remote diagnosis.
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("{message} (HTTP {})", .response.status)]
    AuthExchange {
        message: String,
        response: Box<RawResponse>,
    },

    #[error("{message} (HTTP {})", .response.status)]
    AccountResolution {
        message: String,
        response: Box<RawResponse>,
    },

    #[error("{message} (HTTP {})", .response.status)]
    TriggerRejected {
        message: String,
        response: Box<RawResponse>,
    },

    #[error("{message} (HTTP {})", .response.status)]
    StatusParse {
        message: String,
        response: Box<RawResponse>,
    },

    #[error("{message} (HTTP {})", .response.status)]
    ListRelationships {
        message: String,
        response: Box<RawResponse>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("playbook error: {0}")]
    Playbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReplError {
    /// The raw Cloud Sync response behind this error, if there was one.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            Self::AuthExchange { response, .. }
            | Self::AccountResolution { response, .. }
            | Self::TriggerRejected { response, .. }
            | Self::StatusParse { response, .. }
            | Self::ListRelationships { response, .. } => Some(&**response),
            _ => None,
        }
    }

    pub(crate) fn auth_exchange(response: RawResponse) -> Self {
        Self::AuthExchange {
            message: "error obtaining access token from Cloud Sync API".to_string(),
            response: Box::new(response),
        }
    }

    pub(crate) fn account_resolution(response: RawResponse) -> Self {
        Self::AccountResolution {
            message: "error obtaining account ID from Cloud Sync API".to_string(),
            response: Box::new(response),
        }
    }

    pub(crate) fn trigger_rejected(response: RawResponse) -> Self {
        Self::TriggerRejected {
            message: "Cloud Sync API did not accept the sync trigger".to_string(),
            response: Box::new(response),
        }
    }

    pub(crate) fn status_parse(response: RawResponse) -> Self {
        Self::StatusParse {
            message: "error reading status of latest update from Cloud Sync API".to_string(),
            response: Box::new(response),
        }
    }

    pub(crate) fn list_relationships(response: RawResponse) -> Self {
        Self::ListRelationships {
            message: "error retrieving list of relationships from Cloud Sync API".to_string(),
            response: Box::new(response),
        }
    }
}
