//! Cloud Sync replication client.
//!
//! Triggers a NetApp Cloud Sync relationship update and follows it to
//! completion:
//!
//! 1. exchange a refresh token for an access token and account ID
//! 2. `PUT` a sync trigger for the relationship (must answer `202 Accepted`)
//! 3. poll the relationship status until the latest activity is `("Sync", "DONE")`
//!
//! A second backend runs an Ansible playbook to update an ONTAP SnapMirror
//! relationship; both implement [`ReplicationBackend`].
//!
//! # Quick Example
//!
//! ```no_run
//! use replicator::{ClientConfig, MonitorOptions, PollOutcome, Replicator};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), replicator::ReplError> {
//! let replicator = Replicator::new(ClientConfig::default())?;
//! let outcome = replicator
//!     .trigger_and_monitor("<refresh token>", "5ed00996ca85650009a83db2", &MonitorOptions::default())
//!     .await?;
//! assert_eq!(outcome, PollOutcome::Completed);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod monitor;
pub mod orchestrator;
pub mod relationship;
pub mod response;
pub mod snapmirror;
pub mod status;

pub use auth::Credential;
pub use backend::{BackendKind, CloudSyncBackend, ReplicationBackend, TriggerOutcome};
pub use client::{CloudSyncClient, TriggerReceipt};
pub use config::{load_secret, ClientConfig, ConfigError, MonitorOptions};
pub use error::ReplError;
pub use monitor::{monitor, StatusSource};
pub use orchestrator::Replicator;
pub use relationship::Relationship;
pub use response::RawResponse;
pub use snapmirror::{SnapMirrorBackend, SnapMirrorConfig};
pub use status::{JobStatus, PollOutcome};
