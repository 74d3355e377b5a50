use std::time::Duration;

/// Auth0 token endpoint that exchanges a refresh token for an access token.
pub const TOKEN_URL: &str = "https://netapp-cloud-account.auth0.com/oauth/token";

/// Accounts endpoint used to resolve the account ID for an access token.
pub const ACCOUNTS_URL: &str = "https://cloudsync.netapp.com/api/accounts";

/// Base URL of the Cloud Sync relationship API.
pub const API_BASE_URL: &str = "https://cloudsync.netapp.com/api";

/// Public OAuth client ID of the Cloud Sync API.
pub const CLIENT_ID: &str = "Mu0V1ywgYteI6w1MbD15fKfVIUrNXGWC";

/// OAuth grant type sent to the token endpoint.
pub const GRANT_TYPE: &str = "refresh_token";

/// Header carrying the resolved account ID on relationship calls.
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// Activity type reported by a finished sync run.
pub const SYNC_ACTIVITY: &str = "Sync";

/// Activity status reported by a finished sync run.
pub const DONE_STATUS: &str = "DONE";

/// Pause between status queries while waiting for completion.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Per-request timeout for Cloud Sync and Auth0 calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a single `ansible-playbook` run.
pub const DEFAULT_PLAYBOOK_TIMEOUT: Duration = Duration::from_secs(600);
