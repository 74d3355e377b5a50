//! SnapMirror replication via Ansible.
//!
//! Renders a one-task playbook around the `na_ontap_snapmirror` module, writes
//! it to disk and runs `ansible-playbook` on it. The playbook holds the cluster
//! password: it is created owner-only and, unless a path is configured, lives
//! in a unique temporary file that is removed once the run ends. The playbook run is the whole
//! contract: a zero exit status means the update was triggered, anything else
//! is a [`ReplError::Playbook`]. There is no status polling for this backend.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempPath;

use crate::backend::{BackendKind, ReplicationBackend, TriggerOutcome};
use crate::constants::DEFAULT_PLAYBOOK_TIMEOUT;
use crate::error::ReplError;

/// Connection and volume details for one SnapMirror update.
#[derive(Clone)]
pub struct SnapMirrorConfig {
    /// Destination cluster management hostname or IP
    pub hostname: String,
    pub source_svm: String,
    pub source_volume: String,
    pub destination_svm: String,
    pub destination_volume: String,
    /// Cluster admin username
    pub username: String,
    /// Cluster admin password
    pub password: String,
    /// `yes` or `no`, passed through to `validate_certs`
    pub validate_certs: String,
    /// Where the rendered playbook is written. `None` uses a fresh temporary
    /// file per run.
    pub playbook_path: Option<PathBuf>,
    /// `ansible-playbook` executable
    pub ansible_bin: String,
    pub timeout: Duration,
}

impl SnapMirrorConfig {
    /// Config with default cert validation, playbook location and executable.
    pub fn new(
        hostname: impl Into<String>,
        source: (impl Into<String>, impl Into<String>),
        destination: (impl Into<String>, impl Into<String>),
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            source_svm: source.0.into(),
            source_volume: source.1.into(),
            destination_svm: destination.0.into(),
            destination_volume: destination.1.into(),
            username: username.into(),
            password: password.into(),
            validate_certs: "yes".to_string(),
            playbook_path: None,
            ansible_bin: "ansible-playbook".to_string(),
            timeout: DEFAULT_PLAYBOOK_TIMEOUT,
        }
    }

    pub fn source_path(&self) -> String {
        format!("{}:{}", self.source_svm, self.source_volume)
    }

    pub fn destination_path(&self) -> String {
        format!("{}:{}", self.destination_svm, self.destination_volume)
    }
}

impl std::fmt::Debug for SnapMirrorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapMirrorConfig")
            .field("hostname", &self.hostname)
            .field("source", &self.source_path())
            .field("destination", &self.destination_path())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("validate_certs", &self.validate_certs)
            .field("playbook_path", &self.playbook_path)
            .field("ansible_bin", &self.ansible_bin)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Single-quoted YAML scalar.
fn yaml_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render the playbook that updates the SnapMirror relationship.
pub fn render_playbook(config: &SnapMirrorConfig) -> String {
    format!(
        "---\n\
         - name: \"Trigger SnapMirror Update\"\n\
         \x20 hosts: localhost\n\
         \x20 tasks:\n\
         \x20 - name: update snapmirror\n\
         \x20   na_ontap_snapmirror:\n\
         \x20     state: present\n\
         \x20     source_path: {}\n\
         \x20     destination_path: {}\n\
         \x20     hostname: {}\n\
         \x20     username: {}\n\
         \x20     password: {}\n\
         \x20     https: 'yes'\n\
         \x20     validate_certs: {}\n",
        yaml_quote(&config.source_path()),
        yaml_quote(&config.destination_path()),
        yaml_quote(&config.hostname),
        yaml_quote(&config.username),
        yaml_quote(&config.password),
        yaml_quote(&config.validate_certs),
    )
}

/// Playbook written for one run.
enum PlaybookFile {
    Temporary(TempPath),
    Fixed(PathBuf),
}

impl PlaybookFile {
    fn path(&self) -> &Path {
        match self {
            Self::Temporary(path) => path.as_ref(),
            Self::Fixed(path) => path.as_path(),
        }
    }
}

/// Unique owner-only file in the temp dir, removed when the `TempPath` drops.
fn write_temporary(playbook: &str) -> Result<TempPath, ReplError> {
    let mut file = tempfile::Builder::new()
        .prefix("snapmirror-update")
        .suffix(".yaml")
        .tempfile()?;
    file.write_all(playbook.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// Write to a configured path, never through a symlink.
fn write_fixed(path: &Path, playbook: &str) -> Result<(), ReplError> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(ReplError::Playbook(format!(
                "refusing to write playbook through symlink {}",
                path.display()
            )));
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten a pre-existing file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(playbook.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Triggers SnapMirror updates by running the rendered playbook.
#[derive(Debug, Clone)]
pub struct SnapMirrorBackend {
    config: SnapMirrorConfig,
}

impl SnapMirrorBackend {
    pub fn new(config: SnapMirrorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnapMirrorConfig {
        &self.config
    }

    async fn write_playbook(&self) -> Result<PlaybookFile, ReplError> {
        let playbook = render_playbook(&self.config);
        let path = self.config.playbook_path.clone();
        tokio::task::spawn_blocking(move || match path {
            Some(path) => write_fixed(&path, &playbook).map(|()| PlaybookFile::Fixed(path)),
            None => write_temporary(&playbook).map(PlaybookFile::Temporary),
        })
        .await
        .map_err(|e| ReplError::Playbook(format!("playbook writer failed: {e}")))?
    }

    async fn run_playbook(&self, playbook: &Path) -> Result<String, ReplError> {
        let bin = &self.config.ansible_bin;
        let output = tokio::time::timeout(
            self.config.timeout,
            tokio::process::Command::new(bin)
                .arg(playbook)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            ReplError::Playbook(format!("{bin} timed out after {:?}", self.config.timeout))
        })?
        .map_err(|e| ReplError::Playbook(format!("failed to run {bin}: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(stdout = %stdout, stderr = %stderr, "ansible-playbook failed");
            return Err(ReplError::Playbook(format!(
                "{bin} exited with {}: {}",
                output.status,
                if stderr.trim().is_empty() {
                    stdout.trim()
                } else {
                    stderr.trim()
                }
            )));
        }

        Ok(stdout)
    }
}

impl ReplicationBackend for SnapMirrorBackend {
    async fn trigger_replication(&self) -> Result<TriggerOutcome, ReplError> {
        let source = self.config.source_path();
        let destination = self.config.destination_path();

        let playbook = self.write_playbook().await?;
        tracing::info!(
            playbook = %playbook.path().display(),
            "Created Ansible playbook"
        );

        tracing::info!(
            source = %source,
            destination = %destination,
            hostname = %self.config.hostname,
            "Executing Ansible playbook to trigger SnapMirror update"
        );
        // The temporary playbook is deleted when `playbook` drops, after the run.
        let stdout = self.run_playbook(playbook.path()).await?;

        Ok(TriggerOutcome {
            backend: BackendKind::SnapMirror,
            target: format!("{source} -> {destination}"),
            detail: stdout,
        })
    }
}
