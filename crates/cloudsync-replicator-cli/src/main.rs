use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use replicator::{
    load_secret, ClientConfig, ConfigError, MonitorOptions, PollOutcome, Relationship, ReplError,
    ReplicationBackend, Replicator, SnapMirrorBackend, SnapMirrorConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "cloudsync-replicate",
    version,
    about = "Trigger and monitor Cloud Sync and SnapMirror replication"
)]
struct Cli {
    /// Cloud Sync refresh token
    #[arg(
        long,
        env = "CLOUD_SYNC_REFRESH_TOKEN",
        hide_env_values = true,
        global = true
    )]
    refresh_token: Option<String>,

    /// File holding the refresh token (e.g. a mounted Kubernetes secret)
    #[arg(long, env = "CLOUD_SYNC_REFRESH_TOKEN_FILE", global = true)]
    refresh_token_file: Option<PathBuf>,

    /// Log every raw API response
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List relationships visible to the account
    List {
        /// Print every field instead of id/source/target
        #[arg(long)]
        full: bool,
    },
    /// Start a sync run without waiting for it
    Trigger { relationship_id: String },
    /// Check on (or wait for) the latest sync run
    Monitor {
        relationship_id: String,
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Start a sync run and follow it to completion
    Sync {
        relationship_id: String,
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Trigger an ONTAP SnapMirror update through Ansible
    Snapmirror(SnapMirrorArgs),
}

#[derive(Args, Debug)]
struct PollArgs {
    /// Query once instead of waiting for completion
    #[arg(long)]
    no_wait: bool,
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,
    /// Give up after this many status queries
    #[arg(long)]
    max_attempts: Option<u32>,
    /// Give up after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
}

impl PollArgs {
    fn options(&self) -> MonitorOptions {
        MonitorOptions::default()
            .wait_for_completion(!self.no_wait)
            .interval(Duration::from_secs(self.interval_secs))
            .max_attempts(self.max_attempts)
            .deadline(self.deadline_secs.map(Duration::from_secs))
    }
}

#[derive(Args, Debug)]
struct SnapMirrorArgs {
    /// Destination cluster management hostname
    #[arg(long, env = "ONTAP_CLUSTER_MGMT_HOSTNAME")]
    hostname: String,
    #[arg(long)]
    source_svm: String,
    #[arg(long)]
    source_volume: String,
    #[arg(long)]
    destination_svm: String,
    #[arg(long)]
    destination_volume: String,
    #[arg(long, default_value = "yes", value_parser = ["yes", "no"])]
    validate_certs: String,
    /// Directory holding `username` and `password` files
    #[arg(long, env = "ONTAP_CREDENTIALS_DIR", default_value = "/mnt/secret")]
    credentials_dir: PathBuf,
    /// Write the playbook here instead of a temporary file
    #[arg(long)]
    playbook_path: Option<PathBuf>,
    #[arg(long, default_value = "ansible-playbook")]
    ansible_bin: String,
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse arguments (env fallbacks apply here)
    let cli = Cli::parse();
    tracing::info!("Starting cloudsync-replicate {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        if let Some(response) = e.downcast_ref::<ReplError>().and_then(ReplError::response) {
            eprintln!("{response}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::List { full } => {
            let (replicator, refresh_token) = connect(&cli)?;
            let relationships = replicator.list_relationships(&refresh_token).await?;
            tracing::info!("Found {} relationships", relationships.len());
            for (i, relationship) in relationships.iter().enumerate() {
                println!("{}", listing_header(i + 1, relationship));
                if *full {
                    println!("{}\n", serde_json::to_string_pretty(relationship)?);
                } else {
                    println!("{}\n", relationship.summary());
                }
            }
        }
        Command::Trigger { relationship_id } => {
            let (replicator, refresh_token) = connect(&cli)?;
            let receipt = replicator
                .trigger_only(&refresh_token, relationship_id)
                .await?;
            tracing::info!("Trigger accepted for account {}", receipt.account_id);
            println!(
                "Cloud Sync update triggered for {} (HTTP {})",
                receipt.relationship_id, receipt.status
            );
        }
        Command::Monitor {
            relationship_id,
            poll,
        } => {
            let (replicator, refresh_token) = connect(&cli)?;
            let outcome = replicator
                .monitor_only(&refresh_token, relationship_id, &poll.options())
                .await?;
            report(relationship_id, outcome);
        }
        Command::Sync {
            relationship_id,
            poll,
        } => {
            let (replicator, refresh_token) = connect(&cli)?;
            let outcome = replicator
                .trigger_and_monitor(&refresh_token, relationship_id, &poll.options())
                .await?;
            report(relationship_id, outcome);
        }
        Command::Snapmirror(args) => snapmirror(args).await?,
    }

    Ok(())
}

/// Build the Cloud Sync client and resolve the refresh token.
fn connect(cli: &Cli) -> Result<(Replicator, String), Box<dyn std::error::Error>> {
    let refresh_token = refresh_token(cli)?;
    let config = ClientConfig::from_env()?;
    let config = if cli.verbose {
        config.log_responses(true)
    } else {
        config
    };
    Ok((Replicator::new(config)?, refresh_token))
}

/// `-- Relationship #n (nfs -> s3) --`, without protocols when unreported.
fn listing_header(index: usize, relationship: &Relationship) -> String {
    match (relationship.source_protocol(), relationship.target_protocol()) {
        (Some(source), Some(target)) => {
            format!("-- Relationship #{index} ({source} -> {target}) --")
        }
        _ => format!("-- Relationship #{index} --"),
    }
}

fn refresh_token(cli: &Cli) -> Result<String, ConfigError> {
    if let Some(token) = cli.refresh_token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }
    match &cli.refresh_token_file {
        Some(path) => load_secret(path),
        None => Err(ConfigError::MissingRequired(
            "CLOUD_SYNC_REFRESH_TOKEN or CLOUD_SYNC_REFRESH_TOKEN_FILE",
        )),
    }
}

/// Print the monitoring result. Exits with status 2 if a ceiling was hit.
fn report(relationship_id: &str, outcome: PollOutcome) {
    tracing::info!("Monitoring of {relationship_id} finished: {outcome:?}");
    match outcome {
        PollOutcome::Completed => {
            println!("Success: Cloud Sync update of {relationship_id} is complete.")
        }
        PollOutcome::AbortedByCaller => {
            println!("Cloud Sync update of {relationship_id} is not yet complete.")
        }
        PollOutcome::StillRunning => {
            println!("Gave up waiting; Cloud Sync update of {relationship_id} is still running.");
            std::process::exit(2);
        }
    }
}

async fn snapmirror(args: &SnapMirrorArgs) -> Result<(), Box<dyn std::error::Error>> {
    let username = load_secret(args.credentials_dir.join("username"))?;
    let password = load_secret(args.credentials_dir.join("password"))?;

    let mut config = SnapMirrorConfig::new(
        args.hostname.as_str(),
        (args.source_svm.as_str(), args.source_volume.as_str()),
        (args.destination_svm.as_str(), args.destination_volume.as_str()),
        username,
        password,
    );
    config.validate_certs = args.validate_certs.clone();
    config.ansible_bin = args.ansible_bin.clone();
    config.playbook_path = args.playbook_path.clone();

    tracing::info!(
        "Updating SnapMirror {} -> {} on {}",
        config.source_path(),
        config.destination_path(),
        config.hostname
    );
    let outcome = SnapMirrorBackend::new(config).trigger_replication().await?;
    if !outcome.detail.is_empty() {
        println!("{}", outcome.detail.trim_end());
    }
    println!("SnapMirror update triggered: {}", outcome.target);
    Ok(())
}
