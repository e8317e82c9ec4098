//! acctremap command-line tool.
//!
//! Reads legacy tracker account IDs from a CSV file and moves every issue
//! participant entry over to the person's current first-party account.
//! Also provides single-account lookup and configuration helpers.

mod summary;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use acctremap_core::config::AppConfig;
use acctremap_core::Reconciler;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Remap tracker participant account IDs.
#[derive(Parser, Debug)]
#[command(
    name = "acctremap",
    version,
    about = "Replace legacy tracker account IDs in issue participant fields"
)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults apply if omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile every account ID in a headerless CSV file.
    Run {
        /// CSV file with one legacy account ID per row.
        csv: PathBuf,

        /// Log planned replacements without updating any issue.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the identity chain for one account without touching issues.
    Lookup {
        /// Legacy tracker account ID.
        account_id: String,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./acctremap.toml")]
        output: PathBuf,
    },

    /// Validate the configuration and report which secrets are set.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Installed before the config is read so its resolution warnings are
    // visible; the configured level replaces the default once known.
    let filter_handle = init_tracing(cli.log_level.as_deref().unwrap_or("info"));

    if let Commands::Init { output } = &cli.command {
        return cmd_init(output);
    }

    let config = load_config(cli.config.as_deref())?;
    if cli.log_level.is_none() {
        filter_handle
            .reload(parse_filter(&config.run.log_level))
            .context("failed to apply configured log level")?;
    }

    match cli.command {
        Commands::Run { csv, dry_run } => cmd_run(config, &csv, dry_run).await,
        Commands::Lookup { account_id } => cmd_lookup(&config, &account_id).await,
        Commands::Validate => cmd_validate(&config, cli.config.as_deref()),
        Commands::Init { .. } => unreachable!(),
    }
}

fn parse_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(level: &str) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(parse_filter(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
    handle
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load_and_resolve(path).context("failed to load configuration")
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_run(mut config: AppConfig, csv: &Path, dry_run: bool) -> Result<()> {
    config.run.dry_run |= dry_run;
    let reconciler = Reconciler::new(&config).context("failed to initialize API clients")?;

    info!("========================================");
    info!("  acctremap v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    info!("Input         : {}", csv.display());
    info!("Tracker       : {}", config.tracker.base_url);
    info!("Directory     : {}", config.directory.url);
    info!("Field         : {}", config.tracker.participants_field_id);
    info!("Dry run       : {}", config.run.dry_run);
    info!("========================================");

    let summary = reconciler
        .run_csv(csv)
        .await
        .with_context(|| format!("reconciliation of {} aborted", csv.display()))?;

    summary::print_summary(&summary);
    Ok(())
}

async fn cmd_lookup(config: &AppConfig, account_id: &str) -> Result<()> {
    let reconciler = Reconciler::new(config).context("failed to initialize API clients")?;
    let lookup = reconciler
        .lookup_account(account_id)
        .await
        .with_context(|| format!("lookup of {} failed", account_id))?;

    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "(none)".to_string());
    println!("Account          : {}", lookup.account_id);
    println!("Email            : {}", show(&lookup.email));
    println!("Institutional ID : {}", show(&lookup.institutional_id));
    println!("Current account  : {}", show(&lookup.new_account_id));
    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# acctremap configuration
# Secrets are read from the environment variables named by the *_env keys.

[tracker]
base_url = "https://uwaterloo.atlassian.net/rest/api/3"
username_env = "JIRA_USERNAME"
password_env = "JIRA_PASSWORD"
participants_field_name = "request participants"
participants_field_id = "customfield_10026"
max_results = 100
first_party_account_type = "atlassian"
notify_users = false

[directory]
url = "https://iss-api.uwaterloo.ca/resolve_upn"
api_key_env = "ISS_API_KEY"
accept_invalid_certs = true

[run]
log_level = "info"
dry_run = false
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the tracker and directory URLs if needed");
    println!("  2. Set JIRA_USERNAME, JIRA_PASSWORD and ISS_API_KEY");
    println!(
        "  3. Validate with: acctremap validate --config {}",
        output.display()
    );
    println!(
        "  4. Preview with: acctremap run --config {} --dry-run jsm.csv",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config: &AppConfig, path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => println!("Validating configuration: {}", p.display()),
        None => println!("Validating built-in default configuration"),
    }
    println!();
    println!("  [OK] All required fields are valid");

    let set = |v: &Option<String>| if v.is_some() { "set" } else { "NOT SET" };
    println!();
    println!("Configuration summary:");
    println!("  Tracker URL     : {}", config.tracker.base_url);
    println!(
        "  Tracker user    : {} ({})",
        set(&config.tracker.username),
        config.tracker.username_env
    );
    println!(
        "  Tracker password: {} ({})",
        set(&config.tracker.password),
        config.tracker.password_env
    );
    println!("  Directory URL   : {}", config.directory.url);
    println!(
        "  Directory key   : {} ({})",
        set(&config.directory.api_key),
        config.directory.api_key_env
    );
    println!("  Field           : {}", config.tracker.participants_field_id);
    println!();

    match config.require_credentials() {
        Ok(()) => {
            println!("Configuration is valid.");
            Ok(())
        }
        Err(e) => {
            println!("  [FAIL] {}", e);
            anyhow::bail!("configuration is missing credentials");
        }
    }
}
