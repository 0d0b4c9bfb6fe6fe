//! Command-line development host for the MBTALive integration.

mod local_host;
mod server;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mbtalive_core::config::{constants, env_vars};
use mbtalive_core::{AssetStrategy, ConfigEntry};
use mbtalive_integration::MbtaLiveIntegration;
use serde::Serialize;
use serde_json::json;

use crate::local_host::{HostSnapshot, LocalHost};

/// MBTALive - run the integration lifecycle against a local config directory.
#[derive(Parser, Debug)]
#[command(name = "mbtalive")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Host options shared by every command.
#[derive(clap::Args, Debug)]
struct HostArgs {
    /// Host configuration directory.
    #[arg(short, long)]
    config_dir: PathBuf,

    /// Host configuration file (JSON) passed to bootstrap.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Card publication strategy (static_path or served_directory).
    #[arg(short, long)]
    strategy: Option<String>,

    /// Card bundle to publish instead of the bundled one.
    #[arg(short, long)]
    bundle: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run bootstrap and print what the host ended up with.
    Bootstrap {
        #[command(flatten)]
        common: HostArgs,
    },
    /// Bootstrap, then set up and unload one config entry.
    Cycle {
        #[command(flatten)]
        common: HostArgs,
        /// Entry id (generated when omitted).
        #[arg(short, long)]
        entry_id: Option<String>,
    },
    /// Bootstrap, then serve the published card over HTTP.
    Serve {
        #[command(flatten)]
        common: HostArgs,
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to.
        #[arg(short, long, default_value_t = 8123)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Bootstrap { common } => run_bootstrap(common).await,
        Command::Cycle { common, entry_id } => run_cycle(common, entry_id).await,
        Command::Serve { common, host, port } => run_serve(common, host, port).await,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    // Build the env filter for log level control
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "mbtalive={level},mbtalive_core={level},mbtalive_integration={level},warn",
            level = default_level
        ))
    });

    // Logs go to stderr so stdout stays machine-readable
    if env_vars::log_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Assemble the host configuration mapping from a file and CLI overrides.
fn host_config(args: &HostArgs) -> Result<serde_json::Value> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => json!({}),
    };

    let Some(root) = config.as_object_mut() else {
        anyhow::bail!("host configuration must be a JSON object");
    };
    let section = root
        .entry(constants::DOMAIN)
        .or_insert_with(|| json!({}));
    if section.is_null() {
        *section = json!({});
    }
    let Some(section) = section.as_object_mut() else {
        anyhow::bail!("'{}' section must be a JSON object", constants::DOMAIN);
    };
    let frontend = section.entry("frontend").or_insert_with(|| json!({}));
    let Some(frontend) = frontend.as_object_mut() else {
        anyhow::bail!("'{}.frontend' must be a JSON object", constants::DOMAIN);
    };

    if let Some(strategy) = &args.strategy {
        let strategy: AssetStrategy = strategy.parse()?;
        frontend.insert("strategy".to_string(), json!(strategy.as_str()));
    }
    if let Some(bundle) = &args.bundle {
        let bundle = std::path::absolute(bundle)
            .with_context(|| format!("Cannot resolve {}", bundle.display()))?;
        frontend.insert("bundle_path".to_string(), json!(bundle));
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// What `mbtalive bootstrap` prints.
#[derive(Serialize)]
struct BootstrapOutput {
    bootstrap: bool,
    #[serde(flatten)]
    host: HostSnapshot,
}

/// Create the host and run the bootstrap hook on it.
async fn bootstrap_host(args: &HostArgs) -> Result<(LocalHost, MbtaLiveIntegration, bool)> {
    let config = host_config(args)?;
    let host = LocalHost::new(&args.config_dir);
    let integration = MbtaLiveIntegration::new();

    let ok = integration.bootstrap(&host, &config).await;
    Ok((host, integration, ok))
}

async fn run_bootstrap(args: HostArgs) -> Result<()> {
    let (host, _integration, ok) = bootstrap_host(&args).await?;
    let output = BootstrapOutput {
        bootstrap: ok,
        host: host.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !ok {
        anyhow::bail!("MBTALive bootstrap failed");
    }
    Ok(())
}

async fn run_cycle(args: HostArgs, entry_id: Option<String>) -> Result<()> {
    let (host, integration, ok) = bootstrap_host(&args).await?;
    if !ok {
        anyhow::bail!("MBTALive bootstrap failed");
    }

    let mut entry = ConfigEntry::new(constants::DOMAIN, "MBTALive", json!({}));
    if let Some(id) = entry_id {
        entry = entry.with_id(id);
    }

    let setup = integration.setup_entry(&host, &entry).await;
    let unload = integration.unload_entry(&host, &entry).await;
    let unload_again = integration.unload_entry(&host, &entry).await;

    let report = json!({
        "entry_id": entry.entry_id,
        "setup": setup,
        "unload": unload,
        "unload_again": unload_again,
        "state": integration.controller().state(&entry.entry_id),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_serve(args: HostArgs, bind: String, port: u16) -> Result<()> {
    let (host, _integration, ok) = bootstrap_host(&args).await?;
    if !ok {
        anyhow::bail!("MBTALive bootstrap failed");
    }

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;
    let app = server::router(&host);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Serving MBTALive card on http://{}", addr);
    for route in host.static_routes() {
        tracing::info!("  {} -> {}", route.url_path, route.file_path.display());
    }

    axum::serve(listener, app).await?;
    Ok(())
}
