//! VK Relink main entry point
//!
//! This is the command-line interface for bulk link replacement on VK walls.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vk_relink::config::{load_config, load_token, Config, RunParams};
use vk_relink::{RunEvent, Runner};

/// VK Relink: replace a link across community walls
///
/// Walks every post, comment and comment thread of the configured
/// communities and rewrites the old link into the new one, keeping
/// attachments. Requests stay under the API's rate limit.
#[derive(Parser, Debug)]
#[command(name = "vk-relink")]
#[command(version)]
#[command(about = "Replace a link across VK community walls", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// VK access token (defaults to VK_TOKEN from the environment or .env)
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be processed without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if cli.dry_run {
        handle_dry_run(&config, cli.token.as_deref());
        return Ok(());
    }

    let token = load_token(cli.token.as_deref())?;
    let params = RunParams::from_config(&config.run, token);
    handle_run(config, params, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            // Progress already goes to stdout
            0 => EnvFilter::new("vk_relink=error,warn"),
            1 => EnvFilter::new("vk_relink=info,warn"),
            2 => EnvFilter::new("vk_relink=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be processed
fn handle_dry_run(config: &Config, token: Option<&str>) {
    println!("=== VK Relink Dry Run ===\n");

    println!("API:");
    println!("  Endpoint: {}/method/", config.api.base_url);
    println!("  Version: {}", config.api.version);
    println!(
        "  Token: {}",
        if load_token(token).is_ok() {
            "found"
        } else {
            "missing (pass --token or set VK_TOKEN)"
        }
    );

    println!("\nLimits:");
    println!(
        "  Max calls: {} per {}s",
        config.limits.max_calls, config.limits.window_secs
    );
    println!("  Pacing: {}ms", config.limits.pacing_ms);
    println!("  Community pause: {}ms", config.limits.community_pause_ms);
    println!("  Page size: {}", config.limits.page_size);

    println!("\nReplacement:");
    println!("  {} -> {}", config.run.old_link, config.run.new_link);

    let params = RunParams::from_config(&config.run, String::new());
    println!("\nCommunities ({}):", params.communities.len());
    for community in &params.communities {
        println!("  - {}", community);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main run: prints progress and maps Ctrl-C to a stop request
async fn handle_run(config: Config, params: RunParams, quiet: bool) -> anyhow::Result<()> {
    let runner = Runner::new(config);
    let mut handle = runner.start(params)?;

    let control = handle.control();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Stop requested, finishing the current community...");
            control.request_stop();
        }
        // A second interrupt exits right away
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    while let Some(event) = handle.next_event().await {
        match event {
            RunEvent::Progress(line) => {
                if !quiet {
                    println!("{}", line);
                }
            }
            RunEvent::Finished(_) => break,
        }
    }

    let summary = handle.wait().await?;
    if quiet {
        println!("{}", summary);
    }
    Ok(())
}
