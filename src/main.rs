// src/main.rs
// =============================================================================
// This is the entry point of the link-warden CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, to stderr)
// 3. Validate the configuration, before any request goes out
// 4. Crawl, then print or save the report
// 5. Exit with proper code (0 = no broken links, 1 = broken links, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use link_warden::{crawl_website, CrawlConfig, CrawlReport};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no broken links
//   Ok(1) = broken links found
//   Err   = configuration or setup error
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let json = cli.json;
    let output = cli.output.clone();
    let config = CrawlConfig::from_options(cli.into_options()).context("invalid configuration")?;

    println!("Starting link check from: {}", config.seed);
    let report = crawl_website(config)
        .await
        .context("failed to set up the HTTP client")?;

    let rendered = if json {
        serde_json::to_string_pretty(&report)?
    } else {
        report.to_string()
    };
    emit(&rendered, output.as_deref());

    Ok(exit_code(&report))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// Writes the report to `output` if given. A report that can't be saved is
// printed instead, never lost.
fn emit(rendered: &str, output: Option<&Path>) {
    match output {
        Some(path) => match std::fs::write(path, rendered) {
            Ok(()) => {
                info!(path = %path.display(), "report saved");
                println!("Report saved to {}", path.display());
            }
            Err(e) => {
                error!(path = %path.display(), "error saving report: {}", e);
                println!("{rendered}");
            }
        },
        None => println!("{rendered}"),
    }
}

fn exit_code(report: &CrawlReport) -> i32 {
    if report.has_broken_links() {
        1
    } else {
        0
    }
}
