//! crowphish - phishing triage for email screenshots
//!
//! Sends a screenshot to Gemini and prints the analyst verdict.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::Cli;

/// Initialize tracing on stderr so stdout carries only the report.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "crowphish=debug,crowphish_core=debug"
    } else {
        "crowphish=warn,crowphish_core=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = cli.execute().await?;
    Ok(ExitCode::from(code))
}
