//! CLI definition and handler.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crowphish_core::config::DEFAULT_MODEL;

pub mod analyze;

/// Phishing triage for email screenshots, powered by Gemini
#[derive(Parser)]
#[command(name = "crowphish")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the email screenshot to analyze
    pub image: Option<PathBuf>,

    /// Gemini model to use for the analysis
    #[arg(long, env = "CROWPHISH_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Print the parsed verdict as JSON instead of panels
    #[arg(long)]
    pub json: bool,

    /// Do not print the banner
    #[arg(long)]
    pub no_banner: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Run the command and return the process exit status.
    pub async fn execute(self) -> Result<u8> {
        analyze::execute(self).await
    }
}
