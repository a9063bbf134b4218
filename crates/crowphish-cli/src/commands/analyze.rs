//! Screenshot triage command.

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crowphish_core::{analyze_screenshot, GeminiClient, TriageConfig, TriageError, TriageResult};

use super::Cli;
use crate::output;

/// Why the run cannot start.
#[derive(Debug)]
pub enum PreflightError {
    MissingCredential,
    InvalidConfig(String),
    MissingImage,
}

/// Validate configuration and arguments before any network activity.
///
/// The credential is checked first, then the image argument.
pub fn preflight(
    config: TriageResult<TriageConfig>,
    image: Option<PathBuf>,
    model: &str,
) -> std::result::Result<(TriageConfig, PathBuf), PreflightError> {
    let config = match config {
        Ok(config) => config,
        Err(TriageError::MissingApiKey(_)) => return Err(PreflightError::MissingCredential),
        Err(e) => return Err(PreflightError::InvalidConfig(e.to_string())),
    };

    let image = image.ok_or(PreflightError::MissingImage)?;

    Ok((config.with_model(model), image))
}

/// Exit status for configuration and usage errors.
pub const EXIT_PREFLIGHT: u8 = 1;

pub async fn execute(cli: Cli) -> Result<u8> {
    run(cli, TriageConfig::from_env()).await
}

/// Run one triage and return the process exit status.
///
/// Only preflight failures are non-zero; a failed analysis is reported and
/// still exits cleanly.
pub async fn run(cli: Cli, config: TriageResult<TriageConfig>) -> Result<u8> {
    if !cli.no_banner && !cli.json {
        output::print_banner();
    }

    let (config, image) = match preflight(config, cli.image, &cli.model) {
        Ok(ready) => ready,
        Err(e) => {
            output::print_preflight_error(&e);
            return Ok(EXIT_PREFLIGHT);
        }
    };

    info!(image = %image.display(), model = %config.model, "Starting triage");
    debug!(?config, "Resolved configuration");

    match run_triage(&config, &image).await {
        Ok(result) if cli.json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Ok(result) => output::print_report(&result),
        Err(e) => output::print_failure(&e),
    }

    Ok(0)
}

async fn run_triage(
    config: &TriageConfig,
    image: &std::path::Path,
) -> TriageResult<crowphish_core::AnalysisResult> {
    let client = GeminiClient::new(config)?;

    let spinner = analysis_spinner();
    let outcome = analyze_screenshot(&client, image).await;
    spinner.finish_and_clear();

    outcome
}

/// Transient spinner shown while waiting on the service.
fn analysis_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.yellow.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    spinner.set_style(style);
    spinner.set_message("Analyzing pixel data...".yellow().bold().to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
