//! uiproof - scripted acceptance runs for hosted front-ends
//!
//! Main entry point for the CLI application.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use uiproof::browser::AgentBrowser;
use uiproof::core::{Origin, UiProofError};
use uiproof::{cli, Config, Scenario, StepRunner};

/// Run a scripted UI flow and capture evidence for every step
#[derive(Parser, Debug)]
#[command(name = "uiproof")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File path or http(s) URL of the front-end (overrides config)
    origin: Option<String>,

    /// Built-in sequence to run (feature-tour, preset-history)
    #[arg(long, short = 's', default_value = "feature-tour")]
    scenario: String,

    /// Run steps from a TOML file instead of a built-in sequence
    #[arg(long, conflicts_with = "scenario")]
    steps: Option<PathBuf>,

    /// Directory for screenshots and report.json
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Config file (default: ~/.config/uiproof/config.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Run in headed browser mode (visible window)
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    // Build configuration
    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };

    // Apply CLI overrides
    if let Some(origin) = &args.origin {
        config.run.origin = origin.clone();
    }

    if let Some(output) = &args.output {
        config.run.output_dir = output.clone();
    }

    if args.debug {
        config.run.debug = true;
    }

    if args.headed {
        config.browser.headed = true;
    }

    init_logging(config.run.debug);

    let scenario = match &args.steps {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin(&args.scenario).with_context(|| {
            format!(
                "unknown scenario '{}' (available: {})",
                args.scenario,
                Scenario::builtin_names().join(", ")
            )
        })?,
    };

    let origin = Origin::parse(&config.run.origin)?;
    let browser = AgentBrowser::from_config(&config.browser);
    if !browser.is_available().await {
        return Err(UiProofError::AgentBrowserNotFound.into());
    }

    let runner = StepRunner::from_config(origin, &config.run);
    let report = runner
        .run_until(browser, scenario.steps(), interrupted())
        .await;

    print!("{}", cli::render(scenario.name(), &report));
    let report_path = cli::write_json(&report, &config.run.output_dir)
        .context("failed to write run report")?;
    println!("\nReport: {}", report_path.display());

    Ok(report.succeeded())
}

/// Resolves on Ctrl-C; never resolves if the signal cannot be installed
async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::warn!("interrupted, closing session"),
        Err(e) => {
            tracing::debug!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "uiproof=debug" } else { "uiproof=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
