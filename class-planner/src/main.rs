/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use class_planner::config::PlanConfig;
use class_planner::Planner;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Two-stage class planner.
///
/// Example:
///   class-planner --config plan.yaml --timeout 60 --output plan-out.yaml
#[derive(Debug, Parser)]
#[command(
    name = "class-planner",
    about = "Class calendar leveling and instructor assignment planner",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML plan configuration.  The built-in plan is used when
    /// omitted.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Per-stage solver timeout in seconds, overriding the configuration.
    #[arg(short = 't', long = "timeout")]
    timeout: Option<u64>,

    /// Write the post-processed plan as YAML to this path.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Do not print the plan summary.
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        config  = ?cli.config,
        timeout = ?cli.timeout,
        output  = ?cli.output,
        quiet   = cli.quiet,
        "Class planner starting up..."
    );

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Load plan configuration ───────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => PlanConfig::load_from_file(path)
            .with_context(|| format!("Failed to load plan configuration: {}", path.display()))?,
        None => {
            warn!("No plan configuration file provided, using the built-in default plan");
            PlanConfig::default_plan()
        }
    };
    if let Some(timeout) = cli.timeout {
        config.parameters.timeout_seconds = timeout;
    }

    // ── Run the planner off the async runtime ─────────────────────────────────
    let planner = Planner::new(config);
    let task = tokio::task::spawn_blocking(move || planner.run());

    let outcome = tokio::select! {
        joined = task => joined.context("planning task panicked")??,
        _ = tokio::signal::ctrl_c() => {
            bail!("interrupted before planning finished");
        }
    };

    // ── Output ────────────────────────────────────────────────────────────────
    if !cli.quiet {
        println!("{}", outcome.report);
    }

    if let Some(path) = &cli.output {
        let yaml = outcome
            .report
            .to_yaml()
            .context("Failed to serialise the plan")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Cannot write plan to: {}", path.display()))?;
        info!("Plan written to: {}", path.display());
    }

    Ok(())
}
