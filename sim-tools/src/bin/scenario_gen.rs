/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

//! Random scenario generator.
//!
//! Emits a scenario YAML in the schema `gridsim::config` expects, with
//! project shares, job sizes and deadlines drawn from ranges that resemble a
//! real host's queue.  The same seed always produces the same file, so a
//! failing stress run can be reproduced exactly.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

// ── CLI ───────────────────────────────────────────────────────────────────────

/// Generate a random gridsim scenario.
#[derive(Debug, Parser)]
#[command(name = "scenario-gen", about = "Random gridsim scenario generator")]
struct Cli {
    /// Number of projects.
    #[arg(short = 'p', long, default_value_t = 4)]
    projects: usize,

    /// Maximum jobs per project (actual count is random in 0..=max).
    #[arg(short = 'j', long, default_value_t = 6)]
    max_jobs: usize,

    /// CPUs on the simulated host.
    #[arg(short = 'n', long, default_value_t = 4)]
    ncpus: usize,

    /// RNG seed (same seed → same scenario).
    #[arg(short = 's', long, default_value_t = 1)]
    seed: u64,

    /// Output file; stdout when omitted.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

// ── Output schema ─────────────────────────────────────────────────────────────
// Mirrors the scenario layout documented in gridsim::config.

#[derive(Serialize)]
struct ScenarioOut {
    host: HostOut,
    preferences: PrefsOut,
    projects: Vec<ProjectOut>,
}

#[derive(Serialize)]
struct HostOut {
    ncpus: usize,
    overall_cpu_frac: f64,
    now: f64,
}

#[derive(Serialize)]
struct PrefsOut {
    work_buf_min_days: f64,
    work_buf_additional_days: f64,
    cpu_scheduling_period_minutes: f64,
}

#[derive(Serialize)]
struct ProjectOut {
    name: String,
    resource_share: f64,
    jobs: Vec<JobOut>,
}

#[derive(Serialize)]
struct JobOut {
    name: String,
    cpu_time_remaining: f64,
    report_deadline: f64,
}

// ── Generation ────────────────────────────────────────────────────────────────

fn generate(cli: &Cli) -> ScenarioOut {
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let projects = (0..cli.projects)
        .map(|pi| {
            let njobs = rng.random_range(0..=cli.max_jobs);
            let jobs = (0..njobs)
                .map(|ji| JobOut {
                    name: format!("p{pi}_wu_{ji}"),
                    // 10 minutes to a day of CPU work
                    cpu_time_remaining: rng.random_range(600.0_f64..86_400.0).round(),
                    // due within one to ten days
                    report_deadline: rng.random_range(86_400.0_f64..864_000.0).round(),
                })
                .collect();
            ProjectOut {
                name: format!("project_{pi}"),
                resource_share: rng.random_range(1..=10) as f64 * 50.0,
                jobs,
            }
        })
        .collect();

    ScenarioOut {
        host: HostOut {
            ncpus: cli.ncpus,
            overall_cpu_frac: rng.random_range(0.5..=1.0),
            now: 0.0,
        },
        preferences: PrefsOut {
            work_buf_min_days: 0.5,
            work_buf_additional_days: 0.5,
            cpu_scheduling_period_minutes: 60.0,
        },
        projects,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let scenario = generate(&cli);
    let yaml = serde_yaml::to_string(&scenario).context("Failed to serialise scenario")?;

    match &cli.output {
        Some(path) => {
            fs::write(path, &yaml)
                .with_context(|| format!("Cannot write scenario to {}", path.display()))?;
            info!(
                "Wrote scenario with {} project(s) to {} (seed {})",
                scenario.projects.len(),
                path.display(),
                cli.seed
            );
        }
        None => print!("{yaml}"),
    }

    Ok(())
}
