/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

//! Interactive admission-control probe.
//!
//! Loads a scenario, books every runnable job on the simulated host the way
//! the dispatch server would, then asks the EDF candidate check whether one
//! more job of a given size and deadline could be committed.  With `--sweep`
//! it walks a ladder of deadlines and reports where admission flips — a
//! quick way to eyeball the host's remaining headroom.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use gridsim::config::Scenario;
use gridsim::edf::EdfSimulator;
use gridsim::workload::Job;

// ── CLI ───────────────────────────────────────────────────────────────────────

/// Probe candidate admission against a scenario's committed jobs.
#[derive(Debug, Parser)]
#[command(name = "admission-probe", about = "gridsim admission-control probe")]
struct Cli {
    /// Path to the YAML scenario file.
    scenario: PathBuf,

    /// CPU seconds of the hypothetical candidate.
    #[arg(short = 'c', long, default_value_t = 3_600.0)]
    cpu: f64,

    /// Candidate computation deadline, in seconds from now.
    #[arg(short = 'd', long, default_value_t = 86_400.0)]
    deadline: f64,

    /// Probe a ladder of deadlines (1h, 2h, 4h, … up to --deadline) instead
    /// of a single point.
    #[arg(long, default_value_t = false)]
    sweep: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let scenario = Scenario::load_from_file(&cli.scenario)?;
    let params = scenario.params;

    // Book every runnable job, deadlines converted to the relative EDF frame.
    let mut committed: Vec<Job> = scenario
        .projects
        .iter()
        .flat_map(|p| p.jobs().iter())
        .filter(|j| j.nearly_runnable)
        .cloned()
        .map(|mut j| {
            j.computation_deadline = params.computation_deadline(j.report_deadline) - params.now;
            j
        })
        .collect();

    let edf = EdfSimulator::new(params.ncpus)?;
    let outcome = edf.simulate(&mut committed);
    info!(
        "Booked {} job(s) on {} CPU(s); {} already missing their deadline",
        committed.len(),
        params.ncpus,
        outcome.deadline_misses
    );

    if cli.sweep {
        let mut deadline = 3_600.0;
        while deadline <= cli.deadline {
            probe(&edf, &committed, cli.cpu, deadline)?;
            deadline *= 2.0;
        }
    } else {
        probe(&edf, &committed, cli.cpu, cli.deadline)?;
    }

    Ok(())
}

fn probe(edf: &EdfSimulator, committed: &[Job], cpu: f64, deadline: f64) -> Result<()> {
    let candidate = Job::new("probe", cpu, deadline)?;
    let accepted = edf.check_candidate(committed, &candidate);
    info!(
        "  {cpu:>8.0}s of work, deadline {deadline:>8.0}s → {}",
        if accepted { "ACCEPT" } else { "REJECT" }
    );
    Ok(())
}
