/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use gridsim::config::Scenario;
use gridsim::edf::EdfSimulator;
use gridsim::rrsim::RrSimulator;
use gridsim::trace::TracingSink;
use gridsim::workload::Job;

// ── CLI argument definition ───────────────────────────────────────────────────

/// gridsim work-scheduling simulator (Rust implementation).
///
/// Example:
///   gridsim demos/two_projects.yaml --candidate-cpu 7200 --candidate-deadline 86400
#[derive(Debug, Parser)]
#[command(
    name = "gridsim",
    about = "Deadline-aware work-scheduling simulator – Rust implementation",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML scenario file.
    scenario: PathBuf,

    /// CPU seconds of a hypothetical candidate job to probe for admission.
    #[arg(long, requires = "candidate_deadline")]
    candidate_cpu: Option<f64>,

    /// Computation deadline of the candidate, in seconds from now.
    #[arg(long, requires = "candidate_cpu")]
    candidate_deadline: Option<f64>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug to
    // see per-event simulation traces).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // ── Load scenario ─────────────────────────────────────────────────────────
    let mut scenario = match Scenario::load_from_file(&cli.scenario) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load scenario: {:#}", e);
            process::exit(1);
        }
    };
    let params = scenario.params;

    // ── Round-robin work-fetch projection ─────────────────────────────────────
    let rr = RrSimulator::new(params);
    let outcome = rr.simulate_with_sink(&mut scenario.projects, &mut TracingSink);

    info!(
        "Work-fetch projection over a {:.1} h window on {} CPU(s):",
        params.work_buf_total() / 3_600.0,
        params.ncpus
    );
    for p in &scenario.projects {
        info!(
            "  [{name}]  shortfall={shortfall:.0}s  rate={rate:.3}  deadline_misses={missed}",
            name = p.name,
            shortfall = p.cpu_shortfall(),
            rate = p.proc_rate(),
            missed = p.deadlines_missed(),
        );
    }
    info!(
        "  total shortfall: {:.0} CPU-seconds{}",
        outcome.cpu_shortfall,
        if outcome.missed_deadline {
            "  (some deadline missed — fetch aggressively)"
        } else {
            ""
        }
    );

    // ── EDF admission view of the same queue ──────────────────────────────────
    let edf = match EdfSimulator::new(params.ncpus) {
        Ok(s) => s,
        Err(e) => {
            error!("Cannot build EDF simulator: {e}");
            process::exit(1);
        }
    };

    // The EDF frame is relative to now; every CPU is free at 0.
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

    let edf_outcome = edf.simulate_with_sink(&mut committed, &mut TracingSink);
    info!(
        "EDF packing of {} committed job(s): {} would miss their deadline",
        committed.len(),
        edf_outcome.deadline_misses
    );
    for j in committed.iter().filter(|j| j.misses_deadline) {
        warn!(
            "  [{name}]  completes {done:.0}s, deadline {deadline:.0}s",
            name = j.name,
            done = j.estimated_completion_time,
            deadline = j.computation_deadline,
        );
    }

    // ── Optional what-if probe ────────────────────────────────────────────────
    if let (Some(cpu), Some(deadline)) = (cli.candidate_cpu, cli.candidate_deadline) {
        let candidate = match Job::new("candidate", cpu, deadline) {
            Ok(j) => j,
            Err(e) => {
                error!("Invalid candidate: {e}");
                process::exit(1);
            }
        };
        let accepted = edf.check_candidate(&committed, &candidate);
        info!(
            "Candidate ({cpu:.0}s of work, deadline {deadline:.0}s): {}",
            if accepted { "ACCEPT" } else { "REJECT" }
        );
        if !accepted {
            process::exit(2);
        }
    }
}
