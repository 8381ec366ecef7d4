/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

//! Earliest-deadline-first admission simulation.
//!
//! The dispatch server keeps, per host, the set of jobs already committed to
//! it.  Before assigning one more job it asks: *if the host ran everything
//! in deadline order, would this push anyone past their deadline?*
//!
//! [`EdfSimulator::simulate`] answers the first half: it packs the job set
//! onto `ncpus` CPUs greedily in ascending deadline order and flags every
//! job whose simulated completion exceeds its computation deadline.  This is
//! a greedy list-scheduling approximation of EDF, not optimal preemptive
//! EDF — a deliberate simplification to keep per-request simulation cheap.
//!
//! [`EdfSimulator::check_candidate`] answers the second half by re-running
//! the simulation on a deep copy of the committed set with the candidate
//! appended.  The committed set itself is **never** mutated, so the server
//! can probe any number of candidates against the same snapshot.
//!
//! Times here are relative to the start of the simulation (every CPU is
//! free at 0); callers convert absolute deadlines into the same frame.

use std::cmp::Ordering;

use crate::error::ModelError;
use crate::trace::{EventSink, NoopSink, Severity, SimEvent};
use crate::workload::Job;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Summary of one EDF simulation pass.
///
/// Per-job results (`misses_deadline`, `estimated_completion_time`) are
/// written onto the jobs themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdfOutcome {
    /// Number of jobs whose simulated completion exceeds their deadline.
    pub deadline_misses: usize,
}

// ── EdfSimulator ──────────────────────────────────────────────────────────────

/// Greedy EDF packing simulator for a fixed number of CPUs.
#[derive(Debug, Clone, Copy)]
pub struct EdfSimulator {
    ncpus: usize,
}

impl EdfSimulator {
    /// Create a simulator for a host with `ncpus` CPUs.
    ///
    /// # Errors
    /// [`ModelError::ZeroCpus`] if `ncpus == 0`.
    pub fn new(ncpus: usize) -> Result<Self, ModelError> {
        if ncpus == 0 {
            return Err(ModelError::ZeroCpus);
        }
        Ok(Self { ncpus })
    }

    /// Number of CPUs being simulated.
    pub fn ncpus(&self) -> usize {
        self.ncpus
    }

    /// Run the simulation with events discarded.
    pub fn simulate(&self, jobs: &mut [Job]) -> EdfOutcome {
        self.simulate_with_sink(jobs, &mut NoopSink)
    }

    /// Simulate EDF execution of `jobs`, writing `misses_deadline` and
    /// `estimated_completion_time` onto every job.
    ///
    /// Jobs are visited in ascending `computation_deadline` order; equal
    /// deadlines keep their slice order (stable sort over an index
    /// permutation — the slice itself is never reordered, so positions stay
    /// meaningful to the caller).  Each job goes to whichever CPU frees up
    /// earliest, ties to the lowest CPU index.
    pub fn simulate_with_sink(&self, jobs: &mut [Job], sink: &mut dyn EventSink) -> EdfOutcome {
        let mut order: Vec<usize> = (0..jobs.len()).collect();
        order.sort_by(|&a, &b| {
            jobs[a]
                .computation_deadline
                .partial_cmp(&jobs[b].computation_deadline)
                .unwrap_or(Ordering::Equal)
        });

        let mut cpu_free = vec![0.0_f64; self.ncpus];
        let mut deadline_misses = 0;

        for &i in &order {
            let slot = earliest_free_cpu(&cpu_free);
            let completion = cpu_free[slot] + jobs[i].cpu_time_remaining();
            cpu_free[slot] = completion;

            let job = &mut jobs[i];
            job.estimated_completion_time = completion;
            job.misses_deadline = completion > job.computation_deadline;
            if job.misses_deadline {
                deadline_misses += 1;
                if sink.enabled() {
                    sink.message(
                        Severity::Info,
                        &SimEvent::DeadlineMissed {
                            project: None,
                            job: job.name.clone(),
                            completes_at: completion,
                            computation_deadline: job.computation_deadline,
                        },
                    );
                }
            }
        }

        EdfOutcome { deadline_misses }
    }

    /// Would committing `candidate` to this host harm any already-committed
    /// job?
    ///
    /// The check appends the candidate to a deep copy of `committed` and
    /// re-simulates the copy.  It rejects (`false`) if:
    /// * any job that previously did **not** miss its deadline now does, or
    /// * any job that previously missed its deadline would now complete even
    ///   later than its previous estimate.
    ///
    /// Otherwise it accepts (`true`).  `committed` must carry the flags of a
    /// prior [`simulate`](Self::simulate) pass; it is never mutated, so the
    /// caller can probe repeatedly against the same snapshot.
    pub fn check_candidate(&self, committed: &[Job], candidate: &Job) -> bool {
        let mut probe: Vec<Job> = committed.to_vec();
        probe.push(candidate.clone());
        self.simulate(&mut probe);

        for (before, after) in committed.iter().zip(probe.iter()) {
            if !before.misses_deadline && after.misses_deadline {
                return false;
            }
            if before.misses_deadline
                && after.estimated_completion_time > before.estimated_completion_time
            {
                return false;
            }
        }
        true
    }
}

/// Index of the CPU that frees up earliest.
///
/// `min_by` keeps the first of equal elements, so ties go to the lowest CPU
/// index.
fn earliest_free_cpu(cpu_free: &[f64]) -> usize {
    cpu_free
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
