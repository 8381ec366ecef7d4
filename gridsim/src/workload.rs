/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

//! Core data model for the simulation engine.
//!
//! Two types model the two sides of the workload:
//!
//! ```text
//! host state ──► Project ──(owns)──► Job ──(simulators)──► shortfall / miss flags
//!                  ↑ identity + share     ↑ one unit of work ("result")
//! ```
//!
//! # Ownership model
//! A [`Project`] **owns** its jobs as a plain `Vec<Job>`.  The simulation
//! collections (`active`, `pending`) are index sets into that vector, so a
//! job is only ever reachable through its owning project — there is no
//! global job list, no back-pointers, and nothing to alias.  During a
//! round-robin run a job moves between the pending queue and the active set
//! of the *same* project, never across projects.
//!
//! Inputs that the caller supplies (`resource_share`, `cpu_time_remaining`)
//! are validated in the constructors and kept private behind getters;
//! per-run outputs (`proc_rate`, `cpu_shortfall`, miss flags) are readable
//! through getters and reset at the start of every simulation invocation.

use std::collections::VecDeque;

use crate::error::ModelError;

// ── Job ───────────────────────────────────────────────────────────────────────

/// One unit of work (a "result" in grid terminology).
///
/// Belongs to exactly one project on the client side; on the server side the
/// EDF simulator works with free-standing `Job` values representing the jobs
/// already committed to a host.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Job name, unique within its project.
    pub name: String,

    /// Caller-supplied estimate of remaining CPU time, in seconds (≥ 0).
    cpu_time_remaining: f64,

    /// Server-issued report deadline, absolute seconds.
    pub report_deadline: f64,

    /// Locally-adjusted deadline the simulators work against.
    ///
    /// Initialised to `report_deadline`; the round-robin simulator refreshes
    /// it from [`SimParams::computation_deadline`] at the start of every run.
    /// EDF callers operating in a relative time frame set it directly.
    ///
    /// [`SimParams::computation_deadline`]: crate::params::SimParams::computation_deadline
    pub computation_deadline: f64,

    /// Set when the job's simulated completion falls past its computation
    /// deadline.  Recomputed on every run.
    pub misses_deadline: bool,

    /// Simulated completion time, written by the EDF simulator.
    pub estimated_completion_time: f64,

    /// Snapshot of the external "nearly runnable" predicate.  Jobs blocked
    /// on missing inputs are invisible to the round-robin simulator.
    pub nearly_runnable: bool,

    /// Working copy of the remaining CPU time, consumed during a round-robin
    /// run so repeated runs never corrupt the caller's estimate.
    pub(crate) sim_cpu_left: f64,
}

impl Job {
    /// Create a job.
    ///
    /// # Errors
    /// * [`ModelError::NegativeCpuTime`] if `cpu_time_remaining < 0`.
    /// * [`ModelError::NonFiniteValue`] if either numeric input is NaN or
    ///   infinite.
    pub fn new(
        name: impl Into<String>,
        cpu_time_remaining: f64,
        report_deadline: f64,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if !cpu_time_remaining.is_finite() {
            return Err(ModelError::NonFiniteValue {
                field: "cpu_time_remaining",
                value: cpu_time_remaining,
            });
        }
        if !report_deadline.is_finite() {
            return Err(ModelError::NonFiniteValue {
                field: "report_deadline",
                value: report_deadline,
            });
        }
        if cpu_time_remaining < 0.0 {
            return Err(ModelError::NegativeCpuTime {
                job: name,
                value: cpu_time_remaining,
            });
        }
        Ok(Self {
            name,
            cpu_time_remaining,
            report_deadline,
            computation_deadline: report_deadline,
            misses_deadline: false,
            estimated_completion_time: 0.0,
            nearly_runnable: true,
            sim_cpu_left: 0.0,
        })
    }

    /// Estimated remaining CPU time, in seconds.
    pub fn cpu_time_remaining(&self) -> f64 {
        self.cpu_time_remaining
    }
}

// ── Project ───────────────────────────────────────────────────────────────────

/// A project competing for CPU time on the simulated host.
///
/// # Lifecycle
/// Created once per simulation run from the host's project list.  The derived
/// fields (`proc_rate`, `cpu_shortfall`, `deadlines_missed` and the
/// active/pending index sets) are reset and recomputed on every simulation
/// invocation; nothing persists between runs.
#[derive(Debug, Clone)]
pub struct Project {
    /// Project name (its master URL in the full client; opaque here).
    pub name: String,

    /// Relative weight for proportional CPU allocation (> 0).
    resource_share: f64,

    /// Projects flagged non-CPU-intensive take no CPU share and are ignored
    /// by the round-robin simulation.
    pub non_cpu_intensive: bool,

    /// All jobs owned by this project.
    pub(crate) jobs: Vec<Job>,

    /// Indices into `jobs` currently "running" in the simulation.
    /// Never holds more than the host's CPU count.
    pub(crate) active: Vec<usize>,

    /// Indices into `jobs` queued behind the active set.
    pub(crate) pending: VecDeque<usize>,

    /// Instantaneous CPU processing rate, in [0, overall_cpu_frac].
    pub(crate) proc_rate: f64,

    /// Unmet CPU demand within the lookahead window, in CPU-seconds.
    pub(crate) cpu_shortfall: f64,

    /// Number of this project's jobs that missed their deadline in the last
    /// round-robin run.
    pub(crate) deadlines_missed: u32,
}

impl Project {
    /// Create a project with no jobs.
    ///
    /// # Errors
    /// * [`ModelError::NonPositiveResourceShare`] if `resource_share ≤ 0`.
    /// * [`ModelError::NonFiniteValue`] if `resource_share` is NaN/infinite.
    pub fn new(name: impl Into<String>, resource_share: f64) -> Result<Self, ModelError> {
        let name = name.into();
        if !resource_share.is_finite() {
            return Err(ModelError::NonFiniteValue {
                field: "resource_share",
                value: resource_share,
            });
        }
        if resource_share <= 0.0 {
            return Err(ModelError::NonPositiveResourceShare {
                project: name,
                value: resource_share,
            });
        }
        Ok(Self {
            name,
            resource_share,
            non_cpu_intensive: false,
            jobs: Vec::new(),
            active: Vec::new(),
            pending: VecDeque::new(),
            proc_rate: 0.0,
            cpu_shortfall: 0.0,
            deadlines_missed: 0,
        })
    }

    /// Add a job to this project's queue.
    pub fn push_job(&mut self, job: Job) {
        self.jobs.push(job);
    }

    /// Relative weight for proportional CPU allocation.
    pub fn resource_share(&self) -> f64 {
        self.resource_share
    }

    /// All jobs owned by this project.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Instantaneous CPU processing rate from the last simulation run.
    pub fn proc_rate(&self) -> f64 {
        self.proc_rate
    }

    /// Unmet CPU demand within the lookahead window, in CPU-seconds, from
    /// the last simulation run.  The client's work-fetch policy reads this
    /// to size its next work request.
    pub fn cpu_shortfall(&self) -> f64 {
        self.cpu_shortfall
    }

    /// Deadline misses detected in the last round-robin run.
    pub fn deadlines_missed(&self) -> u32 {
        self.deadlines_missed
    }

    /// Reset all per-run derived state ahead of a simulation invocation.
    pub(crate) fn reset_sim_state(&mut self) {
        self.active.clear();
        self.pending.clear();
        self.proc_rate = 0.0;
        self.cpu_shortfall = 0.0;
        self.deadlines_missed = 0;
        for job in &mut self.jobs {
            job.misses_deadline = false;
            job.estimated_completion_time = 0.0;
            job.sim_cpu_left = 0.0;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
