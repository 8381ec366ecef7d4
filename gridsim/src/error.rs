/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

//! Structured error type for the simulation data model.
//!
//! The simulation core itself has no recoverable errors — it is a pure
//! computation over already-validated in-memory values.  Everything that can
//! go wrong is a contract violation by the caller, and it is rejected here,
//! at the construction boundary, never deep inside a simulation loop.
//!
//! Every variant carries the offending value so the caller can log it without
//! further parsing.  **Do not** replace this with `anyhow::Error` in library
//! paths — the structured variants are intentional; `anyhow` belongs at the
//! application boundary (scenario loading, CLI).

use thiserror::Error;

/// A caller-supplied value violated the data-model contract.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Resource shares are relative weights and must be strictly positive.
    #[error("project '{project}' has non-positive resource share {value}")]
    NonPositiveResourceShare { project: String, value: f64 },

    /// A job cannot owe negative CPU time.
    #[error("job '{job}' has negative remaining CPU time {value}")]
    NegativeCpuTime { job: String, value: f64 },

    /// NaN / infinity anywhere in the inputs would silently poison every
    /// comparison in the simulators, so it is rejected up front.
    #[error("{field} must be finite, got {value}")]
    NonFiniteValue { field: &'static str, value: f64 },

    /// A host with no CPUs cannot be simulated.
    #[error("host must have at least one CPU")]
    ZeroCpus,

    /// Fraction of a CPU actually available to this workload.
    #[error("overall_cpu_frac must be in (0, 1], got {value}")]
    CpuFracOutOfRange { value: f64 },

    /// Buffer windows and scheduling periods are durations.
    #[error("{field} must be non-negative, got {value}")]
    NegativeDuration { field: &'static str, value: f64 },
}
