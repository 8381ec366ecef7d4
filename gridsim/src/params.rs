/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

//! Simulation context and clock/buffer policy.
//!
//! [`SimParams`] bundles the host facts and per-host preferences that both
//! simulators read: CPU count, current time, available CPU fraction, and the
//! work-buffer preferences.  The policy methods are pure conversions from
//! those preferences into the quantities the simulators actually use — the
//! lookahead horizon and the locally-adjusted computation deadline.
//!
//! All validation happens in the constructor and the `with_*` builders; once
//! a `SimParams` exists, every downstream computation is infallible.

use crate::error::ModelError;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Seconds in one day; buffer preferences are expressed in days.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Fixed safety margin subtracted from every report deadline, in seconds.
///
/// Jobs aim to finish at least this far ahead of the deadline the server
/// issued, leaving room for upload and reporting.
pub const DEADLINE_CUSHION: f64 = 600.0;

/// Scale factor applied to a job's remaining slack in the round-robin
/// deadline-miss test.
///
/// Values below 1.0 make the test pessimistic: a job is flagged as missing
/// its deadline even when it would finish with a small margin.  Only the
/// elapsed-slack term is scaled; the buffer and cushion terms already folded
/// into the computation deadline are not.  That asymmetry matches the C++
/// implementation and is preserved deliberately.
pub const CPU_PESSIMISM_FACTOR: f64 = 0.9;

/// Default minimum work buffer when a scenario does not specify one, in days.
pub const DEFAULT_WORK_BUF_MIN_DAYS: f64 = 0.1;

/// Default additional work buffer, in days.
pub const DEFAULT_WORK_BUF_ADDITIONAL_DAYS: f64 = 0.25;

/// Default CPU scheduling period, in minutes.
pub const DEFAULT_CPU_SCHEDULING_PERIOD_MINUTES: f64 = 60.0;

// ── SimParams ─────────────────────────────────────────────────────────────────

/// Global inputs shared by one simulation run.
///
/// Construct with [`SimParams::new`] and refine with the `with_*` methods;
/// every setter re-validates so an invalid context can never reach the
/// simulators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimParams {
    /// Number of CPUs on the simulated host (≥ 1).
    pub ncpus: usize,

    /// Current (virtual) time, in absolute seconds.
    pub now: f64,

    /// Fraction of a CPU actually available to this workload, in (0, 1].
    /// Accounts for host availability and non-grid load.
    pub overall_cpu_frac: f64,

    /// Minimum work buffer the host wants to hold, in days.
    pub work_buf_min_days: f64,

    /// Additional buffer on top of the minimum, in days.
    pub work_buf_additional_days: f64,

    /// Period between CPU scheduler runs on the host, in minutes.
    pub cpu_scheduling_period_minutes: f64,
}

impl SimParams {
    /// Create a context with the default buffer and scheduling-period
    /// preferences.
    ///
    /// # Errors
    /// * [`ModelError::ZeroCpus`] if `ncpus == 0`.
    /// * [`ModelError::CpuFracOutOfRange`] if `overall_cpu_frac` is outside
    ///   `(0, 1]`.
    /// * [`ModelError::NonFiniteValue`] if `now` or `overall_cpu_frac` is
    ///   NaN or infinite.
    pub fn new(ncpus: usize, now: f64, overall_cpu_frac: f64) -> Result<Self, ModelError> {
        if ncpus == 0 {
            return Err(ModelError::ZeroCpus);
        }
        if !now.is_finite() {
            return Err(ModelError::NonFiniteValue {
                field: "now",
                value: now,
            });
        }
        if !overall_cpu_frac.is_finite() {
            return Err(ModelError::NonFiniteValue {
                field: "overall_cpu_frac",
                value: overall_cpu_frac,
            });
        }
        if overall_cpu_frac <= 0.0 || overall_cpu_frac > 1.0 {
            return Err(ModelError::CpuFracOutOfRange {
                value: overall_cpu_frac,
            });
        }
        Ok(Self {
            ncpus,
            now,
            overall_cpu_frac,
            work_buf_min_days: DEFAULT_WORK_BUF_MIN_DAYS,
            work_buf_additional_days: DEFAULT_WORK_BUF_ADDITIONAL_DAYS,
            cpu_scheduling_period_minutes: DEFAULT_CPU_SCHEDULING_PERIOD_MINUTES,
        })
    }

    /// Set the work-buffer preferences, in days.
    ///
    /// # Errors
    /// [`ModelError::NegativeDuration`] / [`ModelError::NonFiniteValue`] if
    /// either value is negative or non-finite.
    pub fn with_buffer(mut self, min_days: f64, additional_days: f64) -> Result<Self, ModelError> {
        check_duration("work_buf_min_days", min_days)?;
        check_duration("work_buf_additional_days", additional_days)?;
        self.work_buf_min_days = min_days;
        self.work_buf_additional_days = additional_days;
        Ok(self)
    }

    /// Set the CPU scheduling period, in minutes.
    ///
    /// # Errors
    /// [`ModelError::NegativeDuration`] / [`ModelError::NonFiniteValue`] if
    /// the value is negative or non-finite.
    pub fn with_scheduling_period(mut self, minutes: f64) -> Result<Self, ModelError> {
        check_duration("cpu_scheduling_period_minutes", minutes)?;
        self.cpu_scheduling_period_minutes = minutes;
        Ok(self)
    }

    // ── Policy ────────────────────────────────────────────────────────────────

    /// Minimum work buffer, in seconds.
    pub fn work_buf_min(&self) -> f64 {
        self.work_buf_min_days * SECONDS_PER_DAY
    }

    /// Total lookahead buffer window, in seconds.
    pub fn work_buf_total(&self) -> f64 {
        (self.work_buf_min_days + self.work_buf_additional_days) * SECONDS_PER_DAY
    }

    /// End of the lookahead window — the simulation horizon, absolute seconds.
    pub fn buf_end(&self) -> f64 {
        self.now + self.work_buf_total()
    }

    /// CPU scheduling period, in seconds.
    pub fn cpu_scheduling_period(&self) -> f64 {
        self.cpu_scheduling_period_minutes * 60.0
    }

    /// Convert a server-issued report deadline into the time by which the
    /// local simulation must have finished the job:
    ///
    /// `report_deadline − (work_buf_min + cpu_scheduling_period + DEADLINE_CUSHION)`
    ///
    /// The subtracted terms leave margin for offline time, competing local
    /// scheduling, and the fixed safety cushion.
    pub fn computation_deadline(&self, report_deadline: f64) -> f64 {
        report_deadline - (self.work_buf_min() + self.cpu_scheduling_period() + DEADLINE_CUSHION)
    }
}

fn check_duration(field: &'static str, value: f64) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::NonFiniteValue { field, value });
    }
    if value < 0.0 {
        return Err(ModelError::NegativeDuration { field, value });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
