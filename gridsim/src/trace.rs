//! Structured simulation event stream.
//!
//! The C++ implementation wrote ad-hoc log lines guarded by a global
//! `rr_simulation` debug flag.  Here the simulators instead emit typed
//! [`SimEvent`]s through an injected [`EventSink`], so the core carries zero
//! ambient state and callers choose what (if anything) happens to the
//! events:
//!
//! * [`NoopSink`] — the production default, discards everything.
//! * [`TracingSink`] — bridges into the `tracing` ecosystem; output is gated
//!   by the subscriber's env-filter exactly like the rest of the binary's
//!   logging.
//! * [`RecordingSink`] — captures events as owned records; used by tests to
//!   assert on the simulators' internal progression (e.g. that the runnable
//!   resource share only ever decreases).

use std::fmt;

use tracing::{debug, info, warn};

// ── Severity ──────────────────────────────────────────────────────────────────

/// Importance of a simulation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warning,
}

// ── Events ────────────────────────────────────────────────────────────────────

/// One significant event inside a simulation run.
///
/// Events carry structured fields rather than pre-formatted text; the
/// [`fmt::Display`] impl renders the conventional log line for sinks that
/// want one.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// The rate allocator assigned a project its instantaneous CPU rate.
    RateComputed {
        project: String,
        proc_rate: f64,
        runnable_share: f64,
    },

    /// Degenerate case: the rate allocator was invoked while the runnable
    /// resource share was zero and fell back to a full rate.
    NoRunnableShare { project: String },

    /// A job finished in the simulation at virtual time `sim_now`.
    JobFinishes {
        project: String,
        job: String,
        sim_now: f64,
    },

    /// A job's simulated completion fell past its computation deadline.
    DeadlineMissed {
        project: Option<String>,
        job: String,
        completes_at: f64,
        computation_deadline: f64,
    },

    /// A CPU shortfall figure was increased.  `project` is `None` for the
    /// host-global shortfall.
    ShortfallUpdated {
        project: Option<String>,
        cpu_shortfall: f64,
    },

    /// A project ran out of work; its share left the runnable pool.
    ProjectDrained {
        project: String,
        runnable_share: f64,
        sim_now: f64,
    },
}

impl SimEvent {
    /// The project this event concerns, if any.
    pub fn project(&self) -> Option<&str> {
        match self {
            SimEvent::RateComputed { project, .. }
            | SimEvent::NoRunnableShare { project }
            | SimEvent::JobFinishes { project, .. }
            | SimEvent::ProjectDrained { project, .. } => Some(project),
            SimEvent::DeadlineMissed { project, .. }
            | SimEvent::ShortfallUpdated { project, .. } => project.as_deref(),
        }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimEvent::RateComputed {
                project,
                proc_rate,
                runnable_share,
            } => write!(
                f,
                "[rr_sim] {project}: proc_rate {proc_rate:.4} (runnable share {runnable_share})"
            ),
            SimEvent::NoRunnableShare { project } => write!(
                f,
                "[rr_sim] {project}: no runnable resource share, assuming full rate"
            ),
            SimEvent::JobFinishes {
                project,
                job,
                sim_now,
            } => write!(f, "[rr_sim] {sim_now:.2}: {job} finishes ({project})"),
            SimEvent::DeadlineMissed {
                job,
                completes_at,
                computation_deadline,
                ..
            } => write!(
                f,
                "[sim] {job} misses deadline: completes {completes_at:.2}, deadline {computation_deadline:.2}"
            ),
            SimEvent::ShortfallUpdated {
                project,
                cpu_shortfall,
            } => match project {
                Some(p) => write!(f, "[rr_sim] {p}: shortfall {cpu_shortfall:.2}"),
                None => write!(f, "[rr_sim] total shortfall {cpu_shortfall:.2}"),
            },
            SimEvent::ProjectDrained {
                project,
                runnable_share,
                sim_now,
            } => write!(
                f,
                "[rr_sim] {sim_now:.2}: {project} out of work (runnable share now {runnable_share})"
            ),
        }
    }
}

// ── Sink trait ────────────────────────────────────────────────────────────────

/// Receiver for simulation events, injected into every simulator call.
pub trait EventSink {
    /// Deliver one event.
    fn message(&mut self, severity: Severity, event: &SimEvent);

    /// Whether events should be constructed at all.  Simulators check this
    /// before building an event, so the no-op sink costs nothing on the hot
    /// path.
    fn enabled(&self) -> bool {
        true
    }
}

/// Discards every event.  The production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn message(&mut self, _severity: Severity, _event: &SimEvent) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Forwards events to the `tracing` ecosystem.
///
/// Severity maps onto `debug!` / `info!` / `warn!`; filtering is the
/// subscriber's job (e.g. `RUST_LOG=gridsim=debug` to see rate events).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn message(&mut self, severity: Severity, event: &SimEvent) {
        match severity {
            Severity::Debug => debug!(project = event.project(), "{event}"),
            Severity::Info => info!(project = event.project(), "{event}"),
            Severity::Warning => warn!(project = event.project(), "{event}"),
        }
    }
}

/// Captures events as owned records, in order of arrival.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub records: Vec<(Severity, SimEvent)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn message(&mut self, severity: Severity, event: &SimEvent) {
        self.records.push((severity, event.clone()));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_reports_disabled() {
        assert!(!NoopSink.enabled());
    }

    #[test]
    fn recording_sink_keeps_arrival_order() {
        let mut sink = RecordingSink::new();
        sink.message(
            Severity::Debug,
            &SimEvent::NoRunnableShare {
                project: "a".into(),
            },
        );
        sink.message(
            Severity::Warning,
            &SimEvent::NoRunnableShare {
                project: "b".into(),
            },
        );
        assert_eq!(sink.records.len(), 2);
        assert_eq!(sink.records[0].0, Severity::Debug);
        assert_eq!(sink.records[1].1.project(), Some("b"));
    }

    #[test]
    fn display_renders_global_shortfall_without_project() {
        let ev = SimEvent::ShortfallUpdated {
            project: None,
            cpu_shortfall: 12.5,
        };
        assert_eq!(ev.project(), None);
        assert!(ev.to_string().contains("total shortfall"));
    }
}
