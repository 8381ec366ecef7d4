/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

//! Round-robin work-fetch simulation.
//!
//! [`RrSimulator`] projects what the host's CPUs will be doing over the
//! lookahead buffer window if the client keeps time-slicing among projects
//! in proportion to their resource shares.  It advances a virtual clock in
//! discrete finish-time events and answers two questions:
//!
//! * how many CPU-seconds of *additional* work are needed to keep every CPU
//!   busy through the window (the global and per-project **CPU shortfall**),
//! * which queued jobs would blow their deadline under proportional-share
//!   scheduling (input to deciding whether earliest-deadline-first mode is
//!   needed).
//!
//! # Design decisions vs the C++ implementation
//!
//! | Topic | C++ | Rust |
//! |---|---|---|
//! | Job graph | global result list + per-project pointer lists into it | each [`Project`] owns its jobs; active/pending are index sets |
//! | Per-run state | mutable fields cleared by hand | reset at INIT; `simulate()` is freely re-callable |
//! | Logging | `printf` guarded by a global `rr_simulation` flag | injected [`EventSink`], no-op by default |
//! | Tie-breaking | iteration order of a pointer vector | first minimum in activation order — deterministic |
//!
//! # Example
//! ```rust,ignore
//! let sim = RrSimulator::new(params);
//! let outcome = sim.simulate(&mut projects);
//! if outcome.missed_deadline {
//!     // fetch more aggressively / switch to EDF mode
//! }
//! ```

pub mod rate;

use crate::params::{SimParams, CPU_PESSIMISM_FACTOR};
use crate::trace::{EventSink, NoopSink, Severity, SimEvent};
use crate::workload::Project;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Host-global results of one round-robin simulation run.
///
/// Per-project figures (`proc_rate`, `cpu_shortfall`, `deadlines_missed`) are
/// left on the [`Project`] values themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RrSimOutcome {
    /// CPU-seconds of additional work needed to keep the whole host busy
    /// through the buffer window.  Always ≥ 0.
    pub cpu_shortfall: f64,

    /// True if any simulated job finished past its pessimism-adjusted
    /// computation deadline.  The work-fetch policy fetches more
    /// aggressively when set.
    pub missed_deadline: bool,
}

// ── RrSimulator ───────────────────────────────────────────────────────────────

/// The round-robin simulator.
///
/// Holds only the immutable simulation context; all per-run state lives on
/// the caller's [`Project`] slice (reset at INIT) or on the stack, so the
/// struct is `Send + Sync` and one instance can be reused for any number of
/// runs.
#[derive(Debug, Clone, Copy)]
pub struct RrSimulator {
    params: SimParams,
}

impl RrSimulator {
    /// Create a simulator for the given context.
    pub fn new(params: SimParams) -> Self {
        Self { params }
    }

    /// The simulation context this simulator runs against.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Run the simulation with events discarded.
    pub fn simulate(&self, projects: &mut [Project]) -> RrSimOutcome {
        self.simulate_with_sink(projects, &mut NoopSink)
    }

    /// Run the simulation, reporting significant events to `sink`.
    ///
    /// The run is a pure projection: it mutates only the per-run derived
    /// state of `projects` (which is reset first), never the caller's job
    /// estimates or deadlines, and leaves nothing behind that could affect
    /// a subsequent invocation.
    pub fn simulate_with_sink(
        &self,
        projects: &mut [Project],
        sink: &mut dyn EventSink,
    ) -> RrSimOutcome {
        let ncpus = self.params.ncpus;
        let ncpus_f = ncpus as f64;
        let frac = self.params.overall_cpu_frac;
        let now = self.params.now;
        let buf_end = self.params.buf_end();
        let work_buf = self.params.work_buf_total();

        // ── INIT ──────────────────────────────────────────────────────────────
        for p in projects.iter_mut() {
            p.reset_sim_state();
        }

        // Resource share over the projects competing for CPU.
        let total_share: f64 = projects
            .iter()
            .filter(|p| !p.non_cpu_intensive)
            .map(Project::resource_share)
            .sum();

        // Global active set: (project index, job index), in activation order.
        let mut active: Vec<(usize, usize)> = Vec::new();

        for (pi, p) in projects.iter_mut().enumerate() {
            if p.non_cpu_intensive {
                continue;
            }
            for ji in 0..p.jobs.len() {
                if !p.jobs[ji].nearly_runnable {
                    continue;
                }
                let cd = self.params.computation_deadline(p.jobs[ji].report_deadline);
                let job = &mut p.jobs[ji];
                job.computation_deadline = cd;
                job.sim_cpu_left = job.cpu_time_remaining();
                if p.active.len() < ncpus {
                    p.active.push(ji);
                    active.push((pi, ji));
                } else {
                    p.pending.push_back(ji);
                }
            }
        }

        // Runnable resource share: projects that placed at least one job.
        // Only ever decreases, and only when a project drains completely.
        let mut runnable_share: f64 = projects
            .iter()
            .filter(|p| !p.active.is_empty())
            .map(Project::resource_share)
            .sum();

        // Projects with nothing queued at all: their entire fair slice of
        // the buffer window is unmet demand.
        for p in projects.iter_mut() {
            if p.non_cpu_intensive || !p.active.is_empty() {
                continue;
            }
            let rsf = if total_share > 0.0 {
                p.resource_share() / total_share
            } else {
                1.0
            };
            p.cpu_shortfall = work_buf * frac * ncpus_f * rsf;
            if sink.enabled() {
                sink.message(
                    Severity::Debug,
                    &SimEvent::ShortfallUpdated {
                        project: Some(p.name.clone()),
                        cpu_shortfall: p.cpu_shortfall,
                    },
                );
            }
        }

        // ── RUNNING ───────────────────────────────────────────────────────────
        let mut sim_now = now;
        let mut cpu_shortfall = 0.0_f64;
        let mut missed_deadline = false;

        while !active.is_empty() {
            // Rates for every project still running jobs.
            for p in projects.iter_mut() {
                if p.non_cpu_intensive || p.active.is_empty() {
                    continue;
                }
                if runnable_share <= 0.0 && sink.enabled() {
                    sink.message(
                        Severity::Warning,
                        &SimEvent::NoRunnableShare {
                            project: p.name.clone(),
                        },
                    );
                }
                p.proc_rate = rate::proc_rate(
                    p.resource_share(),
                    p.active.len(),
                    runnable_share,
                    ncpus,
                    frac,
                );
                if sink.enabled() {
                    sink.message(
                        Severity::Debug,
                        &SimEvent::RateComputed {
                            project: p.name.clone(),
                            proc_rate: p.proc_rate,
                            runnable_share,
                        },
                    );
                }
            }

            // Next event: the active job with the smallest finish delay.
            // First minimum wins, so ties resolve by activation order.
            let mut best: Option<(usize, f64)> = None; // (position in `active`, delay)
            for (pos, &(pi, ji)) in active.iter().enumerate() {
                let p = &projects[pi];
                let delay = p.jobs[ji].sim_cpu_left / p.proc_rate;
                if best.map_or(true, |(_, d)| delay < d) {
                    best = Some((pos, delay));
                }
            }
            let Some((best_pos, best_delay)) = best else {
                break;
            };
            let (bpi, bji) = active[best_pos];

            // Does the finishing job blow its deadline?  The elapsed slack is
            // scaled by the pessimism factor; the buffer/cushion terms already
            // folded into the computation deadline are not.
            let cd = projects[bpi].jobs[bji].computation_deadline;
            if sim_now + best_delay > (cd - now) * CPU_PESSIMISM_FACTOR + now {
                let p = &mut projects[bpi];
                p.jobs[bji].misses_deadline = true;
                p.deadlines_missed += 1;
                missed_deadline = true;
                if sink.enabled() {
                    sink.message(
                        Severity::Info,
                        &SimEvent::DeadlineMissed {
                            project: Some(p.name.clone()),
                            job: p.jobs[bji].name.clone(),
                            completes_at: sim_now + best_delay,
                            computation_deadline: cd,
                        },
                    );
                }
            }

            // Shortfall for the portion of this step inside the window.
            if sim_now < buf_end {
                let end_time = (sim_now + best_delay).min(buf_end);
                let d_time = end_time - sim_now;

                // CPUs with nothing at all to run.
                let nidle = ncpus.saturating_sub(active.len());
                if nidle > 0 {
                    cpu_shortfall += d_time * nidle as f64;
                    if sink.enabled() {
                        sink.message(
                            Severity::Debug,
                            &SimEvent::ShortfallUpdated {
                                project: None,
                                cpu_shortfall,
                            },
                        );
                    }
                }

                // Projects running below their fair CPU share accrue the gap.
                for p in projects.iter_mut() {
                    if p.non_cpu_intensive || p.active.is_empty() {
                        continue;
                    }
                    let rsf = if total_share > 0.0 {
                        p.resource_share() / total_share
                    } else {
                        1.0
                    };
                    let fair_cpus = ncpus_f * rsf;
                    let nact = p.active.len() as f64;
                    if nact < fair_cpus {
                        p.cpu_shortfall += d_time * (fair_cpus - nact);
                        if sink.enabled() {
                            sink.message(
                                Severity::Debug,
                                &SimEvent::ShortfallUpdated {
                                    project: Some(p.name.clone()),
                                    cpu_shortfall: p.cpu_shortfall,
                                },
                            );
                        }
                    }
                }
            }

            // The other active jobs ran concurrently for the elapsed slice.
            for &(pi, ji) in active.iter() {
                if (pi, ji) == (bpi, bji) {
                    continue;
                }
                let step_rate = projects[pi].proc_rate;
                let job = &mut projects[pi].jobs[ji];
                job.sim_cpu_left = (job.sim_cpu_left - step_rate * best_delay).max(0.0);
            }
            sim_now += best_delay;

            if sink.enabled() {
                sink.message(
                    Severity::Debug,
                    &SimEvent::JobFinishes {
                        project: projects[bpi].name.clone(),
                        job: projects[bpi].jobs[bji].name.clone(),
                        sim_now,
                    },
                );
            }

            // Retire the finished job; the project replenishes from its own
            // pending queue or leaves the runnable pool.
            active.remove(best_pos);
            let drained = {
                let p = &mut projects[bpi];
                p.active.retain(|&j| j != bji);
                if let Some(next) = p.pending.pop_front() {
                    p.active.push(next);
                    active.push((bpi, next));
                    false
                } else {
                    p.active.is_empty()
                }
            };

            if drained {
                let p = &mut projects[bpi];
                runnable_share = (runnable_share - p.resource_share()).max(0.0);
                // Whatever remains of the project's fair slice of the window
                // is unmet demand ("tail" contribution).
                if sim_now < buf_end {
                    let rsf = if total_share > 0.0 {
                        p.resource_share() / total_share
                    } else {
                        1.0
                    };
                    p.cpu_shortfall += (buf_end - sim_now) * ncpus_f * rsf;
                }
                if sink.enabled() {
                    sink.message(
                        Severity::Info,
                        &SimEvent::ProjectDrained {
                            project: p.name.clone(),
                            runnable_share,
                            sim_now,
                        },
                    );
                }
            }
        }

        // ── DRAINING_TAIL ─────────────────────────────────────────────────────
        // No work left anywhere: the whole machine idles out the window.
        if sim_now < buf_end {
            cpu_shortfall += (buf_end - sim_now) * ncpus_f;
            if sink.enabled() {
                sink.message(
                    Severity::Debug,
                    &SimEvent::ShortfallUpdated {
                        project: None,
                        cpu_shortfall,
                    },
                );
            }
        }

        RrSimOutcome {
            cpu_shortfall,
            missed_deadline,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::RecordingSink;
    use crate::workload::Job;

    /// A report deadline so distant no sane simulation can miss it.
    const FAR: f64 = 1.0e9;

    fn project(name: &str, share: f64, jobs: &[(&str, f64, f64)]) -> Project {
        let mut p = Project::new(name, share).unwrap();
        for &(n, cpu, rd) in jobs {
            p.push_job(Job::new(n, cpu, rd).unwrap());
        }
        p
    }

    // ── Shortfall accounting ──────────────────────────────────────────────────

    #[test]
    fn conservation_of_buffer_window() {
        // One CPU, fully available, three equal projects with 77 s of total
        // work and a two-day window: the unmet demand is the rest of the
        // window, split evenly.
        let params = SimParams::new(1, 0.0, 1.0)
            .unwrap()
            .with_buffer(1.0, 1.0)
            .unwrap();
        let mut projects = vec![
            project("a", 100.0, &[("a1", 27.0, FAR)]),
            project("b", 100.0, &[("b1", 20.0, FAR)]),
            project("c", 100.0, &[("c1", 30.0, FAR)]),
        ];
        let outcome = RrSimulator::new(params).simulate(&mut projects);

        assert!(
            (outcome.cpu_shortfall - 172_723.0).abs() < 1e-6,
            "global shortfall {} should be 172800 − 77",
            outcome.cpu_shortfall
        );
        for p in &projects {
            assert!(
                (p.cpu_shortfall() - 172_723.0 / 3.0).abs() < 10.0,
                "project {} shortfall {} should be ≈ 57574",
                p.name,
                p.cpu_shortfall()
            );
        }
        assert!(!outcome.missed_deadline);
    }

    #[test]
    fn project_with_nothing_queued_gets_full_share_shortfall() {
        let params = SimParams::new(2, 0.0, 0.5)
            .unwrap()
            .with_buffer(0.5, 0.5)
            .unwrap();
        let mut projects = vec![
            project("busy", 100.0, &[("j", 10.0, FAR)]),
            project("idle", 100.0, &[]),
        ];
        RrSimulator::new(params).simulate(&mut projects);

        // 86400 s window × 0.5 availability × 2 CPUs × half the total share.
        assert!((projects[1].cpu_shortfall() - 43_200.0).abs() < 1e-9);
    }

    #[test]
    fn completely_idle_host_shortfall_is_whole_window() {
        let params = SimParams::new(2, 0.0, 1.0)
            .unwrap()
            .with_buffer(1.0, 0.0)
            .unwrap();
        let mut projects = vec![project("a", 100.0, &[]), project("b", 100.0, &[])];
        let outcome = RrSimulator::new(params).simulate(&mut projects);

        assert_eq!(outcome.cpu_shortfall, 2.0 * 86_400.0);
        for p in &projects {
            assert_eq!(p.cpu_shortfall(), 86_400.0);
        }
    }

    #[test]
    fn shortfalls_never_negative() {
        let params = SimParams::new(2, 0.0, 0.7)
            .unwrap()
            .with_buffer(0.25, 0.25)
            .unwrap();
        let mut projects = vec![
            project("a", 300.0, &[("a1", 5_000.0, 20_000.0), ("a2", 40.0, FAR)]),
            project("b", 50.0, &[("b1", 90_000.0, FAR)]),
            project("c", 100.0, &[]),
        ];
        let outcome = RrSimulator::new(params).simulate(&mut projects);

        assert!(outcome.cpu_shortfall >= 0.0);
        for p in &projects {
            assert!(p.cpu_shortfall() >= 0.0, "project {}", p.name);
        }
    }

    // ── Scheduling mechanics ──────────────────────────────────────────────────

    #[test]
    fn pending_jobs_promoted_until_queue_drains() {
        let params = SimParams::new(1, 0.0, 1.0)
            .unwrap()
            .with_buffer(1.0, 0.0)
            .unwrap();
        let mut projects = vec![project(
            "p",
            100.0,
            &[("j1", 10.0, FAR), ("j2", 10.0, FAR), ("j3", 10.0, FAR)],
        )];
        let outcome = RrSimulator::new(params).simulate(&mut projects);

        // 30 s of work runs back-to-back on the single CPU; the rest of the
        // window is shortfall.
        assert!((outcome.cpu_shortfall - (86_400.0 - 30.0)).abs() < 1e-9);
        assert!(!outcome.missed_deadline);
    }

    #[test]
    fn blocked_jobs_are_not_scheduled() {
        let params = SimParams::new(1, 0.0, 1.0)
            .unwrap()
            .with_buffer(1.0, 0.0)
            .unwrap();
        let mut p = Project::new("p", 100.0).unwrap();
        p.push_job(Job::new("runnable", 10.0, FAR).unwrap());
        let mut blocked = Job::new("blocked", 500.0, FAR).unwrap();
        blocked.nearly_runnable = false;
        p.push_job(blocked);
        let mut projects = vec![p];

        let outcome = RrSimulator::new(params).simulate(&mut projects);

        // Only the runnable 10 s are simulated.
        assert!((outcome.cpu_shortfall - (86_400.0 - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn non_cpu_intensive_projects_are_invisible() {
        let params = SimParams::new(1, 0.0, 1.0)
            .unwrap()
            .with_buffer(1.0, 0.0)
            .unwrap();
        let mut nci = project("nci", 400.0, &[("ignored", 50.0, FAR)]);
        nci.non_cpu_intensive = true;
        let mut projects = vec![nci, project("normal", 100.0, &[("j", 10.0, FAR)])];

        let outcome = RrSimulator::new(params).simulate(&mut projects);

        assert_eq!(projects[0].cpu_shortfall(), 0.0);
        assert_eq!(projects[0].deadlines_missed(), 0);
        assert!(!projects[0].jobs()[0].misses_deadline);
        // The CPU-intensive project is alone in the share pool.
        assert!((outcome.cpu_shortfall - (86_400.0 - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let params = SimParams::new(2, 0.0, 0.9)
            .unwrap()
            .with_buffer(0.5, 0.5)
            .unwrap();
        let mut projects = vec![
            project("a", 100.0, &[("a1", 27.0, FAR), ("a2", 100.0, FAR)]),
            project("b", 200.0, &[("b1", 20.0, 95_000.0)]),
        ];
        let sim = RrSimulator::new(params);

        let first = sim.simulate(&mut projects);
        let first_shortfalls: Vec<f64> = projects.iter().map(Project::cpu_shortfall).collect();
        let second = sim.simulate(&mut projects);
        let second_shortfalls: Vec<f64> = projects.iter().map(Project::cpu_shortfall).collect();

        assert_eq!(first, second);
        assert_eq!(first_shortfalls, second_shortfalls);
    }

    // ── Deadline detection ────────────────────────────────────────────────────

    #[test]
    fn deadline_miss_detected_and_counted() {
        // Zero buffer: computation deadline = 4300 − (3600 + 600) = 100.
        // 150 s of work at full rate completes at 150 > 0.9 × 100.
        let params = SimParams::new(1, 0.0, 1.0)
            .unwrap()
            .with_buffer(0.0, 0.0)
            .unwrap();
        let mut projects = vec![project("p", 100.0, &[("late", 150.0, 4_300.0)])];
        let outcome = RrSimulator::new(params).simulate(&mut projects);

        assert!(outcome.missed_deadline);
        assert_eq!(projects[0].deadlines_missed(), 1);
        assert!(projects[0].jobs()[0].misses_deadline);
    }

    #[test]
    fn miss_caused_by_pessimism_factor_alone() {
        // Completes at 95 — inside the deadline of 100, but past 0.9 × 100.
        let params = SimParams::new(1, 0.0, 1.0)
            .unwrap()
            .with_buffer(0.0, 0.0)
            .unwrap();
        let mut projects = vec![project("p", 100.0, &[("tight", 95.0, 4_300.0)])];
        let outcome = RrSimulator::new(params).simulate(&mut projects);

        assert!(
            outcome.missed_deadline,
            "the pessimism factor shrinks the usable window to 90 s"
        );
    }

    #[test]
    fn no_miss_within_pessimistic_window() {
        // Completes at 85 ≤ 0.9 × 100: on time even pessimistically.
        let params = SimParams::new(1, 0.0, 1.0)
            .unwrap()
            .with_buffer(0.0, 0.0)
            .unwrap();
        let mut projects = vec![project("p", 100.0, &[("ok", 85.0, 4_300.0)])];
        let outcome = RrSimulator::new(params).simulate(&mut projects);

        assert!(!outcome.missed_deadline);
        assert_eq!(projects[0].deadlines_missed(), 0);
    }

    #[test]
    fn far_deadlines_produce_no_misses() {
        let params = SimParams::new(2, 0.0, 1.0)
            .unwrap()
            .with_buffer(0.5, 0.5)
            .unwrap();
        let mut projects = vec![
            project("a", 100.0, &[("a1", 1_000.0, FAR), ("a2", 2_000.0, FAR)]),
            project("b", 300.0, &[("b1", 500.0, FAR)]),
        ];
        let outcome = RrSimulator::new(params).simulate(&mut projects);

        assert!(!outcome.missed_deadline);
        for p in &projects {
            assert_eq!(p.deadlines_missed(), 0);
            for job in p.jobs() {
                assert!(!job.misses_deadline);
            }
        }
    }

    // ── Invariants ────────────────────────────────────────────────────────────

    #[test]
    fn proc_rate_bounded_by_cpu_fraction() {
        let frac = 0.8;
        let params = SimParams::new(2, 0.0, frac)
            .unwrap()
            .with_buffer(0.5, 0.0)
            .unwrap();
        let mut projects = vec![
            project("a", 100.0, &[("a1", 30.0, FAR)]),
            project("b", 10.0, &[("b1", 300.0, FAR), ("b2", 40.0, FAR)]),
            project("c", 500.0, &[("c1", 60.0, FAR)]),
        ];
        RrSimulator::new(params).simulate(&mut projects);

        for p in &projects {
            assert!(p.proc_rate() >= 0.0);
            assert!(
                p.proc_rate() <= frac + 1e-12,
                "project {} rate {} exceeds {}",
                p.name,
                p.proc_rate(),
                frac
            );
        }
    }

    #[test]
    fn runnable_share_only_decreases() {
        let params = SimParams::new(1, 0.0, 1.0)
            .unwrap()
            .with_buffer(1.0, 1.0)
            .unwrap();
        let mut projects = vec![
            project("a", 100.0, &[("a1", 27.0, FAR)]),
            project("b", 50.0, &[("b1", 20.0, FAR)]),
            project("c", 150.0, &[("c1", 30.0, FAR)]),
        ];
        let mut sink = RecordingSink::new();
        RrSimulator::new(params).simulate_with_sink(&mut projects, &mut sink);

        let mut last = f64::INFINITY;
        let mut drains = 0;
        for (_, event) in &sink.records {
            if let SimEvent::ProjectDrained { runnable_share, .. } = event {
                assert!(
                    *runnable_share <= last,
                    "runnable share went up: {last} → {runnable_share}"
                );
                last = *runnable_share;
                drains += 1;
            }
        }
        assert_eq!(drains, 3, "every project drains in this scenario");
        assert_eq!(last, 0.0);
    }

    #[test]
    fn events_reported_in_simulation_order() {
        let params = SimParams::new(1, 0.0, 1.0)
            .unwrap()
            .with_buffer(0.5, 0.0)
            .unwrap();
        let mut projects = vec![project("p", 100.0, &[("j1", 10.0, FAR), ("j2", 5.0, FAR)])];
        let mut sink = RecordingSink::new();
        RrSimulator::new(params).simulate_with_sink(&mut projects, &mut sink);

        let finishes: Vec<f64> = sink
            .records
            .iter()
            .filter_map(|(_, e)| match e {
                SimEvent::JobFinishes { sim_now, .. } => Some(*sim_now),
                _ => None,
            })
            .collect();
        assert_eq!(finishes.len(), 2);
        assert!(finishes[0] <= finishes[1], "virtual time is non-decreasing");
    }
}
