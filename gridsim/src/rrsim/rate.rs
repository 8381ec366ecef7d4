/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

//! Proportional-share rate allocation.
//!
//! Each project with running jobs is entitled to a slice of the host's CPU
//! time proportional to its resource share among the *runnable* projects.
//! A project running fewer parallel jobs than the host has CPUs is scaled
//! up so idle CPUs get used, but a single project can never claim more than
//! one full CPU's worth of rate in this model.
//!
//! The `runnable_share == 0` fallback is a genuine degenerate case inherited
//! from the C++ implementation (a project being rated while no project
//! holds runnable share).  It is kept as an explicit branch rather than an
//! accident of division, and the round-robin simulator reports it through
//! the event sink when taken.

/// Instantaneous CPU processing rate for one project.
///
/// # Arguments
/// * `resource_share` – the project's relative weight (> 0).
/// * `nactive` – number of the project's jobs currently running in the
///   simulation (> 0; idle projects are never rated).
/// * `runnable_share` – sum of resource shares over all currently-runnable
///   projects.
/// * `ncpus` – CPUs on the simulated host.
/// * `overall_cpu_frac` – fraction of a CPU actually available, in (0, 1].
///
/// The result is always within `[0, overall_cpu_frac]`.
pub fn proc_rate(
    resource_share: f64,
    nactive: usize,
    runnable_share: f64,
    ncpus: usize,
    overall_cpu_frac: f64,
) -> f64 {
    debug_assert!(nactive > 0, "proc_rate called for an idle project");

    // Degenerate "no runnable projects" fallback: grant the full rate.
    let mut x = if runnable_share > 0.0 {
        resource_share / runnable_share
    } else {
        1.0
    };

    // Fewer parallel jobs than CPUs: entitled to more than the nominal share
    // so idle CPUs get used.
    if nactive < ncpus {
        x *= ncpus as f64 / nactive as f64;
    }

    // One project never claims more than one full CPU's worth of rate.
    if x > 1.0 {
        x = 1.0;
    }

    x * overall_cpu_frac
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_share_among_equals() {
        // Three equal projects, each saturating its CPUs: a third each.
        let r = proc_rate(100.0, 4, 300.0, 4, 1.0);
        assert!((r - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn scaled_up_when_fewer_jobs_than_cpus() {
        // Share 1/4, but only one job on a 2-CPU host: 1/4 × 2 = 1/2.
        let r = proc_rate(100.0, 1, 400.0, 2, 1.0);
        assert!((r - 0.5).abs() < 1e-12);
    }

    #[test]
    fn clamped_to_one_cpu() {
        // Dominant share on a many-CPU host would exceed 1 after scale-up.
        let r = proc_rate(300.0, 1, 400.0, 8, 1.0);
        assert_eq!(r, 1.0);
    }

    #[test]
    fn scaled_by_available_cpu_fraction() {
        let r = proc_rate(100.0, 1, 100.0, 1, 0.6);
        assert!((r - 0.6).abs() < 1e-12);
    }

    #[test]
    fn degenerate_zero_runnable_share_grants_full_rate() {
        // The documented fallback: x = 1, then the fraction applies.
        let r = proc_rate(100.0, 2, 0.0, 2, 0.8);
        assert!((r - 0.8).abs() < 1e-12);
    }

    #[test]
    fn rate_bounded_by_cpu_fraction() {
        // Property sweep: the result never exceeds overall_cpu_frac.
        for &share in &[1.0, 50.0, 100.0, 1_000.0] {
            for nactive in 1..=8usize {
                for ncpus in 1..=8usize {
                    for &frac in &[0.1, 0.5, 1.0] {
                        let r = proc_rate(share, nactive, 100.0, ncpus, frac);
                        assert!(r >= 0.0, "rate must be non-negative");
                        assert!(
                            r <= frac + 1e-12,
                            "rate {r} exceeds cpu fraction {frac} \
                             (share {share}, nactive {nactive}, ncpus {ncpus})"
                        );
                    }
                }
            }
        }
    }
}
