//! Scenario loading.
//!
//! A scenario file captures everything one simulation run needs: the host
//! facts, the work-buffer preferences, and the per-project job queues.  The
//! full client assembles the same state from its runtime structures; the CLI
//! and the manual test tools read it from YAML instead.
//!
//! The expected YAML structure is:
//! ```yaml
//! host:
//!   ncpus: 4
//!   overall_cpu_frac: 0.9
//!   now: 0.0
//! preferences:
//!   work_buf_min_days: 0.5
//!   work_buf_additional_days: 0.5
//!   cpu_scheduling_period_minutes: 60
//! projects:
//!   - name: aurora
//!     resource_share: 200
//!     jobs:
//!       - name: batch_17_unit_3
//!         cpu_time_remaining: 11200
//!         report_deadline: 259200
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::params::{
    SimParams, DEFAULT_CPU_SCHEDULING_PERIOD_MINUTES, DEFAULT_WORK_BUF_ADDITIONAL_DAYS,
    DEFAULT_WORK_BUF_MIN_DAYS,
};
use crate::workload::{Job, Project};

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// Kept private – callers work with [`Scenario`] instead.
#[derive(Debug, Deserialize)]
struct ScenarioFile {
    host: HostEntry,
    #[serde(default)]
    preferences: PrefsEntry,
    #[serde(default)]
    projects: Vec<ProjectEntry>,
}

#[derive(Debug, Deserialize)]
struct HostEntry {
    ncpus: usize,
    /// Defaults to a fully-available host when absent.
    #[serde(default = "default_cpu_frac")]
    overall_cpu_frac: f64,
    #[serde(default)]
    now: f64,
}

/// Buffer preferences as they appear in the file.  Every field is optional
/// so partial scenarios are accepted gracefully.
#[derive(Debug, Deserialize)]
struct PrefsEntry {
    #[serde(default = "default_buf_min")]
    work_buf_min_days: f64,
    #[serde(default = "default_buf_additional")]
    work_buf_additional_days: f64,
    #[serde(default = "default_sched_period")]
    cpu_scheduling_period_minutes: f64,
}

#[derive(Debug, Deserialize)]
struct ProjectEntry {
    name: String,
    #[serde(default = "default_resource_share")]
    resource_share: f64,
    #[serde(default)]
    non_cpu_intensive: bool,
    #[serde(default)]
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
struct JobEntry {
    name: String,
    cpu_time_remaining: f64,
    report_deadline: f64,
    #[serde(default = "default_true")]
    nearly_runnable: bool,
}

fn default_cpu_frac() -> f64 {
    1.0
}

fn default_buf_min() -> f64 {
    DEFAULT_WORK_BUF_MIN_DAYS
}

fn default_buf_additional() -> f64 {
    DEFAULT_WORK_BUF_ADDITIONAL_DAYS
}

fn default_sched_period() -> f64 {
    DEFAULT_CPU_SCHEDULING_PERIOD_MINUTES
}

fn default_resource_share() -> f64 {
    100.0
}

fn default_true() -> bool {
    true
}

impl Default for PrefsEntry {
    fn default() -> Self {
        Self {
            work_buf_min_days: default_buf_min(),
            work_buf_additional_days: default_buf_additional(),
            cpu_scheduling_period_minutes: default_sched_period(),
        }
    }
}

// ── Scenario ──────────────────────────────────────────────────────────────────

/// A fully-validated simulation scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub params: SimParams,
    pub projects: Vec<Project>,
}

impl Scenario {
    /// Parse and validate a scenario from `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is
    /// structurally invalid, or any value violates the data-model contract
    /// (negative CPU time, non-positive resource share, …).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading scenario from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open scenario file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to load scenario file: {}", path.display()))
    }

    /// Parse and validate a scenario from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ScenarioFile =
            serde_yaml::from_str(content).context("Failed to parse scenario YAML")?;

        let params = SimParams::new(file.host.ncpus, file.host.now, file.host.overall_cpu_frac)?
            .with_buffer(
                file.preferences.work_buf_min_days,
                file.preferences.work_buf_additional_days,
            )?
            .with_scheduling_period(file.preferences.cpu_scheduling_period_minutes)?;

        let mut projects = Vec::with_capacity(file.projects.len());
        for entry in file.projects {
            let mut project = Project::new(entry.name, entry.resource_share)?;
            project.non_cpu_intensive = entry.non_cpu_intensive;
            for je in entry.jobs {
                let mut job = Job::new(je.name, je.cpu_time_remaining, je.report_deadline)?;
                job.nearly_runnable = je.nearly_runnable;
                project.push_job(job);
            }
            debug!(
                project = %project.name,
                resource_share = project.resource_share(),
                jobs = project.jobs().len(),
                non_cpu_intensive = project.non_cpu_intensive,
                "scenario project"
            );
            projects.push(project);
        }

        info!(
            ncpus = params.ncpus,
            projects = projects.len(),
            total_jobs = projects.iter().map(|p| p.jobs().len()).sum::<usize>(),
            "Scenario loaded"
        );

        Ok(Scenario { params, projects })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_full_scenario() {
        let yaml = r#"
host:
  ncpus: 4
  overall_cpu_frac: 0.9
  now: 1000.0
preferences:
  work_buf_min_days: 0.5
  work_buf_additional_days: 0.5
  cpu_scheduling_period_minutes: 30
projects:
  - name: aurora
    resource_share: 200
    jobs:
      - name: batch_17_unit_3
        cpu_time_remaining: 11200
        report_deadline: 259200
      - name: batch_17_unit_4
        cpu_time_remaining: 9000
        report_deadline: 259200
        nearly_runnable: false
  - name: helix
    resource_share: 50
    non_cpu_intensive: true
"#;
        let f = yaml_tempfile(yaml);
        let scenario = Scenario::load_from_file(f.path()).unwrap();

        assert_eq!(scenario.params.ncpus, 4);
        assert_eq!(scenario.params.overall_cpu_frac, 0.9);
        assert_eq!(scenario.params.now, 1000.0);
        assert_eq!(scenario.params.cpu_scheduling_period_minutes, 30.0);

        assert_eq!(scenario.projects.len(), 2);
        let aurora = &scenario.projects[0];
        assert_eq!(aurora.resource_share(), 200.0);
        assert_eq!(aurora.jobs().len(), 2);
        assert!(aurora.jobs()[0].nearly_runnable);
        assert!(!aurora.jobs()[1].nearly_runnable);

        let helix = &scenario.projects[1];
        assert!(helix.non_cpu_intensive);
        assert!(helix.jobs().is_empty());
    }

    #[test]
    fn optional_sections_use_defaults() {
        let yaml = r#"
host:
  ncpus: 2
"#;
        let scenario = Scenario::from_yaml_str(yaml).unwrap();

        assert_eq!(scenario.params.overall_cpu_frac, 1.0);
        assert_eq!(scenario.params.now, 0.0);
        assert_eq!(
            scenario.params.work_buf_min_days,
            DEFAULT_WORK_BUF_MIN_DAYS
        );
        assert_eq!(
            scenario.params.work_buf_additional_days,
            DEFAULT_WORK_BUF_ADDITIONAL_DAYS
        );
        assert!(scenario.projects.is_empty());
    }

    #[test]
    fn default_resource_share_applied() {
        let yaml = r#"
host:
  ncpus: 1
projects:
  - name: plain
"#;
        let scenario = Scenario::from_yaml_str(yaml).unwrap();
        assert_eq!(scenario.projects[0].resource_share(), 100.0);
    }

    #[test]
    fn model_violations_surface_as_errors() {
        // Negative CPU time must be rejected at the loading boundary,
        // not deep inside a simulation loop.
        let yaml = r#"
host:
  ncpus: 1
projects:
  - name: broken
    jobs:
      - name: bad
        cpu_time_remaining: -5.0
        report_deadline: 100.0
"#;
        let err = Scenario::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("negative remaining CPU time"));
    }

    #[test]
    fn zero_cpu_host_rejected() {
        let yaml = "host:\n  ncpus: 0\n";
        assert!(Scenario::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = Scenario::load_from_file(Path::new("/nonexistent/path/scenario.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(Scenario::load_from_file(f.path()).is_err());
    }
}
