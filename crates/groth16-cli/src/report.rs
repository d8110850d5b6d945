//! Per-circuit run records and the batch report.

use crate::metrics::Metrics;
use crate::PipelineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Outcome of one circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Proof created (and verified when enabled)
    Success,
    /// A stage failed
    Failed,
    /// The circuit was not attempted
    Skipped,
}

/// Timing of one pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Stage name
    pub stage: String,
    /// Resources the stage used
    pub metrics: Metrics,
}

/// Record of one circuit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    /// Circuit name
    pub circuit: String,
    /// Outcome
    pub status: RunStatus,
    /// Skip reason or error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Error category of a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Curve the circuit targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
    /// Number of constraints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<usize>,
    /// Number of signals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<usize>,
    /// Totals over every stage that ran
    pub metrics: Metrics,
    /// Per-stage breakdown
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageTiming>,
}

impl BenchmarkRun {
    fn empty(circuit: &str, status: RunStatus) -> Self {
        Self {
            circuit: circuit.to_string(),
            status,
            reason: None,
            category: None,
            curve: None,
            constraints: None,
            signals: None,
            metrics: Metrics::default(),
            stages: Vec::new(),
        }
    }

    /// A run that was never attempted
    pub fn skipped(circuit: &str, reason: impl Into<String>) -> Self {
        let mut run = Self::empty(circuit, RunStatus::Skipped);
        run.reason = Some(reason.into());
        run
    }

    /// A run in progress; finish with [`BenchmarkRun::succeed`] or [`BenchmarkRun::fail`]
    pub fn started(circuit: &str) -> Self {
        Self::empty(circuit, RunStatus::Failed)
    }

    /// Append a stage and fold it into the totals
    pub fn record_stage(&mut self, stage: &str, metrics: Metrics) {
        self.metrics = self.metrics.combine(&metrics);
        self.stages.push(StageTiming {
            stage: stage.to_string(),
            metrics,
        });
    }

    /// Mark the run successful
    pub fn succeed(&mut self) {
        self.status = RunStatus::Success;
        self.reason = None;
        self.category = None;
    }

    /// Mark the run failed with `err`
    pub fn fail(&mut self, err: &PipelineError) {
        self.status = RunStatus::Failed;
        self.reason = Some(err.to_string());
        self.category = Some(err.category().to_string());
    }

    /// Metrics of a named stage
    pub fn stage(&self, name: &str) -> Option<&Metrics> {
        self.stages.iter().find(|s| s.stage == name).map(|s| &s.metrics)
    }
}

/// All runs of one batch, written once at the end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Worker threads used for proving
    pub threads: usize,
    /// Runs in discovery order
    pub runs: Vec<BenchmarkRun>,
}

impl BenchmarkReport {
    /// Empty report for a pool of `threads` workers
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            runs: Vec::new(),
        }
    }

    /// Add a run
    pub fn push(&mut self, run: BenchmarkRun) {
        self.runs.push(run);
    }

    /// Runs with the given status
    pub fn count(&self, status: RunStatus) -> usize {
        self.runs.iter().filter(|r| r.status == status).count()
    }

    /// Run for a circuit
    pub fn run(&self, circuit: &str) -> Option<&BenchmarkRun> {
        self.runs.iter().find(|r| r.circuit == circuit)
    }

    /// Pretty JSON
    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report, creating parent directories
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| PipelineError::io(parent, err))?;
        }
        fs::write(path, self.to_json()?).map_err(|err| PipelineError::io(path, err))
    }

    /// Read a report written by [`BenchmarkReport::write`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| PipelineError::io(path, err))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groth16_witness::WitnessError;

    fn metrics(wall: f64) -> Metrics {
        Metrics {
            wall_seconds: wall,
            cpu_seconds: wall,
            cpu_percent: 100.0,
            peak_rss_kb: 1024,
        }
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = BenchmarkRun::started("cubic");
        run.record_stage("load", metrics(0.5));
        run.record_stage("prove", metrics(1.5));
        assert_eq!(run.metrics.wall_seconds, 2.0);
        assert_eq!(run.stage("prove").map(|m| m.wall_seconds), Some(1.5));

        run.fail(&PipelineError::Witness(WitnessError::UnassignedInputSignal("x".into())));
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.category.as_deref(), Some("malformed-input"));

        run.succeed();
        assert_eq!(run.status, RunStatus::Success);
        assert!(run.reason.is_none());
    }

    #[test]
    fn test_report_file() {
        let mut report = BenchmarkReport::new(4);
        let mut run = BenchmarkRun::started("AND_gate");
        run.record_stage("prove", metrics(0.25));
        run.succeed();
        report.push(run);
        report.push(BenchmarkRun::skipped("sha256", "placeholder input"));

        assert_eq!(report.count(RunStatus::Success), 1);
        assert_eq!(report.count(RunStatus::Skipped), 1);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"status\": \"skipped\""));
        assert!(json.contains("\"wall_seconds\": 0.25"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");
        report.write(&path).unwrap();
        assert_eq!(BenchmarkReport::load(&path).unwrap(), report);
    }
}
