//! Live execution state and its serializable report form.
//!
//! The `*State` types carry `Instant`s for duration measurement and are
//! converted through `to_report()`/`to_result()` into the serde-friendly
//! structures written to `test-results.json` and consumed by the report
//! generators.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FailureKind;

/// Step execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Passed,
    Failed { error: String, kind: FailureKind },
    Skipped { reason: String },
}

/// State for a single step execution
#[derive(Debug, Clone)]
pub struct StepState {
    pub index: usize,
    pub name: String,
    pub status: StepStatus,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub duration_ms: Option<u64>,
}

impl StepState {
    pub fn new(index: usize, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            status: StepStatus::Pending,
            started_at: None,
            finished_at: None,
            duration_ms: None,
        }
    }

    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn pass(&mut self) {
        self.finish(StepStatus::Passed);
    }

    pub fn fail(&mut self, error: String, kind: FailureKind) {
        self.finish(StepStatus::Failed { error, kind });
    }

    pub fn skip(&mut self, reason: String) {
        self.status = StepStatus::Skipped { reason };
    }

    fn finish(&mut self, status: StepStatus) {
        self.status = status;
        self.finished_at = Some(Instant::now());
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }

    /// Serialize state for reporting (without Instant which isn't serializable)
    pub fn to_result(&self) -> StepResult {
        StepResult {
            index: self.index,
            name: self.name.clone(),
            status: self.status.clone(),
            duration_ms: self.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub index: usize,
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
}

/// Scenario outcome: atomic pass/fail, no partial credit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pending,
    Running,
    Passed,
    Failed,
}

/// State for one scenario execution
#[derive(Debug, Clone)]
pub struct ScenarioState {
    pub name: String,
    pub title: String,
    pub status: ScenarioStatus,
    pub steps: Vec<StepState>,
    pub current_index: usize,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub total_duration_ms: Option<u64>,
    /// Diagnostic reason for the first failing step, if any.
    pub error: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub screenshot_path: Option<String>,
    pub page_source_path: Option<String>,
}

impl ScenarioState {
    pub fn new(name: &str, title: &str, steps: Vec<StepState>) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            status: ScenarioStatus::Pending,
            steps,
            current_index: 0,
            started_at: None,
            finished_at: None,
            total_duration_ms: None,
            error: None,
            failure_kind: None,
            screenshot_path: None,
            page_source_path: None,
        }
    }

    pub fn start(&mut self) {
        self.status = ScenarioStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn current_step(&mut self) -> Option<&mut StepState> {
        self.steps.get_mut(self.current_index)
    }

    pub fn advance(&mut self) -> bool {
        self.current_index += 1;
        self.current_index < self.steps.len()
    }

    /// Record the scenario-level failure reason (first failing step).
    pub fn record_failure(&mut self, error: String, kind: FailureKind) {
        if self.error.is_none() {
            self.error = Some(error);
            self.failure_kind = Some(kind);
        }
    }

    pub fn skip_remaining(&mut self, reason: &str) {
        for step in &mut self.steps[self.current_index..] {
            if matches!(step.status, StepStatus::Pending) {
                step.skip(reason.to_string());
            }
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
        if let Some(start) = self.started_at {
            self.total_duration_ms = Some(start.elapsed().as_millis() as u64);
        }

        let any_failed = self
            .steps
            .iter()
            .any(|s| matches!(s.status, StepStatus::Failed { .. }));
        self.status = if any_failed || self.error.is_some() {
            ScenarioStatus::Failed
        } else {
            ScenarioStatus::Passed
        };
    }

    /// Serialize state for reporting
    pub fn to_result(&self) -> ScenarioResult {
        ScenarioResult {
            name: self.name.clone(),
            title: self.title.clone(),
            status: self.status.clone(),
            steps: self.steps.iter().map(|s| s.to_result()).collect(),
            total_duration_ms: self.total_duration_ms,
            error: self.error.clone(),
            failure_kind: self.failure_kind,
            screenshot_path: self.screenshot_path.clone(),
            page_source_path: self.page_source_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub name: String,
    pub title: String,
    pub status: ScenarioStatus,
    pub steps: Vec<StepResult>,
    pub total_duration_ms: Option<u64>,
    pub error: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub screenshot_path: Option<String>,
    pub page_source_path: Option<String>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }
}

/// Whole-run state
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    pub scenarios: Vec<ScenarioState>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl RunState {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            scenarios: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn add_scenario(&mut self, scenario: ScenarioState) {
        self.scenarios.push(scenario);
    }

    pub fn last_scenario(&self) -> Option<&ScenarioState> {
        self.scenarios.last()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    pub fn summary(&self) -> RunSummary {
        let mut steps_total = 0;
        let mut steps_passed = 0;
        let mut steps_failed = 0;
        let mut steps_skipped = 0;
        for scenario in &self.scenarios {
            for step in &scenario.steps {
                steps_total += 1;
                match step.status {
                    StepStatus::Passed => steps_passed += 1,
                    StepStatus::Failed { .. } => steps_failed += 1,
                    StepStatus::Skipped { .. } => steps_skipped += 1,
                    _ => {}
                }
            }
        }

        let mut passed = 0;
        let mut failures = 0;
        let mut errors = 0;
        for scenario in &self.scenarios {
            match scenario.status {
                ScenarioStatus::Passed => passed += 1,
                ScenarioStatus::Failed => match scenario.failure_kind {
                    Some(kind) if kind.is_assertion() => failures += 1,
                    _ => errors += 1,
                },
                _ => {}
            }
        }

        let total_duration_ms = self.started_at.map(|start| {
            self.finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(start)
                .as_millis() as u64
        });

        RunSummary {
            scenarios: self.scenarios.len() as u32,
            passed,
            failures,
            errors,
            steps_total,
            steps_passed,
            steps_failed,
            steps_skipped,
            total_duration_ms,
            success: self.scenarios.iter().all(|s| s.status == ScenarioStatus::Passed),
        }
    }

    /// Serialize state for reporting
    pub fn to_report(&self) -> RunReport {
        RunReport {
            run_id: self.run_id.clone(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            results: self.scenarios.iter().map(|s| s.to_result()).collect(),
            summary: self.summary(),
        }
    }
}

/// Aggregate counts across the run. The failures/errors split follows the
/// step failure kinds: assertion mismatches are failures, everything else
/// (element not found, timeouts, engine trouble) is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub scenarios: u32,
    pub passed: u32,
    pub failures: u32,
    pub errors: u32,
    pub steps_total: u32,
    pub steps_passed: u32,
    pub steps_failed: u32,
    pub steps_skipped: u32,
    pub total_duration_ms: Option<u64>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub generated_at: String,
    pub results: Vec<ScenarioResult>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.summary.success
    }
}
