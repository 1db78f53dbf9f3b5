//! Suite execution and the run report.
//!
//! Each run builds its own `SuiteReport`; nothing is kept in global state.
//! `run` owns the whole lifecycle: open the session, run every scenario in
//! order through it, then release the driver on every exit path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::driver::{DriverAdapter, DriverResult};
use crate::error::HarnessResult;
use crate::runner::{Outcome, ScenarioResult, ScenarioRunner};
use crate::scenario::Scenario;
use crate::session::{Session, SessionOptions};

/// Aggregate over all scenario results of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub host: String,
    pub duration_ms: u64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    /// `passed / total`, 0 for an empty run
    pub success_rate: f64,
    pub results: Vec<ScenarioResult>,
    /// Fault raised while releasing the driver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_error: Option<String>,
}

impl SuiteReport {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            started_at: Utc::now(),
            host: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            duration_ms: 0,
            total: 0,
            passed: 0,
            failed: 0,
            errored: 0,
            success_rate: 0.0,
            results: Vec::new(),
            teardown_error: None,
        }
    }

    pub fn record(&mut self, result: ScenarioResult) {
        match result.outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Errored => self.errored += 1,
        }
        self.total += 1;
        self.success_rate = self.passed as f64 / self.total as f64;
        self.results.push(result);
    }

    pub fn finish(&mut self, started: Instant) {
        self.duration_ms = started.elapsed().as_millis() as u64;
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0 && self.teardown_error.is_none()
    }

    /// Process exit code: 0 on full success, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| !r.outcome.is_passed())
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "SUITE RESULTS: {}", self.suite);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Scenarios: {}", self.total);
        let _ = writeln!(out, "Passed:    {}", self.passed);
        let _ = writeln!(out, "Failed:    {}", self.failed);
        let _ = writeln!(out, "Errored:   {}", self.errored);
        let _ = writeln!(out, "Success:   {:.1}%", self.success_rate * 100.0);
        let _ = writeln!(out, "Duration:  {:.1}s", self.duration_ms as f64 / 1000.0);

        let failures: Vec<&ScenarioResult> = self.failures().collect();
        if !failures.is_empty() {
            let _ = writeln!(out);
            for result in failures {
                let _ = writeln!(
                    out,
                    "  {} {}: {}",
                    result.outcome,
                    result.name,
                    result.message.as_deref().unwrap_or("no diagnostic")
                );
                if let Some(shot) = &result.screenshot {
                    let _ = writeln!(out, "        screenshot: {}", shot);
                }
            }
        }
        if let Some(err) = &self.teardown_error {
            let _ = writeln!(out, "\nTeardown failed: {}", err);
        }
        let _ = write!(out, "{}", rule);
        out
    }

    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> HarnessResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }
}

/// Progress updates during a suite run
#[derive(Debug, Clone)]
pub enum SuiteProgress {
    Started { total: usize },
    ScenarioStarted { index: usize, total: usize, name: String },
    ScenarioFinished { index: usize, total: usize, result: ScenarioResult },
    Finished,
}

/// Run every scenario in order through one shared session
pub fn run_suite(
    name: &str,
    scenarios: &[Scenario],
    runner: &mut ScenarioRunner,
    session: &mut Session,
) -> SuiteReport {
    run_suite_with_progress(name, scenarios, runner, session, |_| {})
}

/// Run a suite with progress callbacks
pub fn run_suite_with_progress<F>(
    name: &str,
    scenarios: &[Scenario],
    runner: &mut ScenarioRunner,
    session: &mut Session,
    mut on_progress: F,
) -> SuiteReport
where
    F: FnMut(SuiteProgress),
{
    let started = Instant::now();
    let total = scenarios.len();
    let mut report = SuiteReport::new(name);
    on_progress(SuiteProgress::Started { total });

    for (i, scenario) in scenarios.iter().enumerate() {
        let index = i + 1;
        on_progress(SuiteProgress::ScenarioStarted {
            index,
            total,
            name: scenario.name.clone(),
        });
        let result = runner.run(scenario, session);
        on_progress(SuiteProgress::ScenarioFinished {
            index,
            total,
            result: result.clone(),
        });
        report.record(result);
    }

    report.finish(started);
    on_progress(SuiteProgress::Finished);
    report
}

/// Full run: setup, every scenario, guaranteed release.
///
/// Setup failure is the only error returned. A fault while releasing the
/// driver is recorded on the report and makes the run unsuccessful.
pub fn run<A, F>(
    name: &str,
    scenarios: &[Scenario],
    options: SessionOptions,
    acquire: A,
    runner: &mut ScenarioRunner,
    on_progress: F,
) -> HarnessResult<SuiteReport>
where
    A: FnOnce() -> DriverResult<Box<dyn DriverAdapter>>,
    F: FnMut(SuiteProgress),
{
    let started = Instant::now();
    let mut session = Session::new(options);
    session.open(acquire)?;
    tracing::info!(suite = name, scenarios = scenarios.len(), "suite started");

    let mut report = run_suite_with_progress(name, scenarios, runner, &mut session, on_progress);

    if let Err(e) = session.close() {
        tracing::error!(error = %e, "teardown failed");
        report.teardown_error = Some(e.to_string());
    }
    report.finish(started);

    tracing::info!(
        suite = name,
        passed = report.passed,
        failed = report.failed,
        errored = report.errored,
        "suite finished"
    );
    Ok(report)
}
