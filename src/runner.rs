//! Scenario execution and result types.
//!
//! Steps run strictly in order. A failing `abort_scenario` step ends the
//! scenario and its error picks the outcome; a failing
//! `record_and_continue` step only becomes an indicator. Failed and errored
//! scenarios get a best-effort screenshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::artifact::{ArtifactStore, DiscardStore};
use crate::auth::{AuthFlow, Credentials};
use crate::driver::{ElementAction, WindowSize};
use crate::error::{HarnessError, HarnessResult};
use crate::locator::{self, LocatorSpec};
use crate::scenario::{Check, Scenario, Step, StepKind, TemplateVars};
use crate::session::Session;
use crate::verify::{self, Indicator, Verdict};
use crate::wait;

/// Final state of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Errored,
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        *self == Outcome::Passed
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Passed => "PASS",
            Outcome::Failed => "FAIL",
            Outcome::Errored => "ERROR",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    /// Failed under `record_and_continue`
    SoftFailed,
    Failed,
    /// Never ran because an earlier step aborted the scenario
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub label: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub elapsed_ms: u64,
}

/// Result of one scenario execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: Outcome,
    /// Diagnostic for failed and errored scenarios
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Scored by the verifier; only steps contribute
    pub indicators: Vec<Indicator>,
    /// Login signals observed while establishing the precondition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub precondition: Vec<Indicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    pub steps: Vec<StepRecord>,
    pub elapsed_ms: u64,
    /// Reference returned by the artifact store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl ScenarioResult {
    pub fn step(&self, label: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.label == label)
    }
}

/// Runs scenarios against a session
pub struct ScenarioRunner {
    auth: AuthFlow,
    credentials: Credentials,
    vars: TemplateVars,
    artifacts: Box<dyn ArtifactStore>,
    capture_failures: bool,
}

impl ScenarioRunner {
    pub fn new(auth: AuthFlow, credentials: Credentials, vars: TemplateVars) -> Self {
        Self {
            auth,
            credentials,
            vars,
            artifacts: Box::new(DiscardStore),
            capture_failures: true,
        }
    }

    pub fn with_artifacts(mut self, store: Box<dyn ArtifactStore>) -> Self {
        self.artifacts = store;
        self
    }

    /// Skip the screenshot normally taken when a scenario fails
    pub fn capture_failures(mut self, capture: bool) -> Self {
        self.capture_failures = capture;
        self
    }

    pub fn vars(&self) -> &TemplateVars {
        &self.vars
    }

    pub fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    /// Execute one scenario. Never fails: every fault ends up in the result.
    pub fn run(&mut self, scenario: &Scenario, session: &mut Session) -> ScenarioResult {
        let started = Instant::now();
        tracing::info!(scenario = %scenario.name, steps = scenario.steps.len(), "running scenario");

        let mut result = ScenarioResult {
            name: scenario.name.clone(),
            outcome: Outcome::Passed,
            message: None,
            indicators: Vec::new(),
            precondition: Vec::new(),
            verdict: None,
            steps: Vec::new(),
            elapsed_ms: 0,
            screenshot: None,
        };

        match session.begin(&scenario.name) {
            Ok(()) => {
                self.execute(scenario, session, &mut result);
                if let Err(e) = session.end() {
                    tracing::warn!(scenario = %scenario.name, error = %e, "scenario did not release the session cleanly");
                }
            }
            Err(e @ HarnessError::InvalidTransition { .. }) => {
                result.outcome = e.outcome();
                result.message = Some(e.to_string());
                skip_all(&scenario.steps, &mut result);
            }
            Err(e) => {
                result.outcome = e.outcome();
                result.message = Some(format!("navigation to base URL failed: {}", e));
                skip_all(&scenario.steps, &mut result);
                self.capture_failure(scenario, session, &mut result);
                if let Err(e) = session.end() {
                    tracing::warn!(scenario = %scenario.name, error = %e, "scenario did not release the session cleanly");
                }
            }
        }

        result.elapsed_ms = started.elapsed().as_millis() as u64;
        match result.outcome {
            Outcome::Passed => {
                tracing::info!(scenario = %result.name, elapsed_ms = result.elapsed_ms, "scenario passed")
            }
            outcome => tracing::warn!(
                scenario = %result.name,
                %outcome,
                message = result.message.as_deref().unwrap_or(""),
                "scenario did not pass"
            ),
        }
        result
    }

    fn execute(&mut self, scenario: &Scenario, session: &mut Session, result: &mut ScenarioResult) {
        if let Err(e) = self.prepare(scenario, session, result) {
            result.outcome = e.outcome();
            result.message = Some(e.to_string());
            skip_all(&scenario.steps, result);
            self.capture_failure(scenario, session, result);
            return;
        }

        let saved_window = if scenario.resizes_window() {
            match session.driver().and_then(|d| d.window_size().map_err(HarnessError::from)) {
                Ok(size) => Some(size),
                Err(e) => {
                    tracing::warn!(scenario = %scenario.name, error = %e, "window size not saved");
                    None
                }
            }
        } else {
            None
        };

        self.run_steps(scenario, session, result);

        if let Some(size) = saved_window {
            let restored = session
                .driver()
                .and_then(|d| d.set_window_size(size).map_err(HarnessError::from));
            match restored {
                Ok(()) => tracing::debug!(width = size.width, height = size.height, "window size restored"),
                Err(e) => tracing::warn!(scenario = %scenario.name, error = %e, "window size not restored"),
            }
        }
    }

    fn run_steps(&mut self, scenario: &Scenario, session: &mut Session, result: &mut ScenarioResult) {
        for (index, step) in scenario.steps.iter().enumerate() {
            let step_started = Instant::now();
            let outcome = if session.budget().is_exhausted() {
                Err(HarnessError::TimeoutExceeded {
                    condition: "run budget".to_string(),
                    waited_ms: session.budget().total().as_millis() as u64,
                })
            } else {
                self.run_step(&scenario.name, step, session)
            };
            let elapsed_ms = step_started.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => {
                    tracing::debug!(step = %step.label, elapsed_ms, "step passed");
                    if step.is_optional() {
                        result.indicators.push(Indicator::fired(&step.label, step.weight));
                    }
                    result.steps.push(StepRecord {
                        label: step.label.clone(),
                        status: StepStatus::Passed,
                        message: None,
                        elapsed_ms,
                    });
                }
                Err(e) if step.is_optional() => {
                    tracing::warn!(step = %step.label, error = %e, "optional step failed, continuing");
                    result.indicators.push(Indicator::missed(&step.label, step.weight));
                    result.steps.push(StepRecord {
                        label: step.label.clone(),
                        status: StepStatus::SoftFailed,
                        message: Some(e.to_string()),
                        elapsed_ms,
                    });
                }
                Err(e) => {
                    tracing::warn!(step = %step.label, kind = e.kind(), "step failed, aborting scenario");
                    result.outcome = e.outcome();
                    result.message = Some(format!("{}: {}", step.label, e));
                    result.steps.push(StepRecord {
                        label: step.label.clone(),
                        status: StepStatus::Failed,
                        message: Some(e.to_string()),
                        elapsed_ms,
                    });
                    skip_all(&scenario.steps[index + 1..], result);
                    self.capture_failure(scenario, session, result);
                    return;
                }
            }
        }

        if let Some(threshold) = scenario.threshold {
            let verdict = verify::evaluate(&result.indicators, threshold);
            if !verdict.passed {
                result.outcome = Outcome::Failed;
                result.message = Some(format!(
                    "heuristic score {:.2} of {:.2} is below threshold {:.2}",
                    verdict.score, verdict.max_score, verdict.threshold
                ));
            }
            result.verdict = Some(verdict);
        }

        if !result.outcome.is_passed() {
            self.capture_failure(scenario, session, result);
        }
    }

    /// Scenario preconditions: optional state reset, then login
    fn prepare(&mut self, scenario: &Scenario, session: &mut Session, result: &mut ScenarioResult) -> HarnessResult<()> {
        if scenario.fresh_session {
            session.reset_state()?;
        }
        if scenario.requires_login {
            let attempt = self.auth.attempt(session, &self.credentials);
            result.precondition = attempt.indicators;
            if !attempt.success {
                return Err(HarnessError::AssertionViolated(format!(
                    "precondition not met: login failed ({})",
                    attempt.cause.as_deref().unwrap_or("no cause recorded")
                )));
            }
        }
        Ok(())
    }

    fn run_step(&mut self, scenario: &str, step: &Step, session: &mut Session) -> HarnessResult<()> {
        tracing::debug!(step = %step.label, "running step");
        match &step.kind {
            StepKind::Navigate { path } => {
                session.navigate(&self.vars.render(path))?;
                session.settle();
            }
            StepKind::Locate { target } => {
                locator::resolve(&self.vars.render_spec(target), session)?;
            }
            StepKind::Fill { target, text } => {
                let handle = locator::resolve(&self.vars.render_spec(target), session)?;
                let text = self.vars.render(text);
                session.driver()?.act(&handle, &ElementAction::Fill(text))?;
            }
            StepKind::Click { target } => {
                let handle = locator::resolve(&self.vars.render_spec(target), session)?;
                session.driver()?.act(&handle, &ElementAction::Click)?;
            }
            StepKind::ExecuteScript { script } => {
                let value = session.driver()?.execute_script(&self.vars.render(script))?;
                tracing::debug!(step = %step.label, %value, "script returned");
            }
            StepKind::Assert { check } => {
                let check = self.vars.render_check(check);
                if !evaluate_check(&check, session)? {
                    return Err(HarnessError::AssertionViolated(format!("expected {}", check)));
                }
            }
            StepKind::Screenshot => {
                let png = session.driver()?.screenshot()?;
                self.artifacts.store(scenario, &step.label, &png)?;
            }
            StepKind::Resize { width, height } => {
                session.driver()?.set_window_size(WindowSize::new(*width, *height))?;
            }
            StepKind::Settle { ms } => session.pause(Duration::from_millis(*ms)),
        }
        Ok(())
    }

    fn capture_failure(&mut self, scenario: &Scenario, session: &mut Session, result: &mut ScenarioResult) {
        if !self.capture_failures {
            return;
        }
        let png = match session
            .driver()
            .and_then(|d| d.screenshot().map_err(HarnessError::from))
        {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!(scenario = %scenario.name, error = %e, "failure screenshot not captured");
                return;
            }
        };
        match self.artifacts.store(&scenario.name, "failure", &png) {
            Ok(reference) => result.screenshot = Some(reference),
            Err(e) => tracing::warn!(scenario = %scenario.name, error = %e, "failure screenshot not stored"),
        }
    }
}

fn skip_all(steps: &[Step], result: &mut ScenarioResult) {
    result.steps.extend(steps.iter().map(|s| StepRecord {
        label: s.label.clone(),
        status: StepStatus::Skipped,
        message: None,
        elapsed_ms: 0,
    }));
}

/// Evaluate one check against the current page.
///
/// Element checks wait up to the explicit budget; text checks look once.
pub fn evaluate_check(check: &Check, session: &mut Session) -> HarnessResult<bool> {
    match check {
        Check::TitleContains { text } => {
            let title = session.driver()?.title()?;
            Ok(title.to_lowercase().contains(&text.to_lowercase()))
        }
        Check::UrlContainsAny { keywords } => {
            let url = session.driver()?.current_url()?.to_lowercase();
            Ok(keywords.iter().any(|k| url.contains(&k.to_lowercase())))
        }
        Check::PageContains { text } => {
            let source = session.driver()?.page_source()?.to_lowercase();
            Ok(source.contains(&text.to_lowercase()))
        }
        Check::PageContainsAny { keywords, min } => {
            let source = session.driver()?.page_source()?.to_lowercase();
            let found = keywords
                .iter()
                .filter(|k| source.contains(&k.to_lowercase()))
                .count();
            tracing::debug!(found, min, "keyword hits");
            Ok(found >= *min)
        }
        Check::PageLongerThan { chars } => Ok(session.driver()?.page_source()?.len() > *chars),
        Check::ElementPresent { target } => found_or_false(locator::resolve(target, session).map(|_| ())),
        Check::ElementAbsent { target } => found_or_false(locator::await_absent(target, session)),
        Check::ElementDisplayed { target } => match locator::resolve(target, session) {
            Ok(handle) => Ok(session.driver()?.is_displayed(&handle)?),
            Err(HarnessError::ElementNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        },
        Check::ElementCountAtLeast { target, min } => {
            let count = await_count(target, *min, session);
            found_or_false(count)
        }
        Check::ScriptEquals { script, expected } => {
            Ok(session.driver()?.execute_script(script)? == *expected)
        }
        Check::AnyOf { checks } => {
            for inner in checks {
                if evaluate_check(inner, session)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn await_count(target: &LocatorSpec, min: usize, session: &mut Session) -> HarnessResult<()> {
    let explicit = session.explicit_wait();
    let poll = session.policy().poll_interval;
    let driver = session.driver()?;
    let condition = format!("at least {} x {}", min, target.name);
    wait::await_condition(&condition, explicit, poll, || {
        Ok(locator::count(target, &mut *driver)? >= min)
    })
}

/// A wait that ran out means "no"; real faults still propagate
fn found_or_false(result: HarnessResult<()>) -> HarnessResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(HarnessError::ElementNotFound { .. }) | Err(HarnessError::TimeoutExceeded { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}
