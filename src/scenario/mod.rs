//! Declarative scenarios and suites.

pub mod template;
pub mod types;

pub use template::{TemplateVars, generate_run_token};
pub use types::{Check, FailurePolicy, Scenario, Step, StepKind};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{HarnessError, HarnessResult};

/// An ordered suite, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteDefinition {
    pub name: String,
    pub scenarios: Vec<Scenario>,
}

impl SuiteDefinition {
    pub fn new(name: impl Into<String>, scenarios: Vec<Scenario>) -> Self {
        Self {
            name: name.into(),
            scenarios,
        }
    }

    pub fn from_json(json: &str) -> HarnessResult<Self> {
        let suite: Self = serde_json::from_str(json)
            .map_err(|e| HarnessError::SuiteDefinition(format!("invalid suite JSON: {}", e)))?;
        suite.validate()?;
        Ok(suite)
    }

    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            HarnessError::SuiteDefinition(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject suites the runner could not execute meaningfully
    pub fn validate(&self) -> HarnessResult<()> {
        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.name.trim().is_empty() {
                return Err(HarnessError::SuiteDefinition("scenario with empty name".into()));
            }
            if !seen.insert(scenario.name.as_str()) {
                return Err(HarnessError::SuiteDefinition(format!(
                    "duplicate scenario name: {}",
                    scenario.name
                )));
            }
            if let Some(threshold) = scenario.threshold {
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(HarnessError::SuiteDefinition(format!(
                        "{}: threshold must be a non-negative number",
                        scenario.name
                    )));
                }
            }
            for step in &scenario.steps {
                if let Some(spec) = step_target(&step.kind) {
                    if spec.candidates.is_empty() {
                        return Err(HarnessError::SuiteDefinition(format!(
                            "{} / {}: locator {} has no candidates",
                            scenario.name, step.label, spec.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Keep scenarios named in `only` (all when empty) that carry `tag` (any when `None`)
    pub fn filter(&self, only: &[String], tag: Option<&str>) -> Self {
        let scenarios = self
            .scenarios
            .iter()
            .filter(|s| only.is_empty() || only.iter().any(|n| n.eq_ignore_ascii_case(&s.name)))
            .filter(|s| tag.map(|t| s.has_tag(t)).unwrap_or(true))
            .cloned()
            .collect();
        Self {
            name: self.name.clone(),
            scenarios,
        }
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

fn step_target(kind: &StepKind) -> Option<&crate::locator::LocatorSpec> {
    match kind {
        StepKind::Locate { target } | StepKind::Fill { target, .. } | StepKind::Click { target } => {
            Some(target)
        }
        _ => None,
    }
}
