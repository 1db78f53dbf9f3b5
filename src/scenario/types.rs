use serde::{Deserialize, Serialize};
use std::fmt;

use crate::driver::WindowSize;
use crate::locator::LocatorSpec;

/// What a failing step does to its scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the scenario; the error decides the outcome
    #[default]
    AbortScenario,
    /// Record the failure as an indicator and keep going
    RecordAndContinue,
}

/// An expectation about the current page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    TitleContains { text: String },
    UrlContainsAny { keywords: Vec<String> },
    PageContains { text: String },
    /// At least `min` of `keywords` appear in the page source
    PageContainsAny {
        keywords: Vec<String>,
        #[serde(default = "default_min")]
        min: usize,
    },
    PageLongerThan { chars: usize },
    ElementPresent { target: LocatorSpec },
    ElementAbsent { target: LocatorSpec },
    ElementDisplayed { target: LocatorSpec },
    ElementCountAtLeast { target: LocatorSpec, min: usize },
    ScriptEquals { script: String, expected: serde_json::Value },
    AnyOf { checks: Vec<Check> },
}

fn default_min() -> usize {
    1
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::TitleContains { text } => write!(f, "title contains {:?}", text),
            Check::UrlContainsAny { keywords } => write!(f, "URL contains one of {:?}", keywords),
            Check::PageContains { text } => write!(f, "page contains {:?}", text),
            Check::PageContainsAny { keywords, min } => {
                write!(f, "page contains at least {} of {:?}", min, keywords)
            }
            Check::PageLongerThan { chars } => write!(f, "page longer than {} chars", chars),
            Check::ElementPresent { target } => write!(f, "{} present", target),
            Check::ElementAbsent { target } => write!(f, "{} absent", target),
            Check::ElementDisplayed { target } => write!(f, "{} displayed", target),
            Check::ElementCountAtLeast { target, min } => {
                write!(f, "at least {} x {}", min, target)
            }
            Check::ScriptEquals { script, expected } => {
                write!(f, "script {:?} returns {}", script, expected)
            }
            Check::AnyOf { checks } => {
                let parts: Vec<String> = checks.iter().map(|c| c.to_string()).collect();
                write!(f, "any of [{}]", parts.join(" | "))
            }
        }
    }
}

/// The action a step performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    /// Path relative to the base URL, or an absolute URL
    Navigate { path: String },
    Locate { target: LocatorSpec },
    Fill { target: LocatorSpec, text: String },
    Click { target: LocatorSpec },
    ExecuteScript { script: String },
    Assert { check: Check },
    Screenshot,
    Resize { width: u32, height: u32 },
    /// Fixed pause, bounded by the run budget
    Settle { ms: u64 },
}

/// One atomic scenario action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub label: String,
    #[serde(flatten)]
    pub kind: StepKind,
    #[serde(default)]
    pub on_failure: FailurePolicy,
    /// Indicator weight for `record_and_continue` steps
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Step {
    pub fn new(label: impl Into<String>, kind: StepKind) -> Self {
        Self {
            label: label.into(),
            kind,
            on_failure: FailurePolicy::AbortScenario,
            weight: default_weight(),
        }
    }

    pub fn navigate(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(label, StepKind::Navigate { path: path.into() })
    }

    pub fn locate(label: impl Into<String>, target: LocatorSpec) -> Self {
        Self::new(label, StepKind::Locate { target })
    }

    pub fn fill(label: impl Into<String>, target: LocatorSpec, text: impl Into<String>) -> Self {
        Self::new(
            label,
            StepKind::Fill {
                target,
                text: text.into(),
            },
        )
    }

    pub fn click(label: impl Into<String>, target: LocatorSpec) -> Self {
        Self::new(label, StepKind::Click { target })
    }

    pub fn script(label: impl Into<String>, script: impl Into<String>) -> Self {
        Self::new(
            label,
            StepKind::ExecuteScript {
                script: script.into(),
            },
        )
    }

    pub fn assert(label: impl Into<String>, check: Check) -> Self {
        Self::new(label, StepKind::Assert { check })
    }

    pub fn screenshot(label: impl Into<String>) -> Self {
        Self::new(label, StepKind::Screenshot)
    }

    pub fn resize(label: impl Into<String>, size: WindowSize) -> Self {
        Self::new(
            label,
            StepKind::Resize {
                width: size.width,
                height: size.height,
            },
        )
    }

    pub fn settle(label: impl Into<String>, ms: u64) -> Self {
        Self::new(label, StepKind::Settle { ms })
    }

    /// Failure is recorded as an indicator instead of ending the scenario
    pub fn optional(mut self) -> Self {
        self.on_failure = FailurePolicy::RecordAndContinue;
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.on_failure == FailurePolicy::RecordAndContinue
    }
}

/// A named, ordered sequence of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Log in before the first step
    #[serde(default)]
    pub requires_login: bool,
    /// Clear cookies and storage before the first step
    #[serde(default)]
    pub fresh_session: bool,
    pub steps: Vec<Step>,
    /// When set, the verifier decides the outcome from the recorded indicators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            requires_login: false,
            fresh_session: false,
            steps: Vec::new(),
            threshold: None,
            tags: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn requires_login(mut self) -> Self {
        self.requires_login = true;
        self
    }

    pub fn fresh_session(mut self) -> Self {
        self.fresh_session = true;
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Whether any step changes the browser window size
    pub fn resizes_window(&self) -> bool {
        self.steps.iter().any(|s| matches!(s.kind, StepKind::Resize { .. }))
    }
}
