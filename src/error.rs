//! Error taxonomy for the acceptance engine

use thiserror::Error;

use crate::driver::DriverError;
use crate::runner::Outcome;
use crate::session::SessionState;

/// Result type for engine operations
pub type HarnessResult<T> = Result<T, HarnessError>;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// No candidate strategy matched before the wait budget ran out
    #[error("element not found: {element} ({candidates} candidate(s) tried for {waited_ms} ms)")]
    ElementNotFound {
        element: String,
        candidates: usize,
        waited_ms: u64,
    },

    /// An explicit wait condition never became true
    #[error("timed out after {waited_ms} ms waiting for {condition}")]
    TimeoutExceeded { condition: String, waited_ms: u64 },

    /// Fatal: the run cannot start
    #[error("session setup failed: {0}")]
    SessionSetupFailed(String),

    #[error("driver fault: {0}")]
    DriverFault(#[from] DriverError),

    #[error("assertion violated: {0}")]
    AssertionViolated(String),

    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("suite definition error: {0}")]
    SuiteDefinition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Scenario outcome this error produces when it aborts a scenario.
    ///
    /// The target failing to show what was expected is `Failed`; anything the
    /// harness did not anticipate is `Errored`.
    pub fn outcome(&self) -> Outcome {
        match self {
            HarnessError::ElementNotFound { .. }
            | HarnessError::TimeoutExceeded { .. }
            | HarnessError::AssertionViolated(_) => Outcome::Failed,
            _ => Outcome::Errored,
        }
    }

    /// Short machine-friendly name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::ElementNotFound { .. } => "element_not_found",
            HarnessError::TimeoutExceeded { .. } => "timeout_exceeded",
            HarnessError::SessionSetupFailed(_) => "session_setup_failed",
            HarnessError::DriverFault(_) => "driver_fault",
            HarnessError::AssertionViolated(_) => "assertion_violated",
            HarnessError::InvalidTransition { .. } => "invalid_transition",
            HarnessError::InvalidConfig(_) => "invalid_config",
            HarnessError::SuiteDefinition(_) => "suite_definition",
            HarnessError::Io(_) => "io",
            HarnessError::Json(_) => "json",
        }
    }
}
