//! Library Acceptance - browser-driven acceptance tests for the Digital Library.
//!
//! This crate provides:
//! - A synchronous browser driver seam with a WebDriver and an in-memory backend
//! - Multi-strategy element location under explicit and run-wide time budgets
//! - A session lifecycle shared by every scenario of a run
//! - Login detection, weighted heuristic verification and a scenario runner
//! - The built-in Digital Library suite and a JSON-definable scenario format
//!
//! # Example
//!
//! ```rust,no_run
//! use library_acceptance::{config, library, report, Credentials, ScenarioRunner, SessionOptions, TemplateVars};
//! use library_acceptance::driver::{DriverAdapter, WebDriverAdapter, WebDriverConfig};
//!
//! let cfg = config::get();
//! let credentials = Credentials::from(&cfg.credentials);
//! let vars = TemplateVars::new(&credentials, &cfg.target.base_url);
//! let mut runner = ScenarioRunner::new(library::auth_flow(), credentials, vars);
//!
//! let driver_config = WebDriverConfig::new(&cfg.target.webdriver_url);
//! let suite = library::suite();
//! let report = report::run(
//!     &suite.name,
//!     &suite.scenarios,
//!     SessionOptions::from_config(cfg),
//!     || WebDriverAdapter::connect(&driver_config).map(|d| Box::new(d) as Box<dyn DriverAdapter>),
//!     &mut runner,
//!     |_| {},
//! )
//! .unwrap();
//! println!("{}", report.summary());
//! ```

pub mod artifact;
pub mod auth;
pub mod config;
pub mod driver;
pub mod error;
pub mod library;
pub mod locator;
pub mod logging;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod verify;
pub mod wait;

// Re-export error types
pub use error::{HarnessError, HarnessResult};

// Re-export the execution pipeline
pub use auth::{AuthFlow, Credentials, LoginAttempt, LoginForm, LoginSignals};
pub use locator::LocatorSpec;
pub use report::{SuiteProgress, SuiteReport, run, run_suite, run_suite_with_progress};
pub use runner::{Outcome, ScenarioResult, ScenarioRunner, StepRecord, StepStatus, evaluate_check};
pub use scenario::{Check, FailurePolicy, Scenario, Step, StepKind, SuiteDefinition, TemplateVars};
pub use session::{Session, SessionOptions, SessionState, check_target};
pub use verify::{Indicator, Verdict};
pub use wait::{RunBudget, WaitPolicy, await_condition};

// Re-export artifact stores
pub use artifact::{ArtifactStore, DirectoryStore, DiscardStore, MemoryStore};
