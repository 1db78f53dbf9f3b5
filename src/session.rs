//! Session lifecycle: one browser for the whole run.
//!
//! `Uninitialized -> Ready -> (Active -> Ready)* -> Closed`
//!
//! - `open` acquires the driver, applies the implicit wait and window size and
//!   optionally checks that the target answers over HTTP
//! - `begin` / `end` bracket one scenario
//! - `close` releases the driver; `Drop` does the same if nobody called it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::{self, Config};
use crate::driver::{DriverAdapter, DriverError, DriverResult, WindowSize};
use crate::error::{HarnessError, HarnessResult};
use crate::wait::{RunBudget, WaitPolicy};

/// Clears client-side auth state kept outside cookies
const CLEAR_STORAGE_SCRIPT: &str =
    "window.localStorage && window.localStorage.clear(); window.sessionStorage && window.sessionStorage.clear(); return true;";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Ready,
    Active,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// How a session talks to the target
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub base_url: String,
    pub policy: WaitPolicy,
    /// Fixed grace period after navigation
    pub settle: Duration,
    /// Hard limit for the whole run
    pub run_budget: Duration,
    /// Window size applied at setup (`None` keeps the driver's)
    pub window: Option<WindowSize>,
    /// GET the base URL during setup and fail the run if it does not answer
    pub probe_target: bool,
    pub probe_timeout: Duration,
}

impl SessionOptions {
    /// Options with default waits and no reachability probe
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            policy: WaitPolicy::default(),
            settle: Duration::from_millis(config::DEFAULT_SETTLE_MS),
            run_budget: Duration::from_secs(config::DEFAULT_RUN_BUDGET_SECS),
            window: None,
            probe_target: false,
            probe_timeout: Duration::from_secs(config::DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.target.base_url.clone(),
            policy: WaitPolicy::from_settings(&config.waits),
            settle: Duration::from_millis(config.waits.settle_ms),
            run_budget: Duration::from_secs(config.waits.run_budget_secs),
            window: Some(config.browser.window),
            probe_target: config.target.probe,
            probe_timeout: Duration::from_secs(config.target.probe_timeout_secs),
        }
    }

    pub fn policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn run_budget(mut self, budget: Duration) -> Self {
        self.run_budget = budget;
        self
    }

    pub fn window(mut self, window: WindowSize) -> Self {
        self.window = Some(window);
        self
    }

    pub fn probe_target(mut self, probe: bool) -> Self {
        self.probe_target = probe;
        self
    }
}

/// A live browser context owned for the duration of one run
pub struct Session {
    options: SessionOptions,
    state: SessionState,
    driver: Option<Box<dyn DriverAdapter>>,
    authenticated: bool,
    budget: RunBudget,
    scenario: Option<String>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let budget = RunBudget::new(options.run_budget);
        Self {
            options,
            state: SessionState::Uninitialized,
            driver: None,
            authenticated: false,
            budget,
            scenario: None,
        }
    }

    /// `Uninitialized -> Ready`. Any failure here is fatal for the run.
    pub fn open<F>(&mut self, acquire: F) -> HarnessResult<()>
    where
        F: FnOnce() -> DriverResult<Box<dyn DriverAdapter>>,
    {
        self.expect_state(SessionState::Uninitialized, SessionState::Ready)?;

        let mut driver = acquire().map_err(|e| {
            HarnessError::SessionSetupFailed(format!("cannot acquire browser driver: {}", e))
        })?;
        tracing::info!(driver = driver.name(), base_url = %self.options.base_url, "driver acquired");

        if let Err(e) = configure(&mut *driver, &self.options) {
            release(driver);
            return Err(HarnessError::SessionSetupFailed(format!(
                "cannot configure browser driver: {}",
                e
            )));
        }

        if self.options.probe_target {
            if let Err(e) = check_target(&self.options.base_url, self.options.probe_timeout) {
                release(driver);
                return Err(e);
            }
        }

        self.budget = RunBudget::new(self.options.run_budget);
        self.driver = Some(driver);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// `Ready -> Active`: fresh navigation to the base URL, then settle
    pub fn begin(&mut self, scenario: &str) -> HarnessResult<()> {
        self.expect_state(SessionState::Ready, SessionState::Active)?;
        self.state = SessionState::Active;
        self.scenario = Some(scenario.to_string());
        tracing::debug!(scenario, "scenario started");

        let base = self.options.base_url.clone();
        self.driver()?.navigate(&base)?;
        self.settle();
        Ok(())
    }

    /// `Active -> Ready`, whatever the scenario outcome
    pub fn end(&mut self) -> HarnessResult<()> {
        self.expect_state(SessionState::Active, SessionState::Ready)?;
        self.state = SessionState::Ready;
        if let Some(name) = self.scenario.take() {
            tracing::debug!(scenario = %name, "scenario ended");
        }
        Ok(())
    }

    /// Release the driver. Safe to call more than once.
    pub fn close(&mut self) -> HarnessResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        self.scenario = None;
        self.authenticated = false;

        match self.driver.take() {
            Some(mut driver) => {
                tracing::info!(driver = driver.name(), "releasing driver");
                driver.close().map_err(HarnessError::from)
            }
            None => Ok(()),
        }
    }

    /// Drop cookies and browser storage, then reload the base URL
    pub fn reset_state(&mut self) -> HarnessResult<()> {
        let base = self.options.base_url.clone();
        let driver = self.driver()?;
        driver.delete_cookies()?;
        driver.execute_script(CLEAR_STORAGE_SCRIPT)?;
        driver.navigate(&base)?;
        self.authenticated = false;
        self.settle();
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn base_url(&self) -> &str {
        &self.options.base_url
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.options.policy
    }

    pub fn budget(&self) -> &RunBudget {
        &self.budget
    }

    /// Explicit-wait budget, clamped to what is left of the run
    pub fn explicit_wait(&self) -> Duration {
        self.budget.clamp(self.options.policy.explicit)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    /// Scenario currently holding the session
    pub fn scenario(&self) -> Option<&str> {
        self.scenario.as_deref()
    }

    pub fn driver(&mut self) -> HarnessResult<&mut dyn DriverAdapter> {
        let state = self.state;
        match self.driver.as_deref_mut() {
            Some(driver) => Ok(driver),
            None => Err(HarnessError::DriverFault(DriverError::NotConnected(format!(
                "session is {}",
                state
            )))),
        }
    }

    /// Absolute URL for `path`; absolute URLs pass through
    pub fn url_for(&self, path: &str) -> String {
        resolve_url(&self.options.base_url, path)
    }

    pub fn navigate(&mut self, path: &str) -> HarnessResult<()> {
        let url = self.url_for(path);
        self.driver()?.navigate(&url)?;
        Ok(())
    }

    /// Sleep for the settle period, never past the run budget
    pub fn settle(&self) {
        self.pause(self.options.settle);
    }

    pub fn pause(&self, wait: Duration) {
        let wait = self.budget.clamp(wait);
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }

    fn expect_state(&self, from: SessionState, to: SessionState) -> HarnessResult<()> {
        if self.state == from {
            Ok(())
        } else {
            Err(HarnessError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.options.base_url)
            .field("state", &self.state)
            .field("authenticated", &self.authenticated)
            .field("scenario", &self.scenario)
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "driver release failed during drop");
        }
    }
}

fn configure(driver: &mut dyn DriverAdapter, options: &SessionOptions) -> DriverResult<()> {
    driver.set_implicit_wait(options.policy.implicit)?;
    if let Some(window) = options.window {
        driver.set_window_size(window)?;
    }
    Ok(())
}

fn release(mut driver: Box<dyn DriverAdapter>) {
    if let Err(e) = driver.close() {
        tracing::warn!(error = %e, "driver release failed after setup error");
    }
}

fn resolve_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Check that `url` answers over HTTP.
///
/// Any status code counts as reachable; only connection-level failures and
/// timeouts fail the probe.
pub fn check_target(url: &str, timeout: Duration) -> HarnessResult<u16> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| HarnessError::SessionSetupFailed(format!("cannot build HTTP client: {}", e)))?;

    match client.get(url).send() {
        Ok(response) => {
            let status = response.status().as_u16();
            tracing::info!(url, status, "target reachable");
            Ok(status)
        }
        Err(e) => Err(HarnessError::SessionSetupFailed(format!(
            "target {} is not reachable: {}",
            url, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockOp, MockPage};

    fn options() -> SessionOptions {
        SessionOptions::new("http://app.test")
            .settle(Duration::ZERO)
            .window(WindowSize::new(1280, 720))
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url("http://app.test/", "/login"), "http://app.test/login");
        assert_eq!(resolve_url("http://app.test", "books"), "http://app.test/books");
        assert_eq!(resolve_url("http://app.test", ""), "http://app.test");
        assert_eq!(resolve_url("http://app.test", "https://other.test/x"), "https://other.test/x");
    }

    #[test]
    fn test_lifecycle_transitions() {
        let driver = MockDriver::new(MockPage::new("about:blank"));
        let probe = driver.probe();
        let mut session = Session::new(options());
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.open(|| Ok(Box::new(driver))).unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(probe.window(), WindowSize::new(1280, 720));
        assert_eq!(probe.implicit_wait(), session.policy().implicit);

        session.begin("first").unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(probe.url(), "http://app.test");
        assert!(matches!(
            session.begin("second"),
            Err(HarnessError::InvalidTransition { from: SessionState::Active, .. })
        ));
        session.end().unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        session.close().unwrap();
        assert!(probe.is_closed());
        assert!(session.close().is_ok());
        assert!(session.driver().is_err());
    }

    #[test]
    fn test_acquire_failure_is_setup_failure() {
        let mut session = Session::new(options());
        let err = session
            .open(|| Err(DriverError::NotConnected("no chromedriver".into())))
            .unwrap_err();
        assert!(matches!(err, HarnessError::SessionSetupFailed(_)));
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_configure_failure_releases_driver() {
        let driver = MockDriver::new(MockPage::new("about:blank")).failing(MockOp::Window);
        let probe = driver.probe();
        let mut session = Session::new(options());
        let err = session.open(|| Ok(Box::new(driver))).unwrap_err();
        assert!(matches!(err, HarnessError::SessionSetupFailed(_)));
        assert!(probe.is_closed());
    }

    #[test]
    fn test_drop_releases_driver() {
        let driver = MockDriver::new(MockPage::new("about:blank"));
        let probe = driver.probe();
        {
            let mut session = Session::new(options());
            session.open(|| Ok(Box::new(driver))).unwrap();
            session.begin("left open").unwrap();
        }
        assert!(probe.is_closed());
    }

    #[test]
    fn test_reset_state_clears_auth() {
        let driver = MockDriver::new(MockPage::new("about:blank"));
        let mut session = Session::new(options());
        session.open(|| Ok(Box::new(driver))).unwrap();
        session.set_authenticated(true);
        session.reset_state().unwrap();
        assert!(!session.is_authenticated());
    }
}
