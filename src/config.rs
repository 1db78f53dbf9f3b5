//! Configuration management with environment variable support.
//!
//! Every run setting has a hard default and can be overridden from the
//! environment; the CLI overrides both for a single invocation.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `LIBRARY_ACCEPTANCE_BASE_URL` | Application under test | `http://localhost:4000` |
//! | `LIBRARY_ACCEPTANCE_WEBDRIVER_URL` | WebDriver endpoint | `http://localhost:9515` |
//! | `LIBRARY_ACCEPTANCE_PROBE_TARGET` | Check the base URL answers before running | `true` |
//! | `LIBRARY_ACCEPTANCE_EMAIL` | Login email | `peterparker@gmail.com` |
//! | `LIBRARY_ACCEPTANCE_PASSWORD` | Login password | `peterparker` |
//! | `LIBRARY_ACCEPTANCE_IMPLICIT_WAIT_MS` | Driver implicit wait | `10000` |
//! | `LIBRARY_ACCEPTANCE_EXPLICIT_WAIT_MS` | Budget for one explicit wait | `10000` |
//! | `LIBRARY_ACCEPTANCE_POLL_MS` | Poll interval for explicit waits | `500` |
//! | `LIBRARY_ACCEPTANCE_SETTLE_MS` | Grace period after navigation | `2000` |
//! | `LIBRARY_ACCEPTANCE_RUN_BUDGET_SECS` | Hard limit for a whole run | `900` |
//! | `LIBRARY_ACCEPTANCE_HEADLESS` | Run the browser headless | `true` |
//! | `LIBRARY_ACCEPTANCE_WINDOW_SIZE` | `desktop`, `laptop`, `tablet`, `mobile` or `WxH` | `desktop` |
//! | `LIBRARY_ACCEPTANCE_ARTIFACT_DIR` | Where failure screenshots go | `./acceptance_artifacts` |
//!
//! # Example
//!
//! ```bash
//! export LIBRARY_ACCEPTANCE_BASE_URL="https://library.staging.example"
//! export LIBRARY_ACCEPTANCE_WINDOW_SIZE="tablet"
//! ```

use std::env;
use std::fmt;
use std::sync::OnceLock;

use crate::driver::WindowSize;

// ============================================================================
// Default Values
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

pub const DEFAULT_EMAIL: &str = "peterparker@gmail.com";

pub const DEFAULT_PASSWORD: &str = "peterparker";

pub const DEFAULT_IMPLICIT_WAIT_MS: u64 = 10_000;

pub const DEFAULT_EXPLICIT_WAIT_MS: u64 = 10_000;

pub const DEFAULT_POLL_MS: u64 = 500;

/// Grace period after navigation and form submission
pub const DEFAULT_SETTLE_MS: u64 = 2_000;

pub const DEFAULT_RUN_BUDGET_SECS: u64 = 900;

/// Timeout for the reachability probe of the base URL (seconds)
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_WINDOW_SIZE: &str = "desktop";

pub const DEFAULT_ARTIFACT_DIR: &str = "./acceptance_artifacts";

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_BASE_URL: &str = "LIBRARY_ACCEPTANCE_BASE_URL";

pub const ENV_WEBDRIVER_URL: &str = "LIBRARY_ACCEPTANCE_WEBDRIVER_URL";

pub const ENV_PROBE_TARGET: &str = "LIBRARY_ACCEPTANCE_PROBE_TARGET";

pub const ENV_EMAIL: &str = "LIBRARY_ACCEPTANCE_EMAIL";

pub const ENV_PASSWORD: &str = "LIBRARY_ACCEPTANCE_PASSWORD";

pub const ENV_IMPLICIT_WAIT_MS: &str = "LIBRARY_ACCEPTANCE_IMPLICIT_WAIT_MS";

pub const ENV_EXPLICIT_WAIT_MS: &str = "LIBRARY_ACCEPTANCE_EXPLICIT_WAIT_MS";

pub const ENV_POLL_MS: &str = "LIBRARY_ACCEPTANCE_POLL_MS";

pub const ENV_SETTLE_MS: &str = "LIBRARY_ACCEPTANCE_SETTLE_MS";

pub const ENV_RUN_BUDGET_SECS: &str = "LIBRARY_ACCEPTANCE_RUN_BUDGET_SECS";

pub const ENV_HEADLESS: &str = "LIBRARY_ACCEPTANCE_HEADLESS";

pub const ENV_WINDOW_SIZE: &str = "LIBRARY_ACCEPTANCE_WINDOW_SIZE";

pub const ENV_ARTIFACT_DIR: &str = "LIBRARY_ACCEPTANCE_ARTIFACT_DIR";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized run configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub target: TargetSettings,
    pub credentials: CredentialSettings,
    pub waits: WaitSettings,
    pub browser: BrowserSettings,
    pub artifacts: ArtifactSettings,
}

/// Where the application and the browser live
#[derive(Debug, Clone)]
pub struct TargetSettings {
    pub base_url: String,
    pub webdriver_url: String,
    /// Issue an HTTP GET against `base_url` before the first scenario
    pub probe: bool,
    pub probe_timeout_secs: u64,
}

/// The single account a run logs in with
#[derive(Clone)]
pub struct CredentialSettings {
    pub email: String,
    pub password: String,
}

/// Timeout budgets, all in milliseconds except the run budget
#[derive(Debug, Clone)]
pub struct WaitSettings {
    pub implicit_ms: u64,
    pub explicit_ms: u64,
    pub poll_ms: u64,
    pub settle_ms: u64,
    pub run_budget_secs: u64,
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub window_size: String,
    pub window: WindowSize,
}

#[derive(Debug, Clone)]
pub struct ArtifactSettings {
    pub dir: String,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            target: TargetSettings::from_env(),
            credentials: CredentialSettings::from_env(),
            waits: WaitSettings::from_env(),
            browser: BrowserSettings::from_env(),
            artifacts: ArtifactSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            target: TargetSettings::defaults(),
            credentials: CredentialSettings::defaults(),
            waits: WaitSettings::defaults(),
            browser: BrowserSettings::defaults(),
            artifacts: ArtifactSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl TargetSettings {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            webdriver_url: env::var(ENV_WEBDRIVER_URL)
                .unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string()),
            probe: env_flag(ENV_PROBE_TARGET).unwrap_or(true),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }

    pub fn defaults() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            probe: true,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }
}

impl CredentialSettings {
    pub fn from_env() -> Self {
        Self {
            email: env::var(ENV_EMAIL).unwrap_or_else(|_| DEFAULT_EMAIL.to_string()),
            password: env::var(ENV_PASSWORD).unwrap_or_else(|_| DEFAULT_PASSWORD.to_string()),
        }
    }

    pub fn defaults() -> Self {
        Self {
            email: DEFAULT_EMAIL.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl WaitSettings {
    pub fn from_env() -> Self {
        Self {
            implicit_ms: env_number(ENV_IMPLICIT_WAIT_MS).unwrap_or(DEFAULT_IMPLICIT_WAIT_MS),
            explicit_ms: env_number(ENV_EXPLICIT_WAIT_MS).unwrap_or(DEFAULT_EXPLICIT_WAIT_MS),
            poll_ms: env_number(ENV_POLL_MS).unwrap_or(DEFAULT_POLL_MS),
            settle_ms: env_number(ENV_SETTLE_MS).unwrap_or(DEFAULT_SETTLE_MS),
            run_budget_secs: env_number(ENV_RUN_BUDGET_SECS).unwrap_or(DEFAULT_RUN_BUDGET_SECS),
        }
    }

    pub fn defaults() -> Self {
        Self {
            implicit_ms: DEFAULT_IMPLICIT_WAIT_MS,
            explicit_ms: DEFAULT_EXPLICIT_WAIT_MS,
            poll_ms: DEFAULT_POLL_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            run_budget_secs: DEFAULT_RUN_BUDGET_SECS,
        }
    }
}

impl BrowserSettings {
    pub fn from_env() -> Self {
        let window_size =
            env::var(ENV_WINDOW_SIZE).unwrap_or_else(|_| DEFAULT_WINDOW_SIZE.to_string());
        let window = parse_window_size(&window_size).unwrap_or_else(default_window);

        Self {
            headless: env_flag(ENV_HEADLESS).unwrap_or(true),
            window_size,
            window,
        }
    }

    pub fn defaults() -> Self {
        Self {
            headless: true,
            window_size: DEFAULT_WINDOW_SIZE.to_string(),
            window: default_window(),
        }
    }
}

impl ArtifactSettings {
    pub fn from_env() -> Self {
        Self {
            dir: env::var(ENV_ARTIFACT_DIR).unwrap_or_else(|_| DEFAULT_ARTIFACT_DIR.to_string()),
        }
    }

    pub fn defaults() -> Self {
        Self {
            dir: DEFAULT_ARTIFACT_DIR.to_string(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn default_window() -> WindowSize {
    WindowSize::new(1920, 1080)
}

fn env_number(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|s| parse_flag(&s))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a window size string.
/// Supports: "mobile" (375x667), "tablet" (768x1024), "laptop" (1366x768),
/// "desktop" (1920x1080), "WxH" or "W,H"
pub fn parse_window_size(size: &str) -> Option<WindowSize> {
    match size.trim().to_lowercase().as_str() {
        "mobile" => Some(WindowSize::new(375, 667)),
        "tablet" => Some(WindowSize::new(768, 1024)),
        "laptop" => Some(WindowSize::new(1366, 768)),
        "desktop" => Some(default_window()),
        custom => {
            let parts: Vec<&str> = custom.split(['x', ',']).collect();
            if parts.len() == 2 {
                let w: u32 = parts[0].trim().parse().ok()?;
                let h: u32 = parts[1].trim().parse().ok()?;
                if w == 0 || h == 0 {
                    return None;
                }
                Some(WindowSize::new(w, h))
            } else {
                None
            }
        }
    }
}

/// Get the configured base URL (convenience function)
pub fn base_url() -> String {
    get().target.base_url.clone()
}

/// Get the configured WebDriver endpoint (convenience function)
pub fn webdriver_url() -> String {
    get().target.webdriver_url.clone()
}
