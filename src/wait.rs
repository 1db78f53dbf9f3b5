//! Waiting: explicit condition polling, the session-wide implicit wait, and
//! the overall run budget that caps both.

use std::time::{Duration, Instant};

use crate::config::WaitSettings;
use crate::driver::DriverAdapter;
use crate::error::{HarnessError, HarnessResult};

/// Timeout budgets for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Budget for one explicit wait (a resolution or a condition)
    pub explicit: Duration,
    /// Delay between two polls of the same condition
    pub poll_interval: Duration,
    /// Passive wait the driver applies to every raw lookup
    pub implicit: Duration,
}

impl WaitPolicy {
    pub fn new(explicit: Duration, poll_interval: Duration, implicit: Duration) -> Self {
        Self {
            explicit,
            poll_interval,
            implicit,
        }
    }

    pub fn from_settings(settings: &WaitSettings) -> Self {
        Self {
            explicit: Duration::from_millis(settings.explicit_ms),
            poll_interval: Duration::from_millis(settings.poll_ms),
            implicit: Duration::from_millis(settings.implicit_ms),
        }
    }

    pub fn with_explicit(mut self, explicit: Duration) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_implicit(mut self, implicit: Duration) -> Self {
        self.implicit = implicit;
        self
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::from_settings(&WaitSettings::defaults())
    }
}

/// Hard wall-clock limit for a whole run.
///
/// Every explicit wait is clamped to what is left, so the sum of all waits
/// can never exceed `total`.
#[derive(Debug, Clone, Copy)]
pub struct RunBudget {
    started: Instant,
    total: Duration,
}

impl RunBudget {
    pub fn new(total: Duration) -> Self {
        Self {
            started: Instant::now(),
            total,
        }
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.elapsed())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }

    /// `wait`, shortened to fit in what is left of the run
    pub fn clamp(&self, wait: Duration) -> Duration {
        wait.min(self.remaining())
    }
}

/// Poll `predicate` until it returns true or `timeout` expires.
///
/// The predicate is evaluated at least once. Expiry is final: the call fails
/// with `TimeoutExceeded` and is not retried. Errors raised by the predicate
/// abort the wait immediately.
pub fn await_condition<F>(
    condition: &str,
    timeout: Duration,
    poll_interval: Duration,
    mut predicate: F,
) -> HarnessResult<()>
where
    F: FnMut() -> HarnessResult<bool>,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut polls = 0u32;

    loop {
        polls += 1;
        if predicate()? {
            tracing::debug!(condition, polls, elapsed_ms = started.elapsed().as_millis() as u64, "condition met");
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            let waited_ms = started.elapsed().as_millis() as u64;
            tracing::debug!(condition, polls, waited_ms, "condition timed out");
            return Err(HarnessError::TimeoutExceeded {
                condition: condition.to_string(),
                waited_ms,
            });
        }
        std::thread::sleep(poll_interval.min(deadline - now));
    }
}

/// Turns the driver's implicit wait off and restores it when dropped.
///
/// Explicit polling runs through this guard so a missing element costs one
/// poll interval, not a poll interval plus the implicit wait.
pub struct ImplicitWaitSuspended<'a> {
    driver: &'a mut dyn DriverAdapter,
    previous: Duration,
}

impl<'a> ImplicitWaitSuspended<'a> {
    pub fn new(driver: &'a mut dyn DriverAdapter) -> HarnessResult<Self> {
        let previous = driver.implicit_wait();
        if !previous.is_zero() {
            driver.set_implicit_wait(Duration::ZERO)?;
        }
        Ok(Self { driver, previous })
    }

    pub fn driver(&mut self) -> &mut dyn DriverAdapter {
        &mut *self.driver
    }
}

impl Drop for ImplicitWaitSuspended<'_> {
    fn drop(&mut self) {
        if self.previous.is_zero() {
            return;
        }
        if let Err(e) = self.driver.set_implicit_wait(self.previous) {
            tracing::warn!(error = %e, "failed to restore implicit wait");
        }
    }
}
