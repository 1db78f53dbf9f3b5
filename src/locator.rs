//! Multi-strategy element resolution.
//!
//! A `LocatorSpec` names one logical element and lists the ways of finding it,
//! most specific first. Resolution polls each candidate for a slice of the
//! explicit-wait budget and moves on when the slice runs out, so the total
//! time stays inside the budget however many fallbacks a locator declares.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::driver::{DriverAdapter, ElementHandle, Strategy};
use crate::error::{HarnessError, HarnessResult};
use crate::session::Session;
use crate::wait::{self, ImplicitWaitSuspended};

/// Ordered candidate strategies for one logical UI element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorSpec {
    /// Human name used in diagnostics ("email field")
    pub name: String,
    pub candidates: Vec<Strategy>,
}

impl LocatorSpec {
    pub fn new(name: impl Into<String>, candidates: Vec<Strategy>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    pub fn single(name: impl Into<String>, strategy: Strategy) -> Self {
        Self::new(name, vec![strategy])
    }

    /// Append a lower-confidence fallback
    pub fn or(mut self, strategy: Strategy) -> Self {
        self.candidates.push(strategy);
        self
    }

    /// Same spec with every string inside the strategies rewritten by `f`
    pub fn map_text(&self, f: impl Fn(&str) -> String) -> Self {
        let candidates = self
            .candidates
            .iter()
            .map(|s| match s {
                Strategy::Css { selector } => Strategy::css(f(selector)),
                Strategy::Id { id } => Strategy::id(f(id)),
                Strategy::Name { name } => Strategy::name(f(name)),
                Strategy::XPath { expr } => Strategy::xpath(f(expr)),
                Strategy::LinkText { text } => Strategy::link_text(f(text)),
                Strategy::Text { tag, contains } => Strategy::text(tag.clone(), f(contains)),
            })
            .collect();
        Self {
            name: f(&self.name),
            candidates,
        }
    }
}

impl fmt::Display for LocatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Resolve `spec` within the session's explicit-wait budget
pub fn resolve(spec: &LocatorSpec, session: &mut Session) -> HarnessResult<ElementHandle> {
    let explicit = session.explicit_wait();
    let poll = session.policy().poll_interval;
    resolve_within(spec, session.driver()?, explicit, poll)
}

/// Resolve `spec` against a raw driver.
///
/// Each candidate gets `max(explicit / N, poll)` and at least one lookup.
/// All slices are clamped to `explicit` measured from the first lookup.
pub fn resolve_within(
    spec: &LocatorSpec,
    driver: &mut dyn DriverAdapter,
    explicit: Duration,
    poll: Duration,
) -> HarnessResult<ElementHandle> {
    let count = spec.candidates.len();
    if count == 0 {
        return Err(HarnessError::ElementNotFound {
            element: spec.name.clone(),
            candidates: 0,
            waited_ms: 0,
        });
    }

    let mut guard = ImplicitWaitSuspended::new(driver)?;
    let driver = guard.driver();

    let started = Instant::now();
    let deadline = started + explicit;
    let slice = (explicit / count as u32).max(poll);

    for (index, strategy) in spec.candidates.iter().enumerate() {
        let slice_end = (Instant::now() + slice).min(deadline);
        loop {
            if let Some(handle) = driver.locate(strategy)? {
                tracing::debug!(
                    element = %spec.name,
                    strategy = %strategy,
                    candidate = index + 1,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "resolved"
                );
                return Ok(handle);
            }
            let now = Instant::now();
            if now >= slice_end {
                break;
            }
            std::thread::sleep(poll.min(slice_end - now));
        }
        tracing::debug!(element = %spec.name, strategy = %strategy, "candidate exhausted");
    }

    Err(HarnessError::ElementNotFound {
        element: spec.name.clone(),
        candidates: count,
        waited_ms: started.elapsed().as_millis() as u64,
    })
}

/// One immediate pass over every candidate, no waiting
pub fn probe(spec: &LocatorSpec, driver: &mut dyn DriverAdapter) -> HarnessResult<Option<ElementHandle>> {
    let mut guard = ImplicitWaitSuspended::new(driver)?;
    let driver = guard.driver();
    for strategy in &spec.candidates {
        if let Some(handle) = driver.locate(strategy)? {
            return Ok(Some(handle));
        }
    }
    Ok(None)
}

/// Number of matches for the first candidate that matches anything
pub fn count(spec: &LocatorSpec, driver: &mut dyn DriverAdapter) -> HarnessResult<usize> {
    let mut guard = ImplicitWaitSuspended::new(driver)?;
    let driver = guard.driver();
    for strategy in &spec.candidates {
        let found = driver.locate_all(strategy)?.len();
        if found > 0 {
            return Ok(found);
        }
    }
    Ok(0)
}

/// Wait until `spec` matches nothing
pub fn await_absent(spec: &LocatorSpec, session: &mut Session) -> HarnessResult<()> {
    let explicit = session.explicit_wait();
    let poll = session.policy().poll_interval;
    let driver = session.driver()?;
    let condition = format!("{} to disappear", spec.name);
    wait::await_condition(&condition, explicit, poll, || {
        Ok(probe(spec, &mut *driver)?.is_none())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement, MockPage};

    fn spec() -> LocatorSpec {
        LocatorSpec::new(
            "email field",
            vec![Strategy::test_id("email-input"), Strategy::css("input[type=\"email\"]")],
        )
        .or(Strategy::name("email"))
    }

    #[test]
    fn test_fallback_candidate_wins() {
        let page = MockPage::new("http://app.test/")
            .with_element(MockElement::new("email").matching(Strategy::name("email")));
        let mut driver = MockDriver::new(page);

        let handle = resolve_within(
            &spec(),
            &mut driver,
            Duration::from_millis(90),
            Duration::from_millis(10),
        )
        .unwrap();
        assert_eq!(handle.id, "email");
        assert_eq!(handle.located_by, Strategy::name("email"));
    }

    #[test]
    fn test_first_candidate_preferred() {
        let page = MockPage::new("http://app.test/")
            .with_element(MockElement::new("a").matching(Strategy::name("email")))
            .with_element(MockElement::new("b").matching(Strategy::test_id("email-input")));
        let mut driver = MockDriver::new(page);
        let handle =
            resolve_within(&spec(), &mut driver, Duration::from_millis(90), Duration::from_millis(10))
                .unwrap();
        assert_eq!(handle.id, "b");
        assert_eq!(driver.probe().lookups(), 1);
    }

    #[test]
    fn test_empty_spec_fails_fast() {
        let mut driver = MockDriver::new(MockPage::new("http://app.test/"));
        let empty = LocatorSpec::new("nothing", Vec::new());
        let err = resolve_within(&empty, &mut driver, Duration::from_secs(5), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, HarnessError::ElementNotFound { candidates: 0, .. }));
    }

    #[test]
    fn test_map_text_rewrites_strategies() {
        let spec = LocatorSpec::single("book {n}", Strategy::text("h3", "Book {n}"));
        let mapped = spec.map_text(|s| s.replace("{n}", "42"));
        assert_eq!(mapped.name, "book 42");
        assert_eq!(mapped.candidates[0], Strategy::text("h3", "Book 42"));
    }

    #[test]
    fn test_count_uses_first_matching_candidate() {
        let page = MockPage::new("http://app.test/")
            .with_element(MockElement::new("x").matching(Strategy::name("email")))
            .with_element(MockElement::new("y").matching(Strategy::name("email")));
        let mut driver = MockDriver::new(page);
        assert_eq!(count(&spec(), &mut driver).unwrap(), 2);
    }
}
