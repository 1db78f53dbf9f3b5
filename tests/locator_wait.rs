//! Integration tests for bounded element resolution

use std::time::{Duration, Instant};

use library_acceptance::driver::{DriverAdapter, MockDriver, MockElement, MockPage, Strategy};
use library_acceptance::locator::{self, LocatorSpec};
use library_acceptance::{HarnessError, Session, SessionOptions, WaitPolicy, await_condition};

fn three_way_spec() -> LocatorSpec {
    LocatorSpec::new(
        "add book button",
        vec![
            Strategy::test_id("add-book-button"),
            Strategy::test_id("toggle-add-form"),
            Strategy::text("button", "Add Book"),
        ],
    )
}

#[test]
fn test_missing_element_bounded_by_explicit_wait() {
    let mut driver = MockDriver::new(MockPage::new("http://app.test/"));
    let probe = driver.probe();
    let explicit = Duration::from_millis(300);
    let poll = Duration::from_millis(20);

    let started = Instant::now();
    let err = locator::resolve_within(&three_way_spec(), &mut driver, explicit, poll).unwrap_err();
    let elapsed = started.elapsed();

    match err {
        HarnessError::ElementNotFound { element, candidates, .. } => {
            assert_eq!(element, "add book button");
            assert_eq!(candidates, 3);
        }
        other => panic!("expected ElementNotFound, got {:?}", other),
    }
    assert!(elapsed >= Duration::from_millis(250), "gave up early: {:?}", elapsed);
    assert!(elapsed < explicit + poll + Duration::from_millis(150), "overran: {:?}", elapsed);
    // every candidate got at least one lookup
    assert!(probe.lookups() >= 3);
}

fn many_candidates(n: usize) -> LocatorSpec {
    let candidates = (0..n).map(|i| Strategy::test_id(&format!("variant-{}", i))).collect();
    LocatorSpec::new("shelf", candidates)
}

#[test]
fn test_many_candidates_stay_within_explicit_wait() {
    // 50 candidates at a 10ms poll would need 500ms if every slice ran in full
    let mut driver = MockDriver::new(MockPage::new("http://app.test/"));
    let probe = driver.probe();
    let explicit = Duration::from_millis(200);
    let poll = Duration::from_millis(10);

    let started = Instant::now();
    let err = locator::resolve_within(&many_candidates(50), &mut driver, explicit, poll).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, HarnessError::ElementNotFound { candidates: 50, .. }), "got {:?}", err);
    assert!(elapsed < explicit + Duration::from_millis(100), "overran: {:?}", elapsed);
    assert!(probe.lookups() >= 50);
}

#[test]
fn test_last_of_many_candidates_still_checked() {
    let page = MockPage::new("http://app.test/")
        .with_element(MockElement::new("shelf").matching(Strategy::test_id("variant-49")));
    let mut driver = MockDriver::new(page);

    let started = Instant::now();
    let handle = locator::resolve_within(
        &many_candidates(50),
        &mut driver,
        Duration::from_millis(200),
        Duration::from_millis(10),
    )
    .unwrap();

    assert_eq!(handle.id, "shelf");
    assert!(started.elapsed() < Duration::from_millis(300));
}

#[test]
fn test_late_element_found_by_later_candidate() {
    let page = MockPage::new("http://app.test/").with_element(
        MockElement::new("toggle")
            .matching(Strategy::test_id("toggle-add-form"))
            .appears_after(Duration::from_millis(60)),
    );
    let mut driver = MockDriver::new(page);

    let handle = locator::resolve_within(
        &three_way_spec(),
        &mut driver,
        Duration::from_millis(600),
        Duration::from_millis(10),
    )
    .unwrap();
    assert_eq!(handle.id, "toggle");
    assert_eq!(handle.located_by, Strategy::test_id("toggle-add-form"));
}

#[test]
fn test_implicit_wait_suspended_during_resolution() {
    let mut driver = MockDriver::new(MockPage::new("http://app.test/"));
    let probe = driver.probe();
    driver.set_implicit_wait(Duration::from_secs(5)).unwrap();

    let started = Instant::now();
    let result = locator::resolve_within(
        &three_way_spec(),
        &mut driver,
        Duration::from_millis(90),
        Duration::from_millis(10),
    );
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(1), "implicit wait leaked into polling");
    assert_eq!(probe.implicit_wait(), Duration::from_secs(5));
}

#[test]
fn test_exhausted_run_budget_makes_waits_instant() {
    let driver = MockDriver::new(MockPage::new("about:blank"));
    let options = SessionOptions::new("http://app.test")
        .policy(WaitPolicy::new(
            Duration::from_secs(5),
            Duration::from_millis(10),
            Duration::ZERO,
        ))
        .settle(Duration::ZERO)
        .run_budget(Duration::from_millis(30));
    let mut session = Session::new(options);
    session.open(|| Ok(Box::new(driver))).unwrap();

    std::thread::sleep(Duration::from_millis(40));
    assert!(session.budget().is_exhausted());
    assert_eq!(session.explicit_wait(), Duration::ZERO);

    let started = Instant::now();
    assert!(locator::resolve(&three_way_spec(), &mut session).is_err());
    assert!(started.elapsed() < Duration::from_millis(200));
}

#[test]
fn test_await_condition_is_a_hard_cutoff() {
    let mut polls = 0;
    let started = Instant::now();
    let err = await_condition("never", Duration::from_millis(100), Duration::from_millis(15), || {
        polls += 1;
        Ok(false)
    })
    .unwrap_err();

    assert!(matches!(err, HarnessError::TimeoutExceeded { .. }));
    assert!(polls >= 2);
    assert!(started.elapsed() < Duration::from_millis(250));
}
