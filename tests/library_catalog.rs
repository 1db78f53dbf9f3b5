//! The built-in suite end to end against the simulated Digital Library

use std::time::Duration;

use library_acceptance::driver::DriverAdapter;
use library_acceptance::library::{self, SimulatedLibrary};
use library_acceptance::{
    Credentials, MemoryStore, Outcome, ScenarioRunner, SessionOptions, SuiteDefinition, SuiteReport, TemplateVars,
    WaitPolicy, run,
};

const BASE: &str = "http://library.test";

fn credentials() -> Credentials {
    Credentials::new("peterparker@gmail.com", "peterparker")
}

fn run_catalog(app: &SimulatedLibrary, suite: &SuiteDefinition, store: &MemoryStore) -> SuiteReport {
    let options = SessionOptions::new(BASE)
        .policy(WaitPolicy::new(
            Duration::from_millis(200),
            Duration::from_millis(10),
            Duration::ZERO,
        ))
        .settle(Duration::ZERO);
    let vars = TemplateVars::new(&credentials(), BASE).with_run_token("1019120000");
    let mut runner =
        ScenarioRunner::new(library::auth_flow(), credentials(), vars).with_artifacts(Box::new(store.clone()));
    let driver = app.driver(BASE);

    run(
        &suite.name,
        &suite.scenarios,
        options,
        move || Ok(Box::new(driver) as Box<dyn DriverAdapter>),
        &mut runner,
        |_| {},
    )
    .unwrap()
}

#[test]
fn test_full_suite_passes() {
    let app = SimulatedLibrary::new(credentials());
    let store = MemoryStore::new();

    let report = run_catalog(&app, &library::suite(), &store);

    let failures: Vec<String> = report
        .failures()
        .map(|r| format!("{}: {}", r.name, r.message.as_deref().unwrap_or("")))
        .collect();
    assert!(failures.is_empty(), "failures: {:#?}", failures);
    assert_eq!(report.total, 18);
    assert_eq!(report.exit_code(), 0);
    assert!(store.is_empty());

    let books = app.books();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Test Book 1019120000");
    assert_eq!(books[0].author, "Test Author");
    assert!(books[0].favorite);
    // the suite ends with a logout
    assert!(!app.is_logged_in());
}

#[test]
fn test_heuristic_verdicts_recorded() {
    let app = SimulatedLibrary::new(credentials());
    let store = MemoryStore::new();

    let report = run_catalog(&app, &library::suite(), &store);

    let verdict = |name: &str| {
        let result = report.results.iter().find(|r| r.name == name).unwrap();
        assert_eq!(result.outcome, Outcome::Passed, "{}", name);
        result.verdict.clone().unwrap()
    };

    let status = verdict("status sections");
    assert_eq!((status.score, status.max_score), (3.0, 3.0));
    // only the page header stands in for navigation
    let navigation = verdict("navigation");
    assert_eq!((navigation.score, navigation.max_score), (1.0, 2.0));
    let health = verdict("overall functionality");
    assert_eq!((health.score, health.max_score), (4.0, 4.0));

    let bulk = report.results.iter().find(|r| r.name == "bulk operations").unwrap();
    assert!(bulk.indicators.iter().all(|i| i.fired));
}

#[test]
fn test_missing_favorites_fails_only_that_scenario() {
    let app = SimulatedLibrary::new(credentials()).favorites(false);
    let store = MemoryStore::new();

    let report = run_catalog(&app, &library::suite(), &store);

    let failed: Vec<&str> = report.failures().map(|r| r.name.as_str()).collect();
    assert_eq!(failed, vec!["favorites section"]);
    assert_eq!(report.passed, 17);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(store.len(), 1);

    let bookmark = report.results.iter().find(|r| r.name == "mark favorite").unwrap();
    assert_eq!(bookmark.outcome, Outcome::Passed);
}

#[test]
fn test_wrong_account_fails_login_scenarios() {
    let app = SimulatedLibrary::new(Credentials::new("someone@else.com", "other"));
    let store = MemoryStore::new();
    let suite = library::suite().filter(&[], Some("smoke"));

    let report = run_catalog(&app, &suite, &store);

    let valid = report.results.iter().find(|r| r.name == "valid login").unwrap();
    assert_eq!(valid.outcome, Outcome::Failed);
    assert!(valid.message.as_deref().unwrap_or("").contains("precondition not met"));

    let page_load = report.results.iter().find(|r| r.name == "page load").unwrap();
    assert_eq!(page_load.outcome, Outcome::Passed);
}
