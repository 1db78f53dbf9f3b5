//! Integration tests for suite runs and the report

use std::time::Duration;

use pretty_assertions::assert_eq;

use library_acceptance::driver::{DriverAdapter, DriverError, MockDriver, MockElement, MockOp, MockPage, Strategy};
use library_acceptance::library;
use library_acceptance::{
    Check, Credentials, HarnessError, LocatorSpec, Scenario, ScenarioRunner, SessionOptions, Step, SuiteProgress,
    SuiteReport, TemplateVars, WaitPolicy, run,
};

const BASE: &str = "http://app.test";

fn options() -> SessionOptions {
    SessionOptions::new(BASE)
        .policy(WaitPolicy::new(
            Duration::from_millis(100),
            Duration::from_millis(10),
            Duration::ZERO,
        ))
        .settle(Duration::ZERO)
}

fn runner() -> ScenarioRunner {
    let credentials = Credentials::new("reader@test.com", "secret");
    let vars = TemplateVars::new(&credentials, BASE);
    ScenarioRunner::new(library::auth_flow(), credentials, vars).capture_failures(false)
}

fn driver() -> MockDriver {
    MockDriver::new(
        MockPage::new(BASE)
            .with_title("Digital Library")
            .with_element(MockElement::new("save"))
            .with_element(MockElement::new("broken")),
    )
}

fn scenarios() -> Vec<Scenario> {
    let save = LocatorSpec::single("save", Strategy::id("save"));
    vec![
        Scenario::new("passes").step(Step::assert("title", Check::TitleContains { text: "Library".into() })),
        Scenario::new("fails").step(Step::assert("title", Check::TitleContains { text: "Bookshop".into() })),
        Scenario::new("errors").step(Step::script("explode", "throw new Error()")),
        Scenario::new("passes again").step(Step::click("save", save)),
    ]
}

fn run_with(driver: MockDriver) -> Result<SuiteReport, HarnessError> {
    run(
        "mixed",
        &scenarios(),
        options(),
        move || Ok(Box::new(driver) as Box<dyn DriverAdapter>),
        &mut runner(),
        |_| {},
    )
}

#[test]
fn test_counts_add_up() {
    let driver = driver();
    let probe = driver.probe();
    probe.fail(MockOp::Script);

    let report = run_with(driver).unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.passed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errored, 1);
    assert_eq!(report.total, report.passed + report.failed + report.errored);
    assert_eq!(report.success_rate, 0.5);
    assert_eq!(report.exit_code(), 1);

    let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["passes", "fails", "errors", "passes again"]);

    let summary = report.summary();
    assert!(summary.contains("Success:   50.0%"));
    assert!(summary.contains("FAIL fails:"));
    assert!(summary.contains("ERROR errors:"));
}

#[test]
fn test_driver_released_after_run() {
    let driver = driver();
    let probe = driver.probe();

    let report = run_with(driver).unwrap();

    assert!(probe.is_closed());
    assert_eq!(report.teardown_error, None);
}

#[test]
fn test_teardown_fault_recorded() {
    let driver = driver().failing(MockOp::Close);

    let report = run(
        "teardown",
        &scenarios()[..1],
        options(),
        move || Ok(Box::new(driver) as Box<dyn DriverAdapter>),
        &mut runner(),
        |_| {},
    )
    .unwrap();

    assert_eq!(report.passed, 1);
    assert!(report.teardown_error.is_some());
    assert!(!report.is_success());
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn test_setup_failure_is_fatal() {
    let result = run(
        "unreachable",
        &scenarios(),
        options(),
        || Err(DriverError::NotConnected("connection refused".into())),
        &mut runner(),
        |_| {},
    );

    match result {
        Err(HarnessError::SessionSetupFailed(message)) => assert!(message.contains("connection refused")),
        other => panic!("expected SessionSetupFailed, got {:?}", other.map(|r| r.total)),
    }
}

#[test]
fn test_progress_events_in_order() {
    let mut events = Vec::new();
    let driver = driver();

    let report = run(
        "progress",
        &scenarios()[..2],
        options(),
        move || Ok(Box::new(driver) as Box<dyn DriverAdapter>),
        &mut runner(),
        |p| {
            events.push(match p {
                SuiteProgress::Started { total } => format!("start {}", total),
                SuiteProgress::ScenarioStarted { index, name, .. } => format!("begin {} {}", index, name),
                SuiteProgress::ScenarioFinished { index, result, .. } => format!("end {} {}", index, result.outcome),
                SuiteProgress::Finished => "finish".to_string(),
            })
        },
    )
    .unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(
        events,
        vec!["start 2", "begin 1 passes", "end 1 PASS", "begin 2 fails", "end 2 FAIL", "finish"]
    );
}

#[test]
fn test_json_report_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    let report = run_with(driver()).unwrap();
    report.write_json(&path).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed["suite"], "mixed");
    assert_eq!(parsed["total"], 4);
    assert_eq!(parsed["results"][1]["outcome"], "failed");
    assert!(parsed.get("teardown_error").is_none());
}
