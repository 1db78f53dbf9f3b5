//! Integration tests for the login precondition

use std::time::Duration;

use library_acceptance::driver::{MockDriver, MockElement, MockOp, MockPage, MockProbe, Strategy};
use library_acceptance::library::{self, SimulatedLibrary};
use library_acceptance::{Credentials, Session, SessionOptions, WaitPolicy};

const BASE: &str = "http://app.test";

fn options() -> SessionOptions {
    SessionOptions::new(BASE)
        .policy(WaitPolicy::new(
            Duration::from_millis(200),
            Duration::from_millis(10),
            Duration::ZERO,
        ))
        .settle(Duration::ZERO)
}

fn credentials() -> Credentials {
    Credentials::new("reader@test.com", "open sesame")
}

fn open(driver: MockDriver) -> (Session, MockProbe) {
    let probe = driver.probe();
    let mut session = Session::new(options());
    session.open(|| Ok(Box::new(driver))).unwrap();
    session.begin("login").unwrap();
    (session, probe)
}

/// A login form whose submit button replaces the page with `after`
fn form_page(after: &'static str, keep_form: bool) -> MockDriver {
    let page = MockPage::new(BASE)
        .with_source("<form>sign in</form>")
        .with_element(MockElement::new("email"))
        .with_element(MockElement::new("password"))
        .with_element(MockElement::new("submit").matching(Strategy::css("button[type=\"submit\"]")));
    MockDriver::new(page).on_click("submit", move |page| {
        page.source = after.to_string();
        if !keep_form {
            page.remove("email");
            page.remove("password");
            page.remove("submit");
        }
    })
}

#[test]
fn test_valid_credentials_log_in() {
    let app = SimulatedLibrary::new(credentials());
    let (mut session, probe) = open(app.driver(BASE));

    let attempt = library::auth_flow().attempt(&mut session, &credentials());
    assert!(attempt.success, "cause: {:?}", attempt.cause);
    assert!(attempt.submitted);
    assert!(session.is_authenticated());
    assert!(app.is_logged_in());
    assert_eq!(probe.clicks("login-submit"), 1);
}

#[test]
fn test_second_login_does_not_resubmit() {
    let app = SimulatedLibrary::new(credentials());
    let (mut session, probe) = open(app.driver(BASE));
    let auth = library::auth_flow();

    assert!(auth.login(&mut session, &credentials()));
    let again = auth.attempt(&mut session, &credentials());

    assert!(again.success);
    assert!(!again.submitted);
    assert_eq!(probe.clicks("login-submit"), 1);
}

#[test]
fn test_wrong_password_is_false_not_error() {
    let app = SimulatedLibrary::new(credentials());
    let (mut session, _probe) = open(app.driver(BASE));

    let attempt = library::auth_flow().attempt(&mut session, &Credentials::new("reader@test.com", "nope"));
    assert!(!attempt.success);
    assert!(!session.is_authenticated());
    let cause = attempt.cause.unwrap();
    assert!(cause.contains("login success"), "cause: {}", cause);
    assert!(cause.contains("error message"), "cause: {}", cause);
}

#[test]
fn test_form_gone_without_keyword_is_not_success() {
    let (mut session, _probe) = open(form_page("<p>thanks</p>", false));
    assert!(!library::auth_flow().login(&mut session, &credentials()));
}

#[test]
fn test_keyword_with_form_still_present_is_not_success() {
    let (mut session, _probe) = open(form_page("<h1>Welcome to your dashboard</h1>", true));
    assert!(!library::auth_flow().login(&mut session, &credentials()));
}

#[test]
fn test_keyword_and_form_gone_is_success() {
    let (mut session, probe) = open(form_page("<h1>Welcome</h1><button>Logout</button>", false));
    assert!(library::auth_flow().login(&mut session, &credentials()));
    assert_eq!(probe.value("email"), None);
    assert_eq!(probe.clicks("submit"), 1);
}

#[test]
fn test_driver_fault_is_false_not_panic() {
    let app = SimulatedLibrary::new(credentials());
    let (mut session, probe) = open(app.driver(BASE));
    probe.fail(MockOp::Act);

    let attempt = library::auth_flow().attempt(&mut session, &credentials());
    assert!(!attempt.success);
    assert!(attempt.cause.is_some());
    assert!(!session.is_authenticated());
}
