//! Integration tests for the reachability check run before the first scenario

use std::time::Duration;

use httpmock::prelude::*;

use library_acceptance::driver::{MockDriver, MockPage};
use library_acceptance::{HarnessError, Session, SessionOptions, SessionState, check_target};

// Nothing listens on port 1
const DEAD_URL: &str = "http://127.0.0.1:1/";

#[test]
fn test_ok_status_is_reachable() {
    let server = MockServer::start();
    let root = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("<html>Digital Library</html>");
    });

    let status = check_target(&server.url("/"), Duration::from_secs(5)).unwrap();
    assert_eq!(status, 200);
    root.assert();
}

#[test]
fn test_error_status_still_reachable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(503);
    });

    assert_eq!(check_target(&server.url("/"), Duration::from_secs(5)).unwrap(), 503);
}

#[test]
fn test_unreachable_target_is_setup_failure() {
    let err = check_target(DEAD_URL, Duration::from_secs(2)).unwrap_err();
    assert!(matches!(err, HarnessError::SessionSetupFailed(_)), "got {:?}", err);
}

#[test]
fn test_open_probes_target() {
    let server = MockServer::start();
    let root = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200);
    });

    let mut options = SessionOptions::new(server.url("/")).probe_target(true).settle(Duration::ZERO);
    options.probe_timeout = Duration::from_secs(5);
    let mut session = Session::new(options);
    session.open(|| Ok(Box::new(MockDriver::new(MockPage::new("about:blank"))))).unwrap();

    assert_eq!(session.state(), SessionState::Ready);
    root.assert_hits(1);
}

#[test]
fn test_failed_probe_releases_driver() {
    let driver = MockDriver::new(MockPage::new("about:blank"));
    let probe = driver.probe();

    let mut options = SessionOptions::new(DEAD_URL).probe_target(true);
    options.probe_timeout = Duration::from_secs(2);
    let mut session = Session::new(options);
    let err = session.open(|| Ok(Box::new(driver))).unwrap_err();

    assert!(matches!(err, HarnessError::SessionSetupFailed(_)));
    assert!(probe.is_closed());
    assert_eq!(session.state(), SessionState::Uninitialized);
}
