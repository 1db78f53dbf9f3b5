use std::process::ExitCode;

use library_acceptance::driver::{DriverAdapter, WebDriverAdapter, WebDriverConfig};
use library_acceptance::scenario::Check;
use library_acceptance::{Credentials, Session, SessionOptions, config, evaluate_check, library, logging};

/// Quick reachability check: load the base URL, then log in once.
fn main() -> ExitCode {
    logging::init(false);
    let cfg = config::get();

    let driver_config = WebDriverConfig::new(&cfg.target.webdriver_url)
        .headless(cfg.browser.headless)
        .window(cfg.browser.window);

    let mut session = Session::new(SessionOptions::from_config(cfg));
    if let Err(e) = session.open(|| {
        WebDriverAdapter::connect(&driver_config).map(|d| Box::new(d) as Box<dyn DriverAdapter>)
    }) {
        eprintln!("Smoke failed: {}", e);
        return ExitCode::from(1);
    }

    let ok = match session.begin("smoke") {
        Ok(()) => {
            let loaded = evaluate_check(&Check::PageLongerThan { chars: 100 }, &mut session).unwrap_or(false);
            println!("Page load: {}", if loaded { "ok" } else { "empty page" });

            let credentials = Credentials::from(&cfg.credentials);
            let attempt = library::auth_flow().attempt(&mut session, &credentials);
            match &attempt.cause {
                None => println!("Login: ok"),
                Some(cause) => println!("Login: failed ({})", cause),
            }
            let _ = session.end();
            loaded && attempt.success
        }
        Err(e) => {
            eprintln!("Base URL did not load: {}", e);
            false
        }
    };

    if let Err(e) = session.close() {
        eprintln!("Teardown failed: {}", e);
        return ExitCode::from(1);
    }

    if ok { ExitCode::SUCCESS } else { ExitCode::from(1) }
}
