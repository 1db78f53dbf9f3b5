//! Everything specific to the Digital Library application: locators, the
//! built-in suite, the login flow and a simulated app for offline runs.

pub mod locators;
pub mod scenarios;
pub mod sim;

pub use scenarios::suite;
pub use sim::SimulatedLibrary;

use crate::auth::{AuthFlow, LoginForm, LoginSignals};

/// Login procedure for the Digital Library
pub fn auth_flow() -> AuthFlow {
    AuthFlow::new(
        LoginForm {
            email: locators::email_field(),
            password: locators::password_field(),
            submit: locators::login_button(),
        },
        LoginSignals::default(),
    )
}
