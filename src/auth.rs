//! Login as a reusable precondition.
//!
//! `login` never returns an error: any internal failure becomes `false`, with
//! the cause kept on the `LoginAttempt` for diagnostics. Success needs a
//! positive signal (URL or page keyword) and the login form gone.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::CredentialSettings;
use crate::driver::ElementAction;
use crate::error::{HarnessError, HarnessResult};
use crate::locator::{self, LocatorSpec};
use crate::session::Session;
use crate::verify::Indicator;
use crate::wait;

pub const URL_KEYWORD: &str = "url_keyword";
pub const TEXT_KEYWORD: &str = "text_keyword";
pub const FORM_ABSENT: &str = "login_form_absent";
pub const ERROR_TEXT: &str = "error_text";

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl From<&CredentialSettings> for Credentials {
    fn from(settings: &CredentialSettings) -> Self {
        Self::new(settings.email.clone(), settings.password.clone())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the login form lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: LocatorSpec,
    pub password: LocatorSpec,
    pub submit: LocatorSpec,
}

/// Keywords that suggest how a submission went. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSignals {
    pub url_keywords: Vec<String>,
    pub text_keywords: Vec<String>,
    /// Recorded for diagnostics; never decides the outcome
    pub error_keywords: Vec<String>,
}

impl Default for LoginSignals {
    fn default() -> Self {
        Self {
            url_keywords: to_strings(&["dashboard", "home", "library"]),
            text_keywords: to_strings(&["dashboard", "welcome", "logout", "library"]),
            error_keywords: to_strings(&["invalid", "error", "wrong"]),
        }
    }
}

/// What one login call did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub success: bool,
    /// Whether the form was filled and submitted (false on re-validation)
    pub submitted: bool,
    pub indicators: Vec<Indicator>,
    pub cause: Option<String>,
}

impl LoginAttempt {
    fn failed(cause: String) -> Self {
        Self {
            success: false,
            submitted: false,
            indicators: Vec::new(),
            cause: Some(cause),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Observation {
    url_keyword: bool,
    text_keyword: bool,
    form_absent: bool,
    error_text: bool,
}

impl Observation {
    fn succeeded(&self) -> bool {
        (self.url_keyword || self.text_keyword) && self.form_absent
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::new(URL_KEYWORD, 1.0, self.url_keyword),
            Indicator::new(TEXT_KEYWORD, 1.0, self.text_keyword),
            Indicator::new(FORM_ABSENT, 1.0, self.form_absent),
            Indicator::new(ERROR_TEXT, 0.0, self.error_text),
        ]
    }
}

/// The authentication sub-procedure for one target
#[derive(Debug, Clone)]
pub struct AuthFlow {
    pub form: LoginForm,
    pub signals: LoginSignals,
}

impl AuthFlow {
    pub fn new(form: LoginForm, signals: LoginSignals) -> Self {
        Self { form, signals }
    }

    pub fn login(&self, session: &mut Session, credentials: &Credentials) -> bool {
        self.attempt(session, credentials).success
    }

    /// Log in and report what happened. Sets or clears the session's
    /// authenticated flag.
    pub fn attempt(&self, session: &mut Session, credentials: &Credentials) -> LoginAttempt {
        let attempt = match self.try_attempt(session, credentials) {
            Ok(attempt) => attempt,
            Err(e) => LoginAttempt::failed(e.to_string()),
        };
        session.set_authenticated(attempt.success);

        if attempt.success {
            tracing::info!(email = %credentials.email, submitted = attempt.submitted, "login succeeded");
        } else {
            tracing::warn!(
                email = %credentials.email,
                cause = attempt.cause.as_deref().unwrap_or("unknown"),
                "login failed"
            );
        }
        attempt
    }

    fn try_attempt(&self, session: &mut Session, credentials: &Credentials) -> HarnessResult<LoginAttempt> {
        if session.is_authenticated() {
            let form_visible = locator::probe(&self.form.email, session.driver()?)?.is_some();
            if !form_visible {
                return self.revalidate(session);
            }
        }

        let email = match locator::resolve(&self.form.email, session) {
            Ok(handle) => handle,
            // No form at all: maybe an earlier session is still logged in
            Err(HarnessError::ElementNotFound { .. }) => return self.revalidate(session),
            Err(e) => return Err(e),
        };
        let password = locator::resolve(&self.form.password, session)?;
        let submit = locator::resolve(&self.form.submit, session)?;

        let driver = session.driver()?;
        driver.act(&email, &ElementAction::Fill(credentials.email.clone()))?;
        driver.act(&password, &ElementAction::Fill(credentials.password.clone()))?;
        driver.act(&submit, &ElementAction::Click)?;
        tracing::debug!(email = %credentials.email, "login form submitted");

        let explicit = session.explicit_wait();
        let poll = session.policy().poll_interval;
        let mut last = Observation::default();
        let waited = wait::await_condition("login success", explicit, poll, || {
            last = self.observe(session)?;
            Ok(last.succeeded())
        });

        let cause = match waited {
            Ok(()) => None,
            Err(e @ HarnessError::TimeoutExceeded { .. }) => Some(if last.error_text {
                format!("{} (page shows an error message)", e)
            } else {
                e.to_string()
            }),
            Err(e) => return Err(e),
        };

        Ok(LoginAttempt {
            success: cause.is_none(),
            submitted: true,
            indicators: last.indicators(),
            cause,
        })
    }

    /// Judge the current page without submitting anything
    fn revalidate(&self, session: &mut Session) -> HarnessResult<LoginAttempt> {
        let observation = self.observe(session)?;
        let success = observation.succeeded();
        Ok(LoginAttempt {
            success,
            submitted: false,
            indicators: observation.indicators(),
            cause: (!success).then(|| "no login form and no signed-in signal".to_string()),
        })
    }

    fn observe(&self, session: &mut Session) -> HarnessResult<Observation> {
        let driver = session.driver()?;
        let url = driver.current_url()?.to_lowercase();
        let text = driver.page_source()?.to_lowercase();
        let form_absent = locator::probe(&self.form.email, driver)?.is_none();

        Ok(Observation {
            url_keyword: contains_any(&url, &self.signals.url_keywords),
            text_keyword: contains_any(&text, &self.signals.text_keywords),
            form_absent,
            error_text: contains_any(&text, &self.signals.error_keywords),
        })
    }
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
