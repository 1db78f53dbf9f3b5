//! Placeholder substitution for step payloads.
//!
//! Recognized placeholders: `{run_token}`, `{email}`, `{password}`,
//! `{base_url}`. Anything else is left as written.

use chrono::Utc;

use crate::auth::Credentials;
use crate::locator::LocatorSpec;

use super::types::Check;

#[derive(Debug, Clone)]
pub struct TemplateVars {
    /// Unique per suite run, so data created by one scenario can be found by a later one
    pub run_token: String,
    pub email: String,
    pub password: String,
    pub base_url: String,
}

impl TemplateVars {
    pub fn new(credentials: &Credentials, base_url: impl Into<String>) -> Self {
        Self {
            run_token: generate_run_token(),
            email: credentials.email.clone(),
            password: credentials.password.clone(),
            base_url: base_url.into(),
        }
    }

    pub fn with_run_token(mut self, token: impl Into<String>) -> Self {
        self.run_token = token.into();
        self
    }

    pub fn render(&self, text: &str) -> String {
        if !text.contains('{') {
            return text.to_string();
        }
        text.replace("{run_token}", &self.run_token)
            .replace("{email}", &self.email)
            .replace("{password}", &self.password)
            .replace("{base_url}", &self.base_url)
    }

    pub fn render_spec(&self, spec: &LocatorSpec) -> LocatorSpec {
        spec.map_text(|s| self.render(s))
    }

    pub fn render_check(&self, check: &Check) -> Check {
        let all = |items: &[String]| items.iter().map(|s| self.render(s)).collect::<Vec<_>>();
        match check {
            Check::TitleContains { text } => Check::TitleContains {
                text: self.render(text),
            },
            Check::UrlContainsAny { keywords } => Check::UrlContainsAny {
                keywords: all(keywords),
            },
            Check::PageContains { text } => Check::PageContains {
                text: self.render(text),
            },
            Check::PageContainsAny { keywords, min } => Check::PageContainsAny {
                keywords: all(keywords),
                min: *min,
            },
            Check::PageLongerThan { chars } => Check::PageLongerThan { chars: *chars },
            Check::ElementPresent { target } => Check::ElementPresent {
                target: self.render_spec(target),
            },
            Check::ElementAbsent { target } => Check::ElementAbsent {
                target: self.render_spec(target),
            },
            Check::ElementDisplayed { target } => Check::ElementDisplayed {
                target: self.render_spec(target),
            },
            Check::ElementCountAtLeast { target, min } => Check::ElementCountAtLeast {
                target: self.render_spec(target),
                min: *min,
            },
            Check::ScriptEquals { script, expected } => Check::ScriptEquals {
                script: self.render(script),
                expected: expected.clone(),
            },
            Check::AnyOf { checks } => Check::AnyOf {
                checks: checks.iter().map(|c| self.render_check(c)).collect(),
            },
        }
    }
}

/// Short token from the wall clock, e.g. `1019153045`
pub fn generate_run_token() -> String {
    Utc::now().format("%m%d%H%M%S").to_string()
}
