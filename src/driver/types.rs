// Core types shared by every driver adapter

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One candidate way of finding an element on the page.
///
/// A `LocatorSpec` holds an ordered list of these; the resolver tries them in
/// declared order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Strategy {
    /// CSS selector, e.g. `[data-testid="logout-button"]`
    Css { selector: String },

    /// Element id attribute
    Id { id: String },

    /// Element name attribute
    Name { name: String },

    /// Raw XPath expression
    XPath { expr: String },

    /// Anchor whose text equals the given string
    LinkText { text: String },

    /// Element of `tag` whose normalized text contains `contains`
    Text { tag: String, contains: String },
}

impl Strategy {
    pub fn css(selector: impl Into<String>) -> Self {
        Strategy::Css { selector: selector.into() }
    }

    pub fn id(id: impl Into<String>) -> Self {
        Strategy::Id { id: id.into() }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Strategy::Name { name: name.into() }
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Strategy::XPath { expr: expr.into() }
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Strategy::LinkText { text: text.into() }
    }

    pub fn text(tag: impl Into<String>, contains: impl Into<String>) -> Self {
        Strategy::Text {
            tag: tag.into(),
            contains: contains.into(),
        }
    }

    /// Shorthand for `[data-testid="..."]`
    pub fn test_id(id: &str) -> Self {
        Strategy::css(format!("[data-testid=\"{}\"]", id))
    }

    /// XPath equivalent of a `Text` strategy.
    pub fn text_xpath(tag: &str, contains: &str) -> String {
        format!(
            "//{}[contains(normalize-space(.), {})]",
            tag,
            xpath_literal(contains)
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Css { selector } => write!(f, "css={}", selector),
            Strategy::Id { id } => write!(f, "id={}", id),
            Strategy::Name { name } => write!(f, "name={}", name),
            Strategy::XPath { expr } => write!(f, "xpath={}", expr),
            Strategy::LinkText { text } => write!(f, "link={}", text),
            Strategy::Text { tag, contains } => write!(f, "text={}~{}", tag, contains),
        }
    }
}

/// Quote a string for use inside an XPath expression.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Opaque reference to an element the driver has located.
///
/// Handles are only meaningful to the adapter that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Adapter-assigned identifier
    pub id: String,

    /// Strategy that produced this handle (diagnostics only)
    pub located_by: Strategy,
}

/// An interaction performed on a located element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum ElementAction {
    Click,
    Clear,
    SendKeys(String),
    /// Clear, then type
    Fill(String),
}

impl ElementAction {
    pub fn verb(&self) -> &'static str {
        match self {
            ElementAction::Click => "click",
            ElementAction::Clear => "clear",
            ElementAction::SendKeys(_) => "send_keys",
            ElementAction::Fill(_) => "fill",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Browser window dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Faults raised by a driver adapter.
///
/// "Element not present" is not an error at this layer; `locate` reports it
/// as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("driver session unavailable: {0}")]
    NotConnected(String),

    #[error("stale element handle: {0}")]
    StaleElement(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}
