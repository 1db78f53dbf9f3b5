//! The boundary between the engine and a remote browser.
//!
//! Implementations:
//! - `WebDriverAdapter` for a real browser behind a W3C WebDriver endpoint
//! - `MockDriver` for tests and simulated runs

use std::time::Duration;

use super::types::{Cookie, DriverResult, ElementAction, ElementHandle, Strategy, WindowSize};

/// A live browser session.
///
/// Every call is a blocking round trip. `locate` must honor the implicit wait
/// set through `set_implicit_wait`; the locator resolver turns that wait off
/// while it polls.
pub trait DriverAdapter: Send {
    /// Short identifier for logs (e.g. "webdriver", "mock")
    fn name(&self) -> &str;

    fn navigate(&mut self, url: &str) -> DriverResult<()>;

    fn current_url(&mut self) -> DriverResult<String>;

    fn title(&mut self) -> DriverResult<String>;

    /// Serialized DOM of the current page
    fn page_source(&mut self) -> DriverResult<String>;

    /// First element matching `strategy`, or `None` when nothing matches
    fn locate(&mut self, strategy: &Strategy) -> DriverResult<Option<ElementHandle>>;

    /// Every element matching `strategy` (empty when nothing matches)
    fn locate_all(&mut self, strategy: &Strategy) -> DriverResult<Vec<ElementHandle>>;

    fn act(&mut self, element: &ElementHandle, action: &ElementAction) -> DriverResult<()>;

    fn is_displayed(&mut self, element: &ElementHandle) -> DriverResult<bool>;

    fn execute_script(&mut self, script: &str) -> DriverResult<serde_json::Value>;

    /// PNG-encoded capture of the viewport
    fn screenshot(&mut self) -> DriverResult<Vec<u8>>;

    fn cookies(&mut self) -> DriverResult<Vec<Cookie>>;

    fn add_cookie(&mut self, cookie: &Cookie) -> DriverResult<()>;

    fn delete_cookies(&mut self) -> DriverResult<()>;

    fn window_size(&mut self) -> DriverResult<WindowSize>;

    fn set_window_size(&mut self, size: WindowSize) -> DriverResult<()>;

    /// Passive wait applied by the driver to every raw lookup
    fn implicit_wait(&self) -> Duration;

    fn set_implicit_wait(&mut self, wait: Duration) -> DriverResult<()>;

    /// Release the remote session. Calling it twice is harmless.
    fn close(&mut self) -> DriverResult<()>;
}
