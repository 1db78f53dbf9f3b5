//! W3C WebDriver adapter built on fantoccini.
//!
//! fantoccini is async; this adapter owns a current-thread tokio runtime and
//! blocks on each command, so the engine sees plain synchronous round trips.

use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::runtime::Runtime;

use super::adapter::DriverAdapter;
use super::types::{
    Cookie, DriverError, DriverResult, ElementAction, ElementHandle, Strategy, WindowSize,
};

/// Options for launching the remote browser
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    /// WebDriver endpoint (chromedriver, geckodriver, selenium grid)
    pub endpoint: String,
    pub headless: bool,
    pub window: WindowSize,
}

impl WebDriverConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headless: true,
            window: WindowSize::new(1920, 1080),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn window(mut self, window: WindowSize) -> Self {
        self.window = window;
        self
    }

    /// Chrome capabilities equivalent to the flags the suite has always used
    pub fn capabilities(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            format!("--window-size={},{}", self.window.width, self.window.height),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }

        let mut caps = serde_json::Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps
    }
}

/// Live browser session behind a WebDriver endpoint
pub struct WebDriverAdapter {
    runtime: Runtime,
    client: Option<Client>,
    elements: HashMap<String, Element>,
    next_element: u64,
    implicit_wait: Duration,
}

impl WebDriverAdapter {
    /// Open a new browser session
    pub fn connect(config: &WebDriverConfig) -> DriverResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DriverError::Transport(format!("failed to start runtime: {}", e)))?;

        tracing::info!(endpoint = %config.endpoint, headless = config.headless, "connecting to WebDriver");

        let mut builder = ClientBuilder::rustls()
            .map_err(|e| DriverError::Transport(format!("cannot load TLS roots: {}", e)))?;
        builder.capabilities(config.capabilities());

        let client = runtime
            .block_on(builder.connect(&config.endpoint))
            .map_err(|e| {
                DriverError::NotConnected(format!(
                    "cannot open a session at {}: {}",
                    config.endpoint, e
                ))
            })?;

        Ok(Self {
            runtime,
            client: Some(client),
            elements: HashMap::new(),
            next_element: 0,
            implicit_wait: Duration::ZERO,
        })
    }

    fn client(&self) -> DriverResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| DriverError::NotConnected("session already closed".to_string()))
    }

    fn element(&self, handle: &ElementHandle) -> DriverResult<&Element> {
        self.elements
            .get(&handle.id)
            .ok_or_else(|| DriverError::StaleElement(handle.id.clone()))
    }

    fn remember(&mut self, element: Element, strategy: &Strategy) -> ElementHandle {
        self.next_element += 1;
        let id = format!("el-{}", self.next_element);
        self.elements.insert(id.clone(), element);
        ElementHandle {
            id,
            located_by: strategy.clone(),
        }
    }
}

/// Map a strategy onto a fantoccini locator, keeping any derived string alive
fn with_locator<T>(strategy: &Strategy, f: impl FnOnce(Locator<'_>) -> T) -> T {
    match strategy {
        Strategy::Css { selector } => f(Locator::Css(selector)),
        Strategy::Id { id } => f(Locator::Id(id)),
        Strategy::Name { name } => {
            let css = format!("[name=\"{}\"]", name);
            f(Locator::Css(&css))
        }
        Strategy::XPath { expr } => f(Locator::XPath(expr)),
        Strategy::LinkText { text } => f(Locator::LinkText(text)),
        Strategy::Text { tag, contains } => {
            let xpath = Strategy::text_xpath(tag, contains);
            f(Locator::XPath(&xpath))
        }
    }
}

fn cmd(err: CmdError) -> DriverError {
    DriverError::Transport(err.to_string())
}

impl DriverAdapter for WebDriverAdapter {
    fn name(&self) -> &str {
        "webdriver"
    }

    fn navigate(&mut self, url: &str) -> DriverResult<()> {
        let client = self.client()?.clone();
        self.runtime.block_on(client.goto(url)).map_err(cmd)?;
        // Handles from the previous document are dead after navigation
        self.elements.clear();
        tracing::debug!(url, "navigated");
        Ok(())
    }

    fn current_url(&mut self) -> DriverResult<String> {
        let client = self.client()?.clone();
        let url = self.runtime.block_on(client.current_url()).map_err(cmd)?;
        Ok(url.to_string())
    }

    fn title(&mut self) -> DriverResult<String> {
        let client = self.client()?.clone();
        self.runtime.block_on(client.title()).map_err(cmd)
    }

    fn page_source(&mut self) -> DriverResult<String> {
        let client = self.client()?.clone();
        self.runtime.block_on(client.source()).map_err(cmd)
    }

    fn locate(&mut self, strategy: &Strategy) -> DriverResult<Option<ElementHandle>> {
        let client = self.client()?.clone();
        let found = with_locator(strategy, |locator| {
            self.runtime.block_on(client.find(locator))
        });
        match found {
            Ok(element) => Ok(Some(self.remember(element, strategy))),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(cmd(e)),
        }
    }

    fn locate_all(&mut self, strategy: &Strategy) -> DriverResult<Vec<ElementHandle>> {
        let client = self.client()?.clone();
        let found = with_locator(strategy, |locator| {
            self.runtime.block_on(client.find_all(locator))
        })
        .map_err(cmd)?;
        Ok(found
            .into_iter()
            .map(|element| self.remember(element, strategy))
            .collect())
    }

    fn act(&mut self, handle: &ElementHandle, action: &ElementAction) -> DriverResult<()> {
        let element = self.element(handle)?.clone();
        let result = self.runtime.block_on(async {
            match action {
                ElementAction::Click => element.click().await,
                ElementAction::Clear => element.clear().await,
                ElementAction::SendKeys(text) => element.send_keys(text).await,
                ElementAction::Fill(text) => match element.clear().await {
                    Ok(()) => element.send_keys(text).await,
                    Err(e) => Err(e),
                },
            }
        });
        result.map_err(cmd)
    }

    fn is_displayed(&mut self, handle: &ElementHandle) -> DriverResult<bool> {
        let element = self.element(handle)?.clone();
        self.runtime.block_on(element.is_displayed()).map_err(cmd)
    }

    fn execute_script(&mut self, script: &str) -> DriverResult<serde_json::Value> {
        let client = self.client()?.clone();
        self.runtime
            .block_on(client.execute(script, Vec::new()))
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    fn screenshot(&mut self) -> DriverResult<Vec<u8>> {
        let client = self.client()?.clone();
        self.runtime.block_on(client.screenshot()).map_err(cmd)
    }

    fn cookies(&mut self) -> DriverResult<Vec<Cookie>> {
        let client = self.client()?.clone();
        let cookies = self.runtime.block_on(client.get_all_cookies()).map_err(cmd)?;
        Ok(cookies
            .iter()
            .map(|c| Cookie::new(c.name(), c.value()))
            .collect())
    }

    fn add_cookie(&mut self, cookie: &Cookie) -> DriverResult<()> {
        let client = self.client()?.clone();
        let cookie = fantoccini::cookies::Cookie::new(cookie.name.clone(), cookie.value.clone());
        self.runtime.block_on(client.add_cookie(cookie)).map_err(cmd)
    }

    fn delete_cookies(&mut self) -> DriverResult<()> {
        let client = self.client()?.clone();
        self.runtime
            .block_on(client.delete_all_cookies())
            .map_err(cmd)
    }

    fn window_size(&mut self) -> DriverResult<WindowSize> {
        let client = self.client()?.clone();
        let (width, height) = self
            .runtime
            .block_on(client.get_window_size())
            .map_err(cmd)?;
        Ok(WindowSize::new(width as u32, height as u32))
    }

    fn set_window_size(&mut self, size: WindowSize) -> DriverResult<()> {
        let client = self.client()?.clone();
        self.runtime
            .block_on(client.set_window_size(size.width, size.height))
            .map_err(cmd)
    }

    fn implicit_wait(&self) -> Duration {
        self.implicit_wait
    }

    fn set_implicit_wait(&mut self, wait: Duration) -> DriverResult<()> {
        let client = self.client()?.clone();
        let timeouts = TimeoutConfiguration::new(None, None, Some(wait));
        self.runtime
            .block_on(client.update_timeouts(timeouts))
            .map_err(cmd)?;
        self.implicit_wait = wait;
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.elements.clear();
        match self.client.take() {
            Some(client) => {
                tracing::info!("closing WebDriver session");
                self.runtime.block_on(client.close()).map_err(cmd)
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_headless() {
        let caps = WebDriverConfig::new("http://localhost:9515")
            .window(WindowSize::new(1280, 720))
            .capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args.iter().any(|a| a == "--window-size=1280,720"));
        assert!(args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn test_capabilities_headed() {
        let caps = WebDriverConfig::new("http://localhost:9515")
            .headless(false)
            .capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a.as_str().unwrap_or("").starts_with("--headless")));
    }
}
