//! In-memory driver for tests and simulated runs.
//!
//! `MockDriver` models one page as a list of elements, each reachable through
//! one or more strategies. Elements can render late (`appears_after`), clicks
//! and navigations can run hooks that rewrite the page, and any operation can
//! be made to fault. A `MockProbe` shares the state, so a test can inspect
//! what happened after the driver has been moved into a session.

use image::{ImageBuffer, RgbImage};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::adapter::DriverAdapter;
use super::types::{
    Cookie, DriverError, DriverResult, ElementAction, ElementHandle, Strategy, WindowSize,
};

/// Driver operations that can be made to fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Navigate,
    Inspect,
    Locate,
    Act,
    Script,
    Screenshot,
    Cookies,
    Window,
    Close,
}

/// One element on the mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    pub id: String,
    matches: Vec<Strategy>,
    pub displayed: bool,
    pub value: String,
    rendered_at: Option<Instant>,
}

impl MockElement {
    /// An element reachable by `#id` and by the `Id` strategy
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            matches: vec![Strategy::id(id.clone())],
            id,
            displayed: true,
            value: String::new(),
            rendered_at: None,
        }
    }

    /// Make the element reachable through another strategy
    pub fn matching(mut self, strategy: Strategy) -> Self {
        self.matches.push(strategy);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Element is absent from the DOM until `delay` has passed
    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.rendered_at = Some(Instant::now() + delay);
        self
    }

    fn matches(&self, strategy: &Strategy) -> bool {
        self.matches.iter().any(|s| s == strategy)
    }

    fn is_rendered(&self, now: Instant) -> bool {
        self.rendered_at.map(|t| now >= t).unwrap_or(true)
    }
}

/// The page currently loaded in the mock browser
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub url: String,
    pub title: String,
    pub source: String,
    pub elements: Vec<MockElement>,
}

impl MockPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn add(&mut self, element: MockElement) {
        self.remove(&element.id);
        self.elements.push(element);
    }

    /// Remove an element by id; returns whether it existed
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        before != self.elements.len()
    }

    pub fn has_element(&self, id: &str) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }

    pub fn element(&self, id: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn append_text(&mut self, text: &str) {
        if !self.source.is_empty() {
            self.source.push('\n');
        }
        self.source.push_str(text);
    }

    fn find(&self, strategy: &Strategy, now: Instant) -> Option<&MockElement> {
        self.elements
            .iter()
            .find(|e| e.is_rendered(now) && e.matches(strategy))
    }

    /// Earliest future render time among elements matching `strategy`
    fn next_render(&self, strategy: &Strategy, now: Instant) -> Option<Instant> {
        self.elements
            .iter()
            .filter(|e| e.matches(strategy))
            .filter_map(|e| e.rendered_at)
            .filter(|t| *t > now)
            .min()
    }
}

/// A recorded interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAction {
    pub verb: String,
    pub element: Option<String>,
    pub payload: Option<String>,
}

type ClickHook = Box<dyn FnMut(&mut MockPage) + Send>;
type AnyClickHook = Box<dyn FnMut(&str, &mut MockPage) + Send>;
type NavigateHook = Box<dyn FnMut(&str, &mut MockPage) + Send>;
type ScriptHook = Box<dyn FnMut(&str, &mut MockPage) -> Option<serde_json::Value> + Send>;

struct MockState {
    page: MockPage,
    click_hooks: HashMap<String, ClickHook>,
    any_click_hook: Option<AnyClickHook>,
    navigate_hook: Option<NavigateHook>,
    script_hook: Option<ScriptHook>,
    faults: HashSet<MockOp>,
    actions: Vec<MockAction>,
    scripts: HashMap<String, serde_json::Value>,
    cookies: Vec<Cookie>,
    window: WindowSize,
    implicit_wait: Duration,
    lookups: usize,
    closed: bool,
}

impl MockState {
    fn check(&self, op: MockOp) -> DriverResult<()> {
        if self.closed && op != MockOp::Close {
            return Err(DriverError::NotConnected("mock session closed".to_string()));
        }
        if self.faults.contains(&op) {
            return Err(DriverError::Transport(format!("injected fault on {:?}", op)));
        }
        Ok(())
    }

    fn record(&mut self, verb: &str, element: Option<&str>, payload: Option<&str>) {
        self.actions.push(MockAction {
            verb: verb.to_string(),
            element: element.map(str::to_string),
            payload: payload.map(str::to_string),
        });
    }
}

/// Scriptable in-memory browser
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new(page: MockPage) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                page,
                click_hooks: HashMap::new(),
                any_click_hook: None,
                navigate_hook: None,
                script_hook: None,
                faults: HashSet::new(),
                actions: Vec::new(),
                scripts: HashMap::new(),
                cookies: Vec::new(),
                window: WindowSize::new(1920, 1080),
                implicit_wait: Duration::ZERO,
                lookups: 0,
                closed: false,
            })),
        }
    }

    /// Run `hook` against the page whenever element `id` is clicked
    pub fn on_click<F>(self, id: impl Into<String>, hook: F) -> Self
    where
        F: FnMut(&mut MockPage) + Send + 'static,
    {
        lock(&self.state).click_hooks.insert(id.into(), Box::new(hook));
        self
    }

    /// Run `hook` after every click; it receives the clicked element's id
    pub fn on_any_click<F>(self, hook: F) -> Self
    where
        F: FnMut(&str, &mut MockPage) + Send + 'static,
    {
        lock(&self.state).any_click_hook = Some(Box::new(hook));
        self
    }

    /// Answer scripts not registered with `with_script`; `None` falls through
    pub fn on_script<F>(self, hook: F) -> Self
    where
        F: FnMut(&str, &mut MockPage) -> Option<serde_json::Value> + Send + 'static,
    {
        lock(&self.state).script_hook = Some(Box::new(hook));
        self
    }

    /// Run `hook` after every navigation; it receives the requested URL
    pub fn on_navigate<F>(self, hook: F) -> Self
    where
        F: FnMut(&str, &mut MockPage) + Send + 'static,
    {
        lock(&self.state).navigate_hook = Some(Box::new(hook));
        self
    }

    /// Fixed result for a script
    pub fn with_script(self, script: impl Into<String>, result: serde_json::Value) -> Self {
        lock(&self.state).scripts.insert(script.into(), result);
        self
    }

    pub fn failing(self, op: MockOp) -> Self {
        lock(&self.state).faults.insert(op);
        self
    }

    /// Handle for inspecting and steering the driver after it has been moved
    pub fn probe(&self) -> MockProbe {
        MockProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MockDriver")
            .field("url", &state.page.url)
            .field("elements", &state.page.elements.len())
            .field("closed", &state.closed)
            .finish()
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared view into a `MockDriver`
#[derive(Clone)]
pub struct MockProbe {
    state: Arc<Mutex<MockState>>,
}

impl MockProbe {
    pub fn actions(&self) -> Vec<MockAction> {
        lock(&self.state).actions.clone()
    }

    /// Number of recorded actions with `verb` on element `id`
    pub fn count(&self, verb: &str, id: &str) -> usize {
        lock(&self.state)
            .actions
            .iter()
            .filter(|a| a.verb == verb && a.element.as_deref() == Some(id))
            .count()
    }

    pub fn clicks(&self, id: &str) -> usize {
        self.count("click", id)
    }

    /// Current value of an input element
    pub fn value(&self, id: &str) -> Option<String> {
        lock(&self.state).page.element(id).map(|e| e.value.clone())
    }

    /// Raw lookups issued so far (`locate` and `locate_all`)
    pub fn lookups(&self) -> usize {
        lock(&self.state).lookups
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    pub fn url(&self) -> String {
        lock(&self.state).page.url.clone()
    }

    pub fn implicit_wait(&self) -> Duration {
        lock(&self.state).implicit_wait
    }

    pub fn window(&self) -> WindowSize {
        lock(&self.state).window
    }

    pub fn has_element(&self, id: &str) -> bool {
        lock(&self.state).page.has_element(id)
    }

    /// Mutate the live page
    pub fn with_page<R>(&self, f: impl FnOnce(&mut MockPage) -> R) -> R {
        f(&mut lock(&self.state).page)
    }

    pub fn fail(&self, op: MockOp) {
        lock(&self.state).faults.insert(op);
    }

    pub fn heal(&self, op: MockOp) {
        lock(&self.state).faults.remove(&op);
    }
}

impl DriverAdapter for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn navigate(&mut self, url: &str) -> DriverResult<()> {
        let mut guard = lock(&self.state);
        guard.check(MockOp::Navigate)?;
        guard.record("navigate", None, Some(url));

        let state = &mut *guard;
        state.page.url = url.to_string();
        if let Some(hook) = state.navigate_hook.as_mut() {
            hook(url, &mut state.page);
        }
        Ok(())
    }

    fn current_url(&mut self) -> DriverResult<String> {
        let state = lock(&self.state);
        state.check(MockOp::Inspect)?;
        Ok(state.page.url.clone())
    }

    fn title(&mut self) -> DriverResult<String> {
        let state = lock(&self.state);
        state.check(MockOp::Inspect)?;
        Ok(state.page.title.clone())
    }

    fn page_source(&mut self) -> DriverResult<String> {
        let state = lock(&self.state);
        state.check(MockOp::Inspect)?;
        Ok(state.page.source.clone())
    }

    fn locate(&mut self, strategy: &Strategy) -> DriverResult<Option<ElementHandle>> {
        let wait = {
            let mut state = lock(&self.state);
            state.check(MockOp::Locate)?;
            state.lookups += 1;

            let now = Instant::now();
            if let Some(element) = state.page.find(strategy, now) {
                return Ok(Some(ElementHandle {
                    id: element.id.clone(),
                    located_by: strategy.clone(),
                }));
            }
            if state.implicit_wait.is_zero() {
                return Ok(None);
            }

            // Simulated implicit wait: block until the element renders or the
            // wait runs out, whichever comes first.
            let deadline = now + state.implicit_wait;
            match state.page.next_render(strategy, now) {
                Some(t) if t <= deadline => t - now,
                _ => state.implicit_wait,
            }
        };

        std::thread::sleep(wait);

        let state = lock(&self.state);
        Ok(state
            .page
            .find(strategy, Instant::now())
            .map(|element| ElementHandle {
                id: element.id.clone(),
                located_by: strategy.clone(),
            }))
    }

    fn locate_all(&mut self, strategy: &Strategy) -> DriverResult<Vec<ElementHandle>> {
        let mut state = lock(&self.state);
        state.check(MockOp::Locate)?;
        state.lookups += 1;

        let now = Instant::now();
        Ok(state
            .page
            .elements
            .iter()
            .filter(|e| e.is_rendered(now) && e.matches(strategy))
            .map(|e| ElementHandle {
                id: e.id.clone(),
                located_by: strategy.clone(),
            })
            .collect())
    }

    fn act(&mut self, element: &ElementHandle, action: &ElementAction) -> DriverResult<()> {
        let mut guard = lock(&self.state);
        guard.check(MockOp::Act)?;

        let now = Instant::now();
        let state = &mut *guard;
        let target = state
            .page
            .elements
            .iter_mut()
            .find(|e| e.id == element.id && e.is_rendered(now))
            .ok_or_else(|| DriverError::StaleElement(element.id.clone()))?;

        let payload = match action {
            ElementAction::Click => None,
            ElementAction::Clear => {
                target.value.clear();
                None
            }
            ElementAction::SendKeys(text) => {
                target.value.push_str(text);
                Some(text.as_str())
            }
            ElementAction::Fill(text) => {
                target.value = text.clone();
                Some(text.as_str())
            }
        };
        state.actions.push(MockAction {
            verb: action.verb().to_string(),
            element: Some(element.id.clone()),
            payload: payload.map(str::to_string),
        });

        if *action == ElementAction::Click {
            if let Some(hook) = state.click_hooks.get_mut(&element.id) {
                hook(&mut state.page);
            }
            if let Some(hook) = state.any_click_hook.as_mut() {
                hook(&element.id, &mut state.page);
            }
        }
        Ok(())
    }

    fn is_displayed(&mut self, element: &ElementHandle) -> DriverResult<bool> {
        let state = lock(&self.state);
        state.check(MockOp::Inspect)?;
        state
            .page
            .element(&element.id)
            .map(|e| e.displayed)
            .ok_or_else(|| DriverError::StaleElement(element.id.clone()))
    }

    fn execute_script(&mut self, script: &str) -> DriverResult<serde_json::Value> {
        let mut guard = lock(&self.state);
        guard.check(MockOp::Script)?;
        guard.record("script", None, Some(script));

        let state = &mut *guard;
        if let Some(value) = state.scripts.get(script) {
            return Ok(value.clone());
        }
        if let Some(hook) = state.script_hook.as_mut() {
            if let Some(value) = hook(script, &mut state.page) {
                return Ok(value);
            }
        }
        if script.contains("document.readyState") {
            return Ok(serde_json::Value::String("complete".to_string()));
        }
        Ok(serde_json::Value::Null)
    }

    fn screenshot(&mut self) -> DriverResult<Vec<u8>> {
        let state = lock(&self.state);
        state.check(MockOp::Screenshot)?;

        // One pixel per 8x8 block keeps fixtures small
        let width = (state.window.width / 8).max(1);
        let height = (state.window.height / 8).max(1);
        let img: RgbImage = ImageBuffer::from_pixel(width, height, image::Rgb([40, 40, 48]));

        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| DriverError::Transport(format!("failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }

    fn cookies(&mut self) -> DriverResult<Vec<Cookie>> {
        let state = lock(&self.state);
        state.check(MockOp::Cookies)?;
        Ok(state.cookies.clone())
    }

    fn add_cookie(&mut self, cookie: &Cookie) -> DriverResult<()> {
        let mut state = lock(&self.state);
        state.check(MockOp::Cookies)?;
        state.cookies.retain(|c| c.name != cookie.name);
        state.cookies.push(cookie.clone());
        Ok(())
    }

    fn delete_cookies(&mut self) -> DriverResult<()> {
        let mut state = lock(&self.state);
        state.check(MockOp::Cookies)?;
        state.cookies.clear();
        Ok(())
    }

    fn window_size(&mut self) -> DriverResult<WindowSize> {
        let state = lock(&self.state);
        state.check(MockOp::Window)?;
        Ok(state.window)
    }

    fn set_window_size(&mut self, size: WindowSize) -> DriverResult<()> {
        let mut state = lock(&self.state);
        state.check(MockOp::Window)?;
        state.window = size;
        Ok(())
    }

    fn implicit_wait(&self) -> Duration {
        lock(&self.state).implicit_wait
    }

    fn set_implicit_wait(&mut self, wait: Duration) -> DriverResult<()> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(DriverError::NotConnected("mock session closed".to_string()));
        }
        state.implicit_wait = wait;
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        let mut state = lock(&self.state);
        state.check(MockOp::Close)?;
        state.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_page() -> MockPage {
        MockPage::new("http://app.test/")
            .with_title("Digital Library")
            .with_element(MockElement::new("email").matching(Strategy::css("input[type=\"email\"]")))
            .with_element(MockElement::new("submit"))
    }

    #[test]
    fn test_locate_by_any_registered_strategy() {
        let mut driver = MockDriver::new(login_page());
        let by_css = driver.locate(&Strategy::css("input[type=\"email\"]")).unwrap();
        let by_id = driver.locate(&Strategy::id("email")).unwrap();
        assert_eq!(by_css.unwrap().id, "email");
        assert_eq!(by_id.unwrap().id, "email");
        assert!(driver.locate(&Strategy::id("missing")).unwrap().is_none());
        assert_eq!(driver.probe().lookups(), 3);
    }

    #[test]
    fn test_delayed_element_with_implicit_wait() {
        let page = MockPage::new("http://app.test/")
            .with_element(MockElement::new("late").appears_after(Duration::from_millis(30)));
        let mut driver = MockDriver::new(page);

        assert!(driver.locate(&Strategy::id("late")).unwrap().is_none());

        driver.set_implicit_wait(Duration::from_millis(500)).unwrap();
        let started = Instant::now();
        let found = driver.locate(&Strategy::id("late")).unwrap();
        assert!(found.is_some());
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_click_hook_rewrites_page() {
        let mut driver = MockDriver::new(login_page()).on_click("submit", |page| {
            page.remove("email");
            page.append_text("dashboard");
        });
        let probe = driver.probe();

        let submit = driver.locate(&Strategy::id("submit")).unwrap().unwrap();
        driver.act(&submit, &ElementAction::Click).unwrap();

        assert!(!probe.has_element("email"));
        assert_eq!(probe.clicks("submit"), 1);
        assert!(driver.page_source().unwrap().contains("dashboard"));
    }

    #[test]
    fn test_fill_replaces_value() {
        let mut driver = MockDriver::new(login_page());
        let email = driver.locate(&Strategy::id("email")).unwrap().unwrap();
        driver.act(&email, &ElementAction::SendKeys("old".into())).unwrap();
        driver.act(&email, &ElementAction::Fill("user@test.com".into())).unwrap();
        assert_eq!(driver.probe().value("email").as_deref(), Some("user@test.com"));
    }

    #[test]
    fn test_injected_fault_and_close() {
        let mut driver = MockDriver::new(login_page()).failing(MockOp::Screenshot);
        assert!(matches!(driver.screenshot(), Err(DriverError::Transport(_))));

        driver.probe().heal(MockOp::Screenshot);
        let png = driver.screenshot().unwrap();
        assert!(image::load_from_memory(&png).is_ok());

        driver.close().unwrap();
        assert!(driver.probe().is_closed());
        assert!(matches!(driver.title(), Err(DriverError::NotConnected(_))));
        assert!(driver.close().is_ok());
    }

    #[test]
    fn test_stale_handle() {
        let mut driver = MockDriver::new(login_page());
        let email = driver.locate(&Strategy::id("email")).unwrap().unwrap();
        driver.probe().with_page(|p| p.remove("email"));
        assert!(matches!(
            driver.act(&email, &ElementAction::Click),
            Err(DriverError::StaleElement(_))
        ));
    }
}
