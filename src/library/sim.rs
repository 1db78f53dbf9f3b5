//! A simulated Digital Library on top of `MockDriver`.
//!
//! Renders the login page or the dashboard depending on auth state, keeps a
//! book list, and reacts to the clicks the built-in suite performs. Used by
//! `--simulate` and by the integration tests.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::auth::Credentials;
use crate::driver::{MockDriver, MockElement, MockPage, Strategy};

const STORAGE_CLEAR_MARKER: &str = "localStorage.clear";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimBook {
    pub title: String,
    pub author: String,
    pub favorite: bool,
}

#[derive(Debug)]
struct SimState {
    credentials: Credentials,
    logged_in: bool,
    form_open: bool,
    login_error: bool,
    books: Vec<SimBook>,
    favorites: bool,
    editing: bool,
}

/// Handle to the simulated application; clones share state
#[derive(Debug, Clone)]
pub struct SimulatedLibrary {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedLibrary {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                credentials,
                logged_in: false,
                form_open: false,
                login_error: false,
                books: Vec::new(),
                favorites: true,
                editing: false,
            })),
        }
    }

    /// Ship the favorites section and bookmark buttons (on by default)
    pub fn favorites(self, enabled: bool) -> Self {
        lock(&self.state).favorites = enabled;
        self
    }

    /// Ship edit buttons on book cards (off by default)
    pub fn editing(self, enabled: bool) -> Self {
        lock(&self.state).editing = enabled;
        self
    }

    pub fn with_book(self, title: &str, author: &str) -> Self {
        lock(&self.state).books.push(SimBook {
            title: title.to_string(),
            author: author.to_string(),
            favorite: false,
        });
        self
    }

    pub fn books(&self) -> Vec<SimBook> {
        lock(&self.state).books.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        lock(&self.state).logged_in
    }

    /// A mock browser showing this application at `base_url`
    pub fn driver(&self, base_url: &str) -> MockDriver {
        let mut page = MockPage::new("about:blank");
        render(&lock(&self.state), &mut page);

        let on_nav = Arc::clone(&self.state);
        let on_click = Arc::clone(&self.state);
        let on_script = Arc::clone(&self.state);
        let base = base_url.to_string();

        MockDriver::new(page)
            .on_navigate(move |url, page| {
                let mut state = lock(&on_nav);
                state.form_open = false;
                state.login_error = false;
                if url.starts_with(&base) {
                    render(&state, page);
                } else {
                    *page = MockPage::new(url).with_title("404").with_source("Not Found");
                }
            })
            .on_any_click(move |id, page| {
                let mut state = lock(&on_click);
                click(&mut state, id, page);
                render(&state, page);
            })
            .on_script(move |script, page| {
                if script.contains(STORAGE_CLEAR_MARKER) {
                    let mut state = lock(&on_script);
                    state.logged_in = false;
                    render(&state, page);
                    return Some(serde_json::Value::Bool(true));
                }
                None
            })
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn click(state: &mut SimState, id: &str, page: &MockPage) {
    let value = |id: &str| page.element(id).map(|e| e.value.clone()).unwrap_or_default();
    match id {
        "login-submit" => {
            let ok = value("email") == state.credentials.email
                && value("password") == state.credentials.password;
            state.logged_in = ok;
            state.login_error = !ok;
        }
        "toggle-add-form" => state.form_open = !state.form_open,
        "cancel-add-book" => state.form_open = false,
        "submit-book-button" => {
            let title = value("title");
            if !title.trim().is_empty() {
                state.books.push(SimBook {
                    title,
                    author: value("author"),
                    favorite: false,
                });
                state.form_open = false;
            }
        }
        "logout-button" => {
            state.logged_in = false;
            state.form_open = false;
        }
        other => {
            if let Some(index) = other
                .strip_prefix("favorite-")
                .and_then(|n| n.parse::<usize>().ok())
            {
                if let Some(book) = state.books.get_mut(index) {
                    book.favorite = !book.favorite;
                }
            }
        }
    }
}

fn render(state: &SimState, page: &mut MockPage) {
    page.title = "Digital Library".to_string();
    page.elements.clear();
    page.source.clear();
    if state.logged_in {
        render_dashboard(state, page);
    } else {
        render_login(state, page);
    }
}

fn render_login(state: &SimState, page: &mut MockPage) {
    page.append_text("<html><head><title>Digital Library</title></head><body>");
    page.append_text("<h1>Welcome Back</h1><h2>Sign In</h2>");
    page.append_text("<form><input type=\"email\" placeholder=\"Enter your email\"/>");
    page.append_text("<input type=\"password\" placeholder=\"Enter your password\"/>");
    page.append_text("<button type=\"submit\">Sign In</button></form>");
    if state.login_error {
        page.append_text("<div role=\"alert\">Login failed: invalid email or password</div>");
    }
    page.append_text("</body></html>");

    page.add(
        MockElement::new("email")
            .matching(Strategy::css("input[type=\"email\"]"))
            .matching(Strategy::css("input[placeholder*=\"email\"]")),
    );
    page.add(MockElement::new("password").matching(Strategy::css("input[type=\"password\"]")));
    page.add(
        MockElement::new("login-submit")
            .matching(Strategy::css("button[type=\"submit\"]"))
            .matching(Strategy::text("button", "Sign In"))
            .matching(Strategy::css("button")),
    );
}

fn render_dashboard(state: &SimState, page: &mut MockPage) {
    page.append_text("<html><head><title>Digital Library</title>");
    page.append_text("<link rel=\"stylesheet\" href=\"/assets/index.css\"/>");
    page.append_text("<script type=\"module\" src=\"/assets/index.js\"></script></head>");
    page.append_text("<body><div data-testid=\"library-dashboard\">");
    page.append_text("<header class=\"bg-white shadow-sm border-b\">");
    page.append_text("<h1 data-testid=\"page-title\">My Library</h1>");
    page.append_text("<span data-testid=\"welcome-message\">Welcome, Peter Parker</span>");
    page.append_text("<button data-testid=\"logout-button\">Logout</button></header>");
    page.append_text("<input data-testid=\"search-input\" placeholder=\"Search books by title or author\"/>");
    page.append_text("<button data-testid=\"toggle-add-form\">Add Book</button>");
    page.append_text(&format!("<h2>Your Books ({})</h2>", state.books.len()));
    page.append_text("<h2>Currently Reading</h2><h2>Not Read</h2><h2>Finished</h2>");

    page.add(MockElement::new("library-dashboard").matching(Strategy::test_id("library-dashboard")));
    page.add(MockElement::new("header").matching(Strategy::css("header")));
    page.add(
        MockElement::new("page-title")
            .matching(Strategy::test_id("page-title"))
            .matching(Strategy::text("h1", "My Library")),
    );
    page.add(MockElement::new("library-icon").matching(Strategy::test_id("library-icon")));
    page.add(MockElement::new("welcome-message").matching(Strategy::test_id("welcome-message")));
    page.add(
        MockElement::new("logout-button")
            .matching(Strategy::test_id("logout-button"))
            .matching(Strategy::css("button")),
    );
    page.add(MockElement::new("search-input").matching(Strategy::test_id("search-input")));
    page.add(
        MockElement::new("toggle-add-form")
            .matching(Strategy::test_id("add-book-button"))
            .matching(Strategy::test_id("toggle-add-form"))
            .matching(Strategy::text("button", "Add Book"))
            .matching(Strategy::css("button")),
    );
    for title in ["Currently Reading", "Not Read", "Finished"] {
        page.add(MockElement::new(format!("section-{}", title)).matching(Strategy::text("h2", title)));
    }

    if state.form_open {
        page.append_text("<form data-testid=\"add-book-form\"><input id=\"title\"/><input id=\"author\"/>");
        page.append_text("<button data-testid=\"submit-book-button\">Add Book to Library</button>");
        page.append_text("<button data-testid=\"cancel-add-book\">Cancel</button></form>");
        page.add(
            MockElement::new("title")
                .matching(Strategy::test_id("title-input"))
                .matching(Strategy::id("title")),
        );
        page.add(
            MockElement::new("author")
                .matching(Strategy::test_id("author-input"))
                .matching(Strategy::id("author")),
        );
        page.add(
            MockElement::new("submit-book-button")
                .matching(Strategy::test_id("submit-book-button"))
                .matching(Strategy::text("button", "Add Book to Library")),
        );
        page.add(MockElement::new("cancel-add-book").matching(Strategy::test_id("cancel-add-book")));
    }

    if state.favorites {
        page.append_text("<section data-testid=\"favorites-section\"><h2>Favorites</h2>");
        for book in state.books.iter().filter(|b| b.favorite) {
            page.append_text(&format!("<p>{}</p>", book.title));
        }
        page.append_text("</section>");
        page.add(
            MockElement::new("favorites-section")
                .matching(Strategy::test_id("favorites-section"))
                .matching(Strategy::text("h2", "Favorites")),
        );
    }

    if !state.books.is_empty() {
        page.append_text("<div data-testid=\"bulk-action-bar\"><span>Bulk Actions:</span>");
        page.append_text("<button data-testid=\"bulk-finish-btn\" disabled>Mark as Finished</button></div>");
        page.add(MockElement::new("bulk-action-bar").matching(Strategy::test_id("bulk-action-bar")));
        page.add(MockElement::new("bulk-finish-btn").matching(Strategy::test_id("bulk-finish-btn")));
    }

    for (index, book) in state.books.iter().enumerate() {
        page.append_text(&format!(
            "<div class=\"book-card\"><h3>{}</h3><p>by {}</p></div>",
            book.title, book.author
        ));
        page.add(
            MockElement::new(format!("book-{}", index))
                .matching(Strategy::text("h3", book.title.clone()))
                .matching(Strategy::text("*", book.title.clone())),
        );
        if state.favorites {
            page.add(
                MockElement::new(format!("favorite-{}", index))
                    .matching(Strategy::test_id("favorite-bookmark-btn"))
                    .matching(Strategy::css("button")),
            );
        }
        if state.editing {
            page.add(
                MockElement::new(format!("edit-{}", index))
                    .matching(Strategy::test_id("edit-book-button"))
                    .matching(Strategy::css("button")),
            );
        }
    }
    page.append_text("</div></body></html>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverAdapter, ElementAction};

    fn creds() -> Credentials {
        Credentials::new("user@test.com", "secret")
    }

    fn click_id(driver: &mut MockDriver, strategy: Strategy) {
        let handle = driver.locate(&strategy).unwrap().unwrap();
        driver.act(&handle, &ElementAction::Click).unwrap();
    }

    fn fill(driver: &mut MockDriver, strategy: Strategy, text: &str) {
        let handle = driver.locate(&strategy).unwrap().unwrap();
        driver.act(&handle, &ElementAction::Fill(text.into())).unwrap();
    }

    #[test]
    fn test_login_renders_dashboard() {
        let app = SimulatedLibrary::new(creds());
        let mut driver = app.driver("http://sim.test");
        driver.navigate("http://sim.test").unwrap();
        assert!(driver.page_source().unwrap().contains("Sign In"));

        fill(&mut driver, Strategy::css("input[type=\"email\"]"), "user@test.com");
        fill(&mut driver, Strategy::css("input[type=\"password\"]"), "secret");
        click_id(&mut driver, Strategy::css("button[type=\"submit\"]"));

        assert!(app.is_logged_in());
        assert!(driver.locate(&Strategy::test_id("library-dashboard")).unwrap().is_some());
        assert!(driver.locate(&Strategy::css("input[type=\"email\"]")).unwrap().is_none());
    }

    #[test]
    fn test_wrong_password_shows_error() {
        let app = SimulatedLibrary::new(creds());
        let mut driver = app.driver("http://sim.test");
        fill(&mut driver, Strategy::id("email"), "user@test.com");
        fill(&mut driver, Strategy::id("password"), "nope");
        click_id(&mut driver, Strategy::id("login-submit"));

        assert!(!app.is_logged_in());
        assert!(driver.page_source().unwrap().contains("invalid email or password"));
    }

    #[test]
    fn test_add_book_and_storage_reset() {
        let app = SimulatedLibrary::new(creds());
        let mut driver = app.driver("http://sim.test");
        fill(&mut driver, Strategy::id("email"), "user@test.com");
        fill(&mut driver, Strategy::id("password"), "secret");
        click_id(&mut driver, Strategy::id("login-submit"));

        click_id(&mut driver, Strategy::test_id("toggle-add-form"));
        fill(&mut driver, Strategy::id("title"), "Dune 7");
        fill(&mut driver, Strategy::id("author"), "Frank Herbert");
        click_id(&mut driver, Strategy::test_id("submit-book-button"));

        assert_eq!(app.books()[0].title, "Dune 7");
        assert!(driver.locate(&Strategy::text("h3", "Dune 7")).unwrap().is_some());
        assert!(driver.locate(&Strategy::id("title")).unwrap().is_none());
        assert!(driver.locate(&Strategy::test_id("bulk-action-bar")).unwrap().is_some());

        driver.execute_script("window.localStorage.clear();").unwrap();
        assert!(!app.is_logged_in());
    }
}
