//! Shared locators for the Digital Library UI.
//!
//! data-testid attributes first, then ids and attribute selectors, then text
//! matches. Deployments differ in which of these they ship.

use crate::driver::Strategy;
use crate::locator::LocatorSpec;

pub fn email_field() -> LocatorSpec {
    LocatorSpec::new(
        "email field",
        vec![
            Strategy::css("input[type=\"email\"]"),
            Strategy::css("input[name=\"email\"]"),
            Strategy::css("input[placeholder*=\"email\"]"),
            Strategy::id("email"),
        ],
    )
}

pub fn password_field() -> LocatorSpec {
    LocatorSpec::new(
        "password field",
        vec![
            Strategy::css("input[type=\"password\"]"),
            Strategy::css("input[name=\"password\"]"),
            Strategy::id("password"),
        ],
    )
}

pub fn login_button() -> LocatorSpec {
    LocatorSpec::new(
        "login button",
        vec![
            Strategy::css("button[type=\"submit\"]"),
            Strategy::text("button", "Sign In"),
            Strategy::text("button", "Login"),
            Strategy::css("input[type='submit']"),
        ],
    )
}

pub fn dashboard() -> LocatorSpec {
    LocatorSpec::single("library dashboard", Strategy::test_id("library-dashboard"))
        .or(Strategy::text("h1", "My Library"))
}

pub fn page_title() -> LocatorSpec {
    LocatorSpec::single("page title", Strategy::test_id("page-title"))
        .or(Strategy::text("h1", "My Library"))
}

pub fn library_icon() -> LocatorSpec {
    LocatorSpec::single("library icon", Strategy::test_id("library-icon"))
}

pub fn welcome_message() -> LocatorSpec {
    LocatorSpec::single("welcome message", Strategy::test_id("welcome-message"))
        .or(Strategy::text("span", "Welcome"))
}

pub fn add_book_button() -> LocatorSpec {
    LocatorSpec::new(
        "add book button",
        vec![
            Strategy::test_id("add-book-button"),
            Strategy::test_id("toggle-add-form"),
            Strategy::text("button", "Add Book"),
        ],
    )
}

pub fn title_input() -> LocatorSpec {
    LocatorSpec::new(
        "title input",
        vec![
            Strategy::test_id("title-input"),
            Strategy::id("title"),
            Strategy::name("title"),
        ],
    )
}

pub fn author_input() -> LocatorSpec {
    LocatorSpec::new(
        "author input",
        vec![
            Strategy::test_id("author-input"),
            Strategy::id("author"),
            Strategy::name("author"),
        ],
    )
}

pub fn submit_book_button() -> LocatorSpec {
    LocatorSpec::single("submit book button", Strategy::test_id("submit-book-button"))
        .or(Strategy::text("button", "Add Book to Library"))
}

pub fn cancel_add_book() -> LocatorSpec {
    LocatorSpec::single("cancel add book", Strategy::test_id("cancel-add-book"))
        .or(Strategy::text("button", "Cancel"))
}

pub fn search_input() -> LocatorSpec {
    LocatorSpec::new(
        "search input",
        vec![
            Strategy::test_id("search-input"),
            Strategy::test_id("search-bar"),
            Strategy::css("input[type=\"search\"]"),
            Strategy::css("input[placeholder*=\"Search\"]"),
        ],
    )
}

pub fn logout_button() -> LocatorSpec {
    LocatorSpec::single("logout button", Strategy::test_id("logout-button"))
        .or(Strategy::text("button", "Logout"))
        .or(Strategy::text("button", "Log out"))
}

pub fn favorites_section() -> LocatorSpec {
    LocatorSpec::single("favorites section", Strategy::test_id("favorites-section"))
        .or(Strategy::text("h2", "Favorites"))
}

pub fn favorite_toggle() -> LocatorSpec {
    LocatorSpec::single("favorite toggle", Strategy::test_id("favorite-bookmark-btn"))
}

pub fn edit_book_button() -> LocatorSpec {
    LocatorSpec::single("edit book button", Strategy::test_id("edit-book-button"))
        .or(Strategy::text("button", "Edit"))
}

/// Any navigation container; the plain page header is the last resort
pub fn navigation() -> LocatorSpec {
    LocatorSpec::new(
        "navigation",
        vec![
            Strategy::css("nav"),
            Strategy::css("[class*=\"nav\"]"),
            Strategy::css("[class*=\"menu\"]"),
            Strategy::css("header"),
        ],
    )
}

pub fn navigation_links() -> LocatorSpec {
    LocatorSpec::new(
        "navigation links",
        vec![
            Strategy::text("a", "Home"),
            Strategy::text("a", "Library"),
            Strategy::text("a", "Books"),
        ],
    )
}

pub fn bulk_action_bar() -> LocatorSpec {
    LocatorSpec::single("bulk action bar", Strategy::test_id("bulk-action-bar"))
        .or(Strategy::text("span", "Bulk Actions"))
}

pub fn bulk_finish_button() -> LocatorSpec {
    LocatorSpec::single("bulk finish button", Strategy::test_id("bulk-finish-btn"))
        .or(Strategy::text("button", "Mark as Finished"))
}

/// Header of one reading-status section ("Currently Reading", ...)
pub fn section_header(title: &str) -> LocatorSpec {
    LocatorSpec::single(format!("{} header", title), Strategy::text("h2", title))
        .or(Strategy::text("h3", title))
}

/// A book card whose title contains `title` (templated titles allowed)
pub fn book_titled(title: &str) -> LocatorSpec {
    LocatorSpec::single(format!("book {}", title), Strategy::text("h3", title))
        .or(Strategy::text("*", title))
}
