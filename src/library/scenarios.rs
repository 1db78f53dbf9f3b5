//! The built-in Digital Library suite.
//!
//! Scenarios run in this order through one session; later ones rely on
//! earlier ones (the book added by "add book" is what "search books" and
//! "mark favorite" look for).

use crate::driver::WindowSize;
use crate::scenario::{Check, Scenario, Step, SuiteDefinition};

use super::locators as loc;

pub const SUITE_NAME: &str = "digital-library";

/// Title of the book the suite creates; unique per run
pub const TEST_BOOK: &str = "Test Book {run_token}";

pub const TEST_AUTHOR: &str = "Test Author";

const DASHBOARD_KEYWORDS: &[&str] = &["book", "library", "author", "title", "add", "search", "collection"];

const STATUS_SECTIONS: &[&str] = &["Currently Reading", "Finished", "Not Read"];

const TITLE_WORDS: &[&str] = &["library", "book", "management", "system"];

pub fn suite() -> SuiteDefinition {
    SuiteDefinition::new(
        SUITE_NAME,
        vec![
            page_load(),
            page_title(),
            login_form_present(),
            valid_login(),
            invalid_login_rejected(),
            add_book(),
            cancel_add_book(),
            search_books(),
            favorites_section(),
            mark_favorite(),
            edit_book(),
            status_sections(),
            bulk_operations(),
            dashboard_content(),
            navigation(),
            responsive_layout(),
            overall_functionality(),
            logout(),
        ],
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn page_load() -> Scenario {
    Scenario::new("page load")
        .describe("The application answers at the base URL with real content")
        .tag("smoke")
        .step(Step::assert(
            "loaded the base URL",
            Check::UrlContainsAny {
                keywords: strings(&["{base_url}"]),
            },
        ))
        .step(Step::assert("page has content", Check::PageLongerThan { chars: 100 }))
        .step(
            Step::assert(
                "title mentions the library",
                Check::TitleContains {
                    text: "Digital Library".into(),
                },
            )
            .optional(),
        )
}

pub fn page_title() -> Scenario {
    Scenario::new("page title")
        .describe("The document title names a library or book application")
        .tag("smoke")
        .step(Step::assert(
            "title names the app",
            Check::AnyOf {
                checks: TITLE_WORDS
                    .iter()
                    .map(|word| Check::TitleContains { text: word.to_string() })
                    .collect(),
            },
        ))
}

pub fn login_form_present() -> Scenario {
    Scenario::new("login form present")
        .describe("A signed-out visitor sees email, password and submit controls")
        .tag("smoke")
        .tag("auth")
        .fresh_session()
        .step(Step::assert(
            "email field visible",
            Check::ElementDisplayed {
                target: loc::email_field(),
            },
        ))
        .step(Step::assert(
            "password field visible",
            Check::ElementDisplayed {
                target: loc::password_field(),
            },
        ))
        .step(Step::assert(
            "login button visible",
            Check::ElementDisplayed {
                target: loc::login_button(),
            },
        ))
}

pub fn valid_login() -> Scenario {
    Scenario::new("valid login")
        .describe("The configured account reaches the dashboard")
        .tag("smoke")
        .tag("auth")
        .requires_login()
        .step(Step::assert(
            "dashboard shown",
            Check::AnyOf {
                checks: vec![
                    Check::ElementPresent {
                        target: loc::dashboard(),
                    },
                    Check::ElementPresent {
                        target: loc::welcome_message(),
                    },
                    Check::PageContainsAny {
                        keywords: strings(&["welcome", "logout"]),
                        min: 1,
                    },
                ],
            },
        ))
}

pub fn invalid_login_rejected() -> Scenario {
    Scenario::new("invalid login rejected")
        .describe("Wrong credentials keep the visitor on the login form")
        .tag("auth")
        .fresh_session()
        .step(Step::fill("enter wrong email", loc::email_field(), "wrong@email.com"))
        .step(Step::fill("enter wrong password", loc::password_field(), "wrongpassword"))
        .step(Step::click("submit", loc::login_button()))
        .step(Step::assert(
            "still signed out",
            Check::AnyOf {
                checks: vec![
                    Check::PageContainsAny {
                        keywords: strings(&["invalid", "error", "wrong", "failed"]),
                        min: 1,
                    },
                    Check::ElementPresent {
                        target: loc::email_field(),
                    },
                    Check::UrlContainsAny {
                        keywords: strings(&["login"]),
                    },
                ],
            },
        ))
        .step(Step::assert(
            "dashboard not shown",
            Check::ElementAbsent {
                target: loc::dashboard(),
            },
        ))
}

pub fn add_book() -> Scenario {
    Scenario::new("add book")
        .describe("A new book appears in the library after submitting the form")
        .tag("books")
        .requires_login()
        .step(Step::click("open add form", loc::add_book_button()))
        .step(Step::fill("enter title", loc::title_input(), TEST_BOOK))
        .step(Step::fill("enter author", loc::author_input(), TEST_AUTHOR))
        .step(Step::click("submit book", loc::submit_book_button()))
        .step(Step::assert(
            "book listed",
            Check::ElementPresent {
                target: loc::book_titled(TEST_BOOK),
            },
        ))
}

pub fn cancel_add_book() -> Scenario {
    Scenario::new("cancel add book")
        .describe("Cancelling closes the add-book form")
        .tag("books")
        .requires_login()
        .step(Step::click("open add form", loc::add_book_button()))
        .step(Step::locate("form open", loc::title_input()))
        .step(Step::click("cancel", loc::cancel_add_book()))
        .step(Step::assert(
            "form closed",
            Check::ElementAbsent {
                target: loc::title_input(),
            },
        ))
}

pub fn search_books() -> Scenario {
    Scenario::new("search books")
        .describe("Typing in the search bar works and finds the new book")
        .tag("books")
        .requires_login()
        .step(Step::fill("type query", loc::search_input(), TEST_BOOK))
        .step(
            Step::assert(
                "new book found",
                Check::ElementPresent {
                    target: loc::book_titled(TEST_BOOK),
                },
            )
            .optional(),
        )
}

pub fn favorites_section() -> Scenario {
    Scenario::new("favorites section")
        .describe("The dashboard has a visible favorites section")
        .tag("books")
        .requires_login()
        .step(Step::assert(
            "favorites visible",
            Check::ElementDisplayed {
                target: loc::favorites_section(),
            },
        ))
}

pub fn mark_favorite() -> Scenario {
    Scenario::new("mark favorite")
        .describe("Bookmarking a book, where the deployment supports it")
        .tag("books")
        .tag("optional")
        .requires_login()
        .step(
            Step::assert(
                "book available",
                Check::ElementPresent {
                    target: loc::book_titled(TEST_BOOK),
                },
            )
            .optional(),
        )
        .step(Step::click("bookmark book", loc::favorite_toggle()).optional())
}

pub fn edit_book() -> Scenario {
    Scenario::new("edit book")
        .describe("Opening the editor on a book, where the deployment supports it")
        .tag("books")
        .tag("optional")
        .requires_login()
        .step(Step::click("open editor", loc::edit_book_button()).optional())
        .step(
            Step::assert(
                "editor shown",
                Check::ElementPresent {
                    target: crate::locator::LocatorSpec::single(
                        "edit title input",
                        crate::driver::Strategy::test_id("edit-title-input"),
                    ),
                },
            )
            .optional(),
        )
}

pub fn status_sections() -> Scenario {
    let mut scenario = Scenario::new("status sections")
        .describe("Reading-status sections are rendered (two of three is enough)")
        .tag("heuristic")
        .requires_login()
        .threshold(2.0);
    for title in STATUS_SECTIONS {
        scenario = scenario.step(
            Step::assert(
                format!("{} section", title),
                Check::AnyOf {
                    checks: vec![
                        Check::PageContains {
                            text: title.to_string(),
                        },
                        Check::ElementPresent {
                            target: loc::section_header(title),
                        },
                    ],
                },
            )
            .optional(),
        );
    }
    scenario
}

/// Bulk actions only render once the shelf holds books
pub fn bulk_operations() -> Scenario {
    Scenario::new("bulk operations")
        .describe("The not-read shelf offers bulk actions")
        .tag("optional")
        .requires_login()
        .step(Step::assert(
            "not read shelf",
            Check::PageContains {
                text: "Not Read".into(),
            },
        ))
        .step(
            Step::assert(
                "bulk action bar",
                Check::ElementPresent {
                    target: loc::bulk_action_bar(),
                },
            )
            .optional(),
        )
        .step(
            Step::assert(
                "mark as finished control",
                Check::ElementPresent {
                    target: loc::bulk_finish_button(),
                },
            )
            .optional(),
        )
}

pub fn dashboard_content() -> Scenario {
    Scenario::new("dashboard content")
        .describe("The dashboard shows meaningful library content")
        .tag("heuristic")
        .requires_login()
        .threshold(2.0)
        .step(
            Step::assert(
                "library keywords",
                Check::PageContainsAny {
                    keywords: strings(DASHBOARD_KEYWORDS),
                    min: 2,
                },
            )
            .optional(),
        )
        .step(
            Step::assert(
                "several buttons",
                Check::ElementCountAtLeast {
                    target: crate::locator::LocatorSpec::single(
                        "button",
                        crate::driver::Strategy::css("button"),
                    ),
                    min: 2,
                },
            )
            .optional(),
        )
        .step(
            Step::assert(
                "add book control",
                Check::ElementPresent {
                    target: loc::add_book_button(),
                },
            )
            .optional(),
        )
        .step(
            Step::assert(
                "search control",
                Check::ElementPresent {
                    target: loc::search_input(),
                },
            )
            .optional(),
        )
}

pub fn navigation() -> Scenario {
    Scenario::new("navigation")
        .describe("Some navigation or menu structure is present")
        .tag("heuristic")
        .requires_login()
        .threshold(1.0)
        .step(
            Step::assert(
                "navigation container",
                Check::ElementPresent {
                    target: loc::navigation(),
                },
            )
            .optional(),
        )
        .step(
            Step::assert(
                "navigation links",
                Check::ElementPresent {
                    target: loc::navigation_links(),
                },
            )
            .optional(),
        )
}

pub fn responsive_layout() -> Scenario {
    let mobile = WindowSize::new(375, 667);
    let tablet = WindowSize::new(768, 1024);

    Scenario::new("responsive layout")
        .describe("Header stays visible on mobile and tablet widths")
        .tag("layout")
        .requires_login()
        .step(Step::resize("mobile width", mobile))
        .step(Step::assert(
            "title visible on mobile",
            Check::ElementDisplayed {
                target: loc::page_title(),
            },
        ))
        .step(Step::resize("tablet width", tablet))
        .step(Step::assert(
            "title visible on tablet",
            Check::ElementDisplayed {
                target: loc::page_title(),
            },
        ))
        .step(
            Step::assert(
                "icon visible on tablet",
                Check::ElementDisplayed {
                    target: loc::library_icon(),
                },
            )
            .optional(),
        )
}

/// Page health score; the signed-in signal is measured here rather than
/// taken from the login precondition
pub fn overall_functionality() -> Scenario {
    Scenario::new("overall functionality")
        .describe("Signed in, substantial page, scripts and styles loaded (two of four)")
        .tag("heuristic")
        .threshold(2.0)
        .step(
            Step::assert(
                "signed in",
                Check::AnyOf {
                    checks: vec![
                        Check::UrlContainsAny {
                            keywords: strings(&["dashboard", "home"]),
                        },
                        Check::PageContainsAny {
                            keywords: strings(&["welcome", "logout"]),
                            min: 1,
                        },
                        Check::ElementAbsent {
                            target: loc::email_field(),
                        },
                    ],
                },
            )
            .optional(),
        )
        .step(Step::assert("substantial page", Check::PageLongerThan { chars: 500 }).optional())
        .step(
            Step::assert(
                "scripts loaded",
                Check::PageContains {
                    text: "<script".into(),
                },
            )
            .optional(),
        )
        .step(
            Step::assert(
                "styles present",
                Check::PageContains {
                    text: "style".into(),
                },
            )
            .optional(),
        )
}

pub fn logout() -> Scenario {
    Scenario::new("logout")
        .describe("Logging out returns to the login form")
        .tag("auth")
        .requires_login()
        .step(Step::click("log out", loc::logout_button()))
        .step(Step::assert(
            "login form back",
            Check::ElementPresent {
                target: loc::email_field(),
            },
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order() {
        let names: Vec<String> = suite().scenarios.into_iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 18);
        assert_eq!(names.first().map(String::as_str), Some("page load"));
        assert_eq!(names.last().map(String::as_str), Some("logout"));
        let add = names.iter().position(|n| n == "add book").unwrap();
        let search = names.iter().position(|n| n == "search books").unwrap();
        assert!(add < search);
    }

    #[test]
    fn test_catalog_validates() {
        assert!(suite().validate().is_ok());
    }

    #[test]
    fn test_optional_features_never_abort() {
        for scenario in [mark_favorite(), edit_book()] {
            assert!(scenario.steps.iter().all(|s| s.is_optional()), "{}", scenario.name);
        }
    }
}
