pub mod adapter;
pub mod mock;
pub mod types;
pub mod webdriver;

pub use adapter::DriverAdapter;
pub use mock::{MockAction, MockDriver, MockElement, MockOp, MockPage, MockProbe};
pub use types::{
    Cookie, DriverError, DriverResult, ElementAction, ElementHandle, Strategy, WindowSize,
};
pub use webdriver::{WebDriverAdapter, WebDriverConfig};
