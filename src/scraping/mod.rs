pub mod browser;
pub mod fetch;

pub use browser::BrowserSession;
pub use fetch::{fetch_ready_page, wait_for_selector};
