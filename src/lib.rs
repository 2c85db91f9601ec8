pub mod core;
pub mod extract;
pub mod scrape;
pub mod scraping;
pub mod session;

// --- Primary core exports ---
pub use core::types;
pub use core::types::*;
pub use core::AppState;

pub use session::SessionStore;
