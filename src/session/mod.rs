pub mod auth;
pub mod store;

pub use auth::{AuthError, AuthEvent, AuthState};
pub use store::SessionStore;
