//! Session validation and interactive-login fallback.
//!
//! The flow is the one piece of real state in this service, so it is written
//! as an explicit machine rather than nested conditionals: [`AuthState`] +
//! [`AuthEvent`] form a pure transition table that tests exercise without a
//! browser, and [`ensure_session`] is the driver that feeds it real events
//! from the CDP page.

use std::time::Duration;

use chromiumoxide::Page;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::config::LOGIN_MARKER;
use crate::session::SessionStore;

/// States of the authentication flow.
///
/// `Authenticated` and `FatalTimeout` are terminal; every event is absorbed
/// once either is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing known yet; the stored jar has not been consulted.
    NoSession,
    /// A stored jar was found and injected, but not yet verified.
    SessionLoaded,
    /// The login-only marker is present — the session is live.
    Authenticated,
    /// No usable session; a human must log in interactively.
    LoginRequired,
    /// The human never completed the login within the bound.
    FatalTimeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SessionFound,
    SessionMissing,
    MarkerPresent,
    MarkerAbsent,
    LoginCompleted,
    LoginTimedOut,
}

impl AuthState {
    pub fn advance(self, event: AuthEvent) -> AuthState {
        use AuthEvent::*;
        use AuthState::*;
        match (self, event) {
            (NoSession, SessionFound) => SessionLoaded,
            (NoSession, SessionMissing) => LoginRequired,
            (SessionLoaded, MarkerPresent) => Authenticated,
            (SessionLoaded, MarkerAbsent) => LoginRequired,
            (LoginRequired, LoginCompleted) => Authenticated,
            (LoginRequired, LoginTimedOut) => FatalTimeout,
            // Terminal states absorb everything; unexpected events elsewhere
            // leave the state unchanged rather than inventing a transition.
            (s, _) => s,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::FatalTimeout)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("timed out after {waited:?} waiting for interactive login")]
    LoginTimeout { waited: Duration },

    #[error("login required but the browser is headless — no window for the user to log in with")]
    HeadlessLoginImpossible,

    #[error("failed to persist session cookies: {0}")]
    Persist(String),

    #[error("browser automation failed: {0}")]
    Automation(String),
}

/// `true` when the page shows the element that only exists while logged in.
///
/// Repeated probes against an unchanged page give the same verdict — there is
/// no hidden state beyond the DOM itself.
pub async fn probe_logged_in(page: &Page) -> bool {
    page.find_element(LOGIN_MARKER).await.is_ok()
}

/// Make sure `page` holds an authenticated portal session.
///
/// Replays the stored cookie jar when one exists and verifies it by probing
/// for the login-only marker; a stale, malformed or missing jar falls back to
/// interactive login in the visible browser window, after which the fresh jar
/// overwrites the stored one. Only the interactive path can fail the request:
/// either the window is headless or the human never finished within
/// `login_wait`.
pub async fn ensure_session(
    page: &Page,
    store: &SessionStore,
    portal_url: &str,
    login_wait: Duration,
    headless: bool,
) -> Result<(), AuthError> {
    let stored = store.load();
    let mut state = AuthState::NoSession.advance(if stored.is_some() {
        AuthEvent::SessionFound
    } else {
        AuthEvent::SessionMissing
    });

    if state == AuthState::SessionLoaded {
        if let Some(raw) = &stored {
            store.inject_into_page(page, raw).await;
        }
        goto(page, portal_url).await?;
        state = state.advance(if probe_logged_in(page).await {
            AuthEvent::MarkerPresent
        } else {
            AuthEvent::MarkerAbsent
        });
        if state == AuthState::LoginRequired {
            info!("auth: stored session rejected by portal — falling back to interactive login");
        }
    }

    match state {
        AuthState::Authenticated => Ok(()),
        AuthState::LoginRequired => interactive_login(page, store, portal_url, login_wait, headless).await,
        // NoSession/SessionLoaded cannot survive the transitions above, and
        // FatalTimeout is only produced inside interactive_login.
        other => Err(AuthError::Automation(format!(
            "auth flow ended in unexpected state {other:?}"
        ))),
    }
}

async fn interactive_login(
    page: &Page,
    store: &SessionStore,
    portal_url: &str,
    login_wait: Duration,
    headless: bool,
) -> Result<(), AuthError> {
    if headless {
        return Err(AuthError::HeadlessLoginImpossible);
    }

    goto(page, portal_url).await?;
    info!(
        "auth: please log in manually in the browser window (waiting up to {}s)...",
        login_wait.as_secs()
    );

    let deadline = std::time::Instant::now() + login_wait;
    while std::time::Instant::now() < deadline {
        if probe_logged_in(page).await {
            let state = AuthState::LoginRequired.advance(AuthEvent::LoginCompleted);
            debug_assert!(state.is_terminal());
            let jar = store
                .capture_from_page(page)
                .await
                .map_err(|e| AuthError::Persist(e.to_string()))?;
            store.save(&jar).map_err(|e| AuthError::Persist(e.to_string()))?;
            info!("auth: 🔑 login successful, session persisted");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let state = AuthState::LoginRequired.advance(AuthEvent::LoginTimedOut);
    debug_assert_eq!(state, AuthState::FatalTimeout);
    warn!(
        "auth: interactive login not completed within {}s",
        login_wait.as_secs()
    );
    Err(AuthError::LoginTimeout { waited: login_wait })
}

async fn goto(page: &Page, url: &str) -> Result<(), AuthError> {
    page.goto(url)
        .await
        .map(|_| ())
        .map_err(|e| AuthError::Automation(format!("navigation to {url} failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use AuthEvent::*;
    use AuthState::*;

    #[test]
    fn test_no_stored_session_goes_straight_to_login() {
        assert_eq!(NoSession.advance(SessionMissing), LoginRequired);
    }

    #[test]
    fn test_valid_stored_session_authenticates() {
        let s = NoSession.advance(SessionFound).advance(MarkerPresent);
        assert_eq!(s, Authenticated);
        assert!(s.is_terminal());
    }

    #[test]
    fn test_stale_session_falls_back_to_login() {
        let s = NoSession.advance(SessionFound).advance(MarkerAbsent);
        assert_eq!(s, LoginRequired);
        assert_eq!(s.advance(LoginCompleted), Authenticated);
    }

    #[test]
    fn test_login_timeout_is_fatal() {
        let s = NoSession
            .advance(SessionMissing)
            .advance(LoginTimedOut);
        assert_eq!(s, FatalTimeout);
        assert!(s.is_terminal());
    }

    #[test]
    fn test_terminal_states_absorb_all_events() {
        for ev in [
            SessionFound,
            SessionMissing,
            MarkerPresent,
            MarkerAbsent,
            LoginCompleted,
            LoginTimedOut,
        ] {
            assert_eq!(Authenticated.advance(ev), Authenticated);
            assert_eq!(FatalTimeout.advance(ev), FatalTimeout);
        }
    }

    #[test]
    fn test_unexpected_events_leave_state_unchanged() {
        // Events from the wrong phase must not invent transitions.
        assert_eq!(NoSession.advance(MarkerPresent), NoSession);
        assert_eq!(SessionLoaded.advance(LoginCompleted), SessionLoaded);
        assert_eq!(LoginRequired.advance(SessionFound), LoginRequired);
    }
}
