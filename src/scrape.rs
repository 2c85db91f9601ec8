//! Per-request scrape orchestration.
//!
//! One request = one browser: launch, authenticate, fetch, extract, tear
//! down. Teardown runs unconditionally — the result is captured first and
//! the session closed before it is returned, whichever branch produced it.

use thiserror::Error;
use tracing::info;

use crate::core::config::{CANCELLATIONS_MARKER, NEWS_MARKER};
use crate::core::AppState;
use crate::extract;
use crate::scraping::{fetch_ready_page, BrowserSession};
use crate::session::{auth, AuthError};
use crate::types::{Cancellation, NewsArticle};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("browser setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("browser automation failed: {0}")]
    Automation(String),
}

/// Scrape the front-page announcements table.
///
/// A readiness timeout is not an error — it comes back as an empty vec, same
/// as a page with no announcements.
pub async fn scrape_news(state: &AppState) -> Result<Vec<NewsArticle>, ScrapeError> {
    let session = BrowserSession::launch(state.config.resolve_headless())
        .await
        .map_err(|e| ScrapeError::Setup(e.to_string()))?;

    let result = news_flow(state, &session).await;
    session.close().await;
    result
}

/// Scrape the class-cancellations table.
pub async fn scrape_cancellations(state: &AppState) -> Result<Vec<Cancellation>, ScrapeError> {
    let session = BrowserSession::launch(state.config.resolve_headless())
        .await
        .map_err(|e| ScrapeError::Setup(e.to_string()))?;

    let result = cancellations_flow(state, &session).await;
    session.close().await;
    result
}

async fn news_flow(
    state: &AppState,
    session: &BrowserSession,
) -> Result<Vec<NewsArticle>, ScrapeError> {
    let page = session.page();
    auth::ensure_session(
        page,
        &state.session_store,
        &state.config.resolve_portal_url(),
        state.config.resolve_login_wait(),
        state.config.resolve_headless(),
    )
    .await?;

    let html = fetch_ready_page(
        page,
        &state.config.resolve_portal_url(),
        NEWS_MARKER,
        state.config.resolve_news_wait(),
    )
    .await
    .map_err(|e| ScrapeError::Automation(e.to_string()))?;

    let articles = match html {
        Some(html) => extract::extract_news(&html),
        None => Vec::new(),
    };
    info!("scrape: {} news articles", articles.len());
    Ok(articles)
}

async fn cancellations_flow(
    state: &AppState,
    session: &BrowserSession,
) -> Result<Vec<Cancellation>, ScrapeError> {
    let page = session.page();
    auth::ensure_session(
        page,
        &state.session_store,
        &state.config.resolve_portal_url(),
        state.config.resolve_login_wait(),
        state.config.resolve_headless(),
    )
    .await?;

    let html = fetch_ready_page(
        page,
        &state.config.resolve_cancellations_url(),
        CANCELLATIONS_MARKER,
        state.config.resolve_cancellations_wait(),
    )
    .await
    .map_err(|e| ScrapeError::Automation(e.to_string()))?;

    let cancellations = match html {
        Some(html) => extract::extract_cancellations(&html),
        None => Vec::new(),
    };
    info!("scrape: {} cancellations", cancellations.len());
    Ok(cancellations)
}
