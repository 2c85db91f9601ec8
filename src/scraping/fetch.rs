//! Page readiness: navigate and wait for a marker element.
//!
//! The portal renders its tables server-side but behind redirects and a
//! login gate, so "page loaded" is defined as "the marker selector for this
//! page exists in the DOM", polled against a bounded deadline. A timeout is
//! a normal outcome — the caller cannot distinguish it from a legitimately
//! empty page, by design.

use std::time::Duration;

use anyhow::{anyhow, Result};
use chromiumoxide::Page;
use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll for `selector` until it appears or `timeout` elapses.
pub async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        if page.find_element(selector).await.is_ok() {
            return true;
        }
        if std::time::Instant::now() >= deadline {
            info!(
                "fetch: marker '{}' not present after {}s",
                selector,
                timeout.as_secs()
            );
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Navigate to `url` and return the rendered HTML once `marker` is present.
///
/// `Ok(None)` means the marker never appeared within `timeout` — "no data
/// available", not an error. `Err` is reserved for CDP-level failures
/// (navigation refused, browser gone).
pub async fn fetch_ready_page(
    page: &Page,
    url: &str,
    marker: &str,
    timeout: Duration,
) -> Result<Option<String>> {
    page.goto(url)
        .await
        .map_err(|e| anyhow!("navigation to {} failed: {}", url, e))?;

    if !wait_for_selector(page, marker, timeout).await {
        return Ok(None);
    }

    let html = page
        .content()
        .await
        .map_err(|e| anyhow!("failed to capture page content: {}", e))?;
    Ok(Some(html))
}
