//! Browser lifecycle using `chromiumoxide`.
//!
//! Each API request owns exactly one browser instance: launch, scrape, tear
//! down. There is no pool — the portal is slow enough that launch overhead is
//! noise, and an exclusive instance means a stuck login flow can never wedge
//! another request's browser.
//!
//! The window is visible by default because the interactive-login fallback
//! needs a human to type into it; headless mode exists for setups where the
//! stored session is managed out of band.

use std::path::Path;

use anyhow::{anyhow, Result};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tracing::{info, warn};

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH scan — finds package-manager installs on all platforms.
/// 3. OS-specific well-known install paths.
pub fn find_chrome_executable() -> Option<String> {
    if let Ok(p) = std::env::var("CHROME_EXECUTABLE") {
        if Path::new(&p).exists() {
            return Some(p);
        }
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = ["google-chrome", "chromium", "chromium-browser", "chrome"];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

/// Build a `BrowserConfig` for portal scraping.
///
/// Flags mirror what the portal tolerates in CI / restricted environments
/// (`--no-sandbox`, `--disable-dev-shm-usage`). The 1920×1080 window matches
/// the layout the portal serves to desktop sessions.
fn build_browser_config(exe: &str, headless: bool) -> Result<BrowserConfig> {
    let (width, height) = (1920u32, 1080u32);
    let mut builder = BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(width, height)
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--no-first-run")
        .arg("--no-default-browser-check");

    if !headless {
        builder = builder.with_head();
    }

    builder
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {}", e))
}

/// One exclusively-owned browser instance plus its CDP event loop.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a browser and open a blank working tab.
    pub async fn launch(headless: bool) -> Result<Self> {
        let exe = find_chrome_executable().ok_or_else(|| {
            anyhow!(
                "No browser found. Install Chrome or Chromium, or set CHROME_EXECUTABLE \
                 if installed in a non-standard location."
            )
        })?;

        info!(
            "browser: launching {} ({})",
            exe,
            if headless { "headless" } else { "visible" }
        );

        let config = build_browser_config(&exe, headless)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser ({}): {}", exe, e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| anyhow!("Failed to open tab: {}", e))?;

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Best-effort teardown. Runs in every exit path of a request; a close
    /// error must never shadow the scrape result, so it is only logged.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser: close error (non-fatal): {}", e);
        }
        self.handler_task.abort();
    }
}
