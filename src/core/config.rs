use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// PortalConfig — file-based config loader (portalwatch.json) with env-var fallback
// ---------------------------------------------------------------------------

/// CSS class of the front-page container holding the announcements table.
pub const NEWS_MARKER: &str = ".box-warning";
/// Selector for the cancellations table on the cancellation page.
pub const CANCELLATIONS_MARKER: &str = "table.dataTable";
/// Element that only exists while the portal session is authenticated.
pub const LOGIN_MARKER: &str = "#logout-button";

/// Top-level config loaded from `portalwatch.json`.
///
/// Every field is optional in the file; each `resolve_*` method falls back to
/// an env var and finally to a coded default, so a missing config file is
/// never an error.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct PortalConfig {
    /// Portal base URL. The news table lives on this page.
    pub portal_url: Option<String>,
    /// Cancellations page URL. Defaults to `{portal_url}/cancellation/soon`.
    pub cancellations_url: Option<String>,
    /// Path of the persisted cookie jar.
    pub session_file: Option<String>,
    /// The single origin allowed by CORS (the frontend dev server).
    pub allowed_origin: Option<String>,
    /// Seconds to wait for the news marker. Default: 10.
    pub news_wait_secs: Option<u64>,
    /// Seconds to wait for the cancellations table. Default: 60.
    pub cancellations_wait_secs: Option<u64>,
    /// Seconds to wait for a human to complete the interactive login. Default: 300.
    pub login_wait_secs: Option<u64>,
    /// Run the browser headless. Default: false — the interactive login
    /// fallback needs a visible window, so headless only suits setups where
    /// the stored session is known to be fresh.
    pub headless: Option<bool>,
}

impl PortalConfig {
    /// Portal base URL: JSON field → `PORTAL_URL` env var → the production portal.
    pub fn resolve_portal_url(&self) -> String {
        if let Some(u) = &self.portal_url {
            if !u.trim().is_empty() {
                return u.trim_end_matches('/').to_string();
            }
        }
        std::env::var("PORTAL_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://portal.do-johodai.ac.jp".to_string())
    }

    /// Cancellations page URL: JSON field → `PORTAL_CANCELLATIONS_URL` env var
    /// → `{portal_url}/cancellation/soon`.
    pub fn resolve_cancellations_url(&self) -> String {
        if let Some(u) = &self.cancellations_url {
            if !u.trim().is_empty() {
                return u.clone();
            }
        }
        std::env::var("PORTAL_CANCELLATIONS_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("{}/cancellation/soon", self.resolve_portal_url()))
    }

    /// Session file path: JSON field → `PORTAL_SESSION_FILE` env var →
    /// `~/.portalwatch/session.json` (cwd-relative fallback when no home dir).
    pub fn resolve_session_file(&self) -> PathBuf {
        if let Some(p) = &self.session_file {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        if let Ok(p) = std::env::var("PORTAL_SESSION_FILE") {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        match dirs::home_dir() {
            Some(home) => home.join(".portalwatch").join("session.json"),
            None => PathBuf::from("session.json"),
        }
    }

    /// Allowed CORS origin: JSON field → `PORTAL_ALLOWED_ORIGIN` env var →
    /// the React dev server.
    pub fn resolve_allowed_origin(&self) -> String {
        if let Some(o) = &self.allowed_origin {
            if !o.trim().is_empty() {
                return o.clone();
            }
        }
        std::env::var("PORTAL_ALLOWED_ORIGIN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "http://localhost:5173".to_string())
    }

    pub fn resolve_news_wait(&self) -> Duration {
        Duration::from_secs(self.news_wait_secs.unwrap_or(10))
    }

    pub fn resolve_cancellations_wait(&self) -> Duration {
        Duration::from_secs(self.cancellations_wait_secs.unwrap_or(60))
    }

    pub fn resolve_login_wait(&self) -> Duration {
        Duration::from_secs(self.login_wait_secs.unwrap_or(300))
    }

    /// Headless toggle: JSON field → `PORTAL_HEADLESS` env var → false.
    pub fn resolve_headless(&self) -> bool {
        if let Some(b) = self.headless {
            return b;
        }
        std::env::var("PORTAL_HEADLESS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }
}

/// Load `portalwatch.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `PORTALWATCH_CONFIG` env var path
/// 2. `./portalwatch.json` (process cwd)
/// 3. `../portalwatch.json` (one level up — repo root when running from a subdir)
///
/// Missing file → `PortalConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `PortalConfig::default()`.
pub fn load_portal_config() -> PortalConfig {
    let candidates: Vec<PathBuf> = {
        let mut v = vec![
            PathBuf::from("portalwatch.json"),
            PathBuf::from("../portalwatch.json"),
        ];
        if let Ok(env_path) = std::env::var("PORTALWATCH_CONFIG") {
            v.insert(0, PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<PortalConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("portalwatch.json loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(
                        "portalwatch.json parse error at {}: {} — using defaults",
                        path.display(),
                        e
                    );
                    return PortalConfig::default();
                }
            },
            Err(_) => continue, // file not found at this path — try next
        }
    }

    PortalConfig::default()
}
