//! Session cookie persistence — save/load/inject helpers.
//!
//! After a successful interactive login the browser's cookie jar is written
//! to a single JSON file. On every later scrape the jar is loaded, sanitized
//! and injected into the fresh CDP page so the portal recognizes the session
//! without another login. The file is this service's private state; nothing
//! else reads it.
//!
//! The store path is injected at construction (it comes from `PortalConfig`),
//! so tests point it at a temp directory instead of the real home-dir file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Save / load ──────────────────────────────────────────────────────────

    /// Persist the raw cookie jar, overwriting any prior content.
    ///
    /// A write failure propagates — the caller treats it as a hard failure of
    /// the scrape request rather than silently continuing with a session that
    /// would be lost on restart.
    pub fn save(&self, raw_cookies: &[serde_json::Value]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating session dir {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(raw_cookies)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing session file {}", self.path.display()))?;
        info!(
            "session_store: 🍪 saved {} cookies to {}",
            raw_cookies.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load the stored cookie jar.
    ///
    /// Returns `None` when the file is missing, unreadable, unparsable or
    /// empty. None of these are errors — they all mean "no usable session"
    /// and send the caller down the interactive-login path.
    pub fn load(&self) -> Option<Vec<serde_json::Value>> {
        if !self.path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(&self.path).ok()?;
        let cookies: Vec<serde_json::Value> = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "session_store: malformed session file {} ({}) — treating as no session",
                    self.path.display(),
                    e
                );
                return None;
            }
        };
        if cookies.is_empty() {
            return None;
        }
        match min_cookie_expiry(&cookies) {
            Some(exp) => info!(
                "session_store: loaded {} cookies (earliest expiry {})",
                cookies.len(),
                chrono::DateTime::from_timestamp(exp as i64, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| format!("unix {exp:.0}")),
            ),
            None => info!(
                "session_store: loaded {} cookies (all session-scoped)",
                cookies.len()
            ),
        }
        Some(cookies)
    }

    // ── Inject ───────────────────────────────────────────────────────────────

    /// Inject stored cookies into a live CDP page **before** navigation.
    ///
    /// Cookies pass through [`sanitize_for_replay`] and are set via the
    /// `Network.setCookies` CDP command. Any individual cookie that fails to
    /// deserialize is skipped so a partially-malformed jar never blocks a
    /// scrape — at worst the login probe fails and the interactive path runs.
    pub async fn inject_into_page(
        &self,
        page: &chromiumoxide::Page,
        raw_cookies: &[serde_json::Value],
    ) {
        use chromiumoxide::cdp::browser_protocol::network::{CookieParam, SetCookiesParams};

        let cookie_params: Vec<CookieParam> = sanitize_for_replay(raw_cookies)
            .iter()
            .filter_map(|v| serde_json::from_value::<CookieParam>(v.clone()).ok())
            .collect();

        if cookie_params.is_empty() {
            warn!("session_store: stored jar contained no valid cookies — skipping injection");
            return;
        }

        let count = cookie_params.len();
        match page.execute(SetCookiesParams::new(cookie_params)).await {
            Ok(_) => info!("session_store: 💉 injected {} session cookies", count),
            Err(e) => warn!("session_store: failed to inject session cookies: {}", e),
        }
    }

    /// Read the page's current cookie jar as raw JSON values, ready for [`Self::save`].
    pub async fn capture_from_page(
        &self,
        page: &chromiumoxide::Page,
    ) -> Result<Vec<serde_json::Value>> {
        let cookies = page
            .get_cookies()
            .await
            .context("reading cookies from browser")?;
        cookies
            .iter()
            .map(|c| serde_json::to_value(c).context("serializing cookie"))
            .collect()
    }
}

/// Strip the `sameSite` attribute from every cookie before replay.
///
/// The flag is the one cookie attribute whose serialized form is not portable
/// between browser implementations; replaying a jar that still carries it can
/// make cookie injection fail wholesale. Everything else passes through
/// untouched.
pub fn sanitize_for_replay(raw_cookies: &[serde_json::Value]) -> Vec<serde_json::Value> {
    raw_cookies
        .iter()
        .map(|v| {
            let mut v = v.clone();
            if let Some(obj) = v.as_object_mut() {
                obj.remove("sameSite");
            }
            v
        })
        .collect()
}

/// Minimum finite cookie expiry timestamp in a raw jar.
///
/// CDP cookies carry an `expires` field that is either `-1.0` (session
/// cookie, no persistent expiry) or a positive Unix timestamp in seconds.
/// Returns `None` when every cookie is session-scoped.
pub fn min_cookie_expiry(raw_cookies: &[serde_json::Value]) -> Option<f64> {
    raw_cookies
        .iter()
        .filter_map(|v| v.get("expires").and_then(|e| e.as_f64()))
        .filter(|&exp| exp > 0.0)
        .reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store(name: &str) -> SessionStore {
        let dir = std::env::temp_dir()
            .join("portalwatch-tests")
            .join(format!("{}-{}", name, std::process::id()));
        SessionStore::new(dir.join("session.json"))
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let store = temp_store("missing");
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let store = temp_store("roundtrip");
        let jar = vec![
            json!({"name": "PHPSESSID", "value": "abc123", "domain": "portal.example.ac.jp", "path": "/", "expires": -1.0}),
            json!({"name": "remember", "value": "1", "domain": "portal.example.ac.jp", "path": "/", "expires": 1_900_000_000.0}),
        ];
        store.save(&jar).unwrap();
        let loaded = store.load().expect("jar should load back");
        assert_eq!(loaded, jar);

        // Overwrite semantics: a second save replaces, never appends.
        let smaller = vec![json!({"name": "PHPSESSID", "value": "xyz", "expires": -1.0})];
        store.save(&smaller).unwrap();
        assert_eq!(store.load().unwrap(), smaller);

        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_malformed_file_is_none() {
        let store = temp_store("malformed");
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json at all").unwrap();
        assert!(store.load().is_none());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_empty_jar_is_none() {
        let store = temp_store("empty");
        store.save(&[]).unwrap();
        assert!(store.load().is_none());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_sanitize_strips_same_site_and_nothing_else() {
        let jar = vec![
            json!({"name": "a", "value": "1", "sameSite": "Strict", "secure": true}),
            json!({"name": "b", "value": "2"}),
        ];
        let out = sanitize_for_replay(&jar);
        assert!(out[0].get("sameSite").is_none());
        assert_eq!(out[0]["secure"], json!(true));
        assert_eq!(out[0]["name"], json!("a"));
        assert_eq!(out[1], jar[1]);
        // Input jar untouched.
        assert!(jar[0].get("sameSite").is_some());
    }

    #[test]
    fn test_min_expiry_ignores_session_cookies() {
        let jar = vec![
            json!({"name": "s", "value": "x", "expires": -1.0}),
            json!({"name": "p1", "value": "y", "expires": 2_000_000_000.0}),
            json!({"name": "p2", "value": "z", "expires": 1_900_000_000.0}),
        ];
        assert_eq!(min_cookie_expiry(&jar), Some(1_900_000_000.0));
        assert!(min_cookie_expiry(&[json!({"name": "s", "value": "x", "expires": -1.0})]).is_none());
    }
}
