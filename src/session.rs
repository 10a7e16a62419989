//! Session credential persistence.
//!
//! A session is a captured cookie jar keyed by site. Credentials are
//! replaced wholesale on save — never merged — so a stored set is always
//! the product of exactly one successful login. Storage is best-effort:
//! I/O failures degrade to "no session" and never fail the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One cookie entry captured from the browsing context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Absent for session-scoped cookies.
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
}

/// A full captured cookie jar for one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCredentials {
    pub cookies: Vec<SessionCookie>,
    pub captured_at: DateTime<Utc>,
}

impl SessionCredentials {
    pub fn new(cookies: Vec<SessionCookie>) -> Self {
        Self {
            cookies,
            captured_at: Utc::now(),
        }
    }

    /// A credential set is usable iff it contains at least one entry
    /// with the site's session-cookie name whose expiry is strictly in
    /// the future at check time.
    pub fn is_usable(&self, session_cookie: &str, now: DateTime<Utc>) -> bool {
        self.cookies.iter().any(|c| {
            c.name == session_cookie && c.expires.map(|exp| exp > now).unwrap_or(false)
        })
    }
}

/// File-backed session store, one JSON file per site.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn site_path(&self, site: &str) -> PathBuf {
        self.dir.join(format!("{site}.json"))
    }

    /// Load stored credentials for a site.
    ///
    /// Returns `None` when no credentials exist, when the stored file is
    /// unreadable or malformed, and when the stored set fails the
    /// usability check — callers treat all of these as "must
    /// re-authenticate".
    pub fn load(&self, site: &str, session_cookie: &str) -> Option<SessionCredentials> {
        let path = self.site_path(site);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read session file");
                return None;
            }
        };

        let creds: SessionCredentials = match serde_json::from_str(&raw) {
            Ok(creds) => creds,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed session file, discarding");
                return None;
            }
        };

        if !creds.is_usable(session_cookie, Utc::now()) {
            tracing::info!(site, "stored session is expired or missing its session cookie");
            return None;
        }

        Some(creds)
    }

    /// Persist credentials for a site, atomically replacing any prior
    /// set. Failures are logged and swallowed — persistence is
    /// best-effort.
    pub fn save(&self, site: &str, creds: &SessionCredentials) {
        if let Err(e) = self.save_inner(site, creds) {
            tracing::warn!(site, error = %e, "failed to persist session credentials");
        } else {
            tracing::info!(site, cookies = creds.cookies.len(), "session credentials saved");
        }
    }

    fn save_inner(&self, site: &str, creds: &SessionCredentials) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.site_path(site);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(creds)?;
        std::fs::write(&tmp, json)?;
        // Rename is atomic on the same filesystem, so readers never see
        // a partially written credential set.
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Remove stored credentials for a site. Returns whether a file
    /// existed.
    pub fn clear(&self, site: &str) -> bool {
        let path = self.site_path(site);
        match std::fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove session file");
                false
            }
        }
    }

    /// Path of the session file for a site, for diagnostics output.
    pub fn path_for(&self, site: &str) -> PathBuf {
        self.site_path(site)
    }
}
