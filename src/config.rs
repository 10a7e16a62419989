//! Runtime configuration: account credentials and on-disk layout.

use crate::error::PipelineError;
use crate::site::SiteProfile;
use std::path::PathBuf;

/// Credentials for the automated account, supplied out-of-band.
#[derive(Clone)]
pub struct AccountCredentials {
    pub identifier: String,
    pub secret: String,
}

impl AccountCredentials {
    /// Load credentials from the site's configured env vars.
    ///
    /// Absence is a fatal configuration error, never a retry case.
    pub fn from_env(site: &SiteProfile) -> Result<Self, PipelineError> {
        let identifier = std::env::var(site.identifier_env).map_err(|_| {
            PipelineError::Configuration(format!("{} is not set", site.identifier_env))
        })?;
        let secret = std::env::var(site.secret_env).map_err(|_| {
            PipelineError::Configuration(format!("{} is not set", site.secret_env))
        })?;
        if identifier.trim().is_empty() || secret.is_empty() {
            return Err(PipelineError::Configuration(format!(
                "{} / {} must be non-empty",
                site.identifier_env, site.secret_env
            )));
        }
        Ok(Self { identifier, secret })
    }
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret.
        f.debug_struct("AccountCredentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// On-disk layout under `~/.prospect/`.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Directory holding one session file per site.
    pub session_dir: PathBuf,
    /// Directory receiving diagnostic artifacts.
    pub diagnostics_dir: PathBuf,
    /// Launch the browser with a visible window.
    pub visible: bool,
}

impl RuntimeConfig {
    /// Default layout rooted at `~/.prospect/`.
    pub fn default_layout() -> Self {
        let root = prospect_home();
        Self {
            session_dir: root.join("sessions"),
            diagnostics_dir: root.join("diagnostics"),
            visible: false,
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Root data directory (`~/.prospect`, or `/tmp/.prospect` without a home).
pub fn prospect_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".prospect")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_is_configuration_error() {
        let mut site = SiteProfile::linkedin();
        site.identifier_env = "PROSPECT_TEST_UNSET_ID";
        site.secret_env = "PROSPECT_TEST_UNSET_SECRET";
        let err = AccountCredentials::from_env(&site).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = AccountCredentials {
            identifier: "user@example.com".to_string(),
            secret: "hunter2".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("user@example.com"));
    }

    #[test]
    fn test_default_layout_paths() {
        let cfg = RuntimeConfig::default_layout();
        assert!(cfg.session_dir.ends_with("sessions"));
        assert!(cfg.diagnostics_dir.ends_with("diagnostics"));
        assert!(!cfg.visible);
    }
}
