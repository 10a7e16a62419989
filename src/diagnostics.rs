//! Best-effort failure diagnostics.
//!
//! On any failure exit the pipeline snapshots the rendered page and its
//! raw markup for postmortem. Capture failures are logged and swallowed
//! so they can never mask the original error.

use crate::renderer::RenderContext;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Writes diagnostic artifacts (screenshot + HTML) to a directory.
pub struct DiagnosticsSink {
    dir: PathBuf,
}

impl DiagnosticsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Snapshot the current page under a labelled, timestamped name.
    ///
    /// Returns the artifact paths that were actually written. Never
    /// fails: every error is logged and skipped.
    pub async fn capture(&self, ctx: &dyn RenderContext, label: &str) -> Vec<PathBuf> {
        let mut written = Vec::new();

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "cannot create diagnostics dir");
            return written;
        }

        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let base = self.dir.join(format!("{stamp}-{}", sanitize_label(label)));

        match ctx.screenshot().await {
            Ok(png) => {
                let path = base.with_extension("png");
                match std::fs::write(&path, png) {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "diagnostic screenshot saved");
                        written.push(path);
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to write diagnostic screenshot"),
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to capture diagnostic screenshot"),
        }

        match ctx.get_html().await {
            Ok(html) => {
                let path = base.with_extension("html");
                match std::fs::write(&path, html) {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "diagnostic markup saved");
                        written.push(path);
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to write diagnostic markup"),
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to read page markup"),
        }

        written
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("login-error"), "login-error");
        assert_eq!(sanitize_label("target blocked!"), "target-blocked-");
    }
}
