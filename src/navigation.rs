//! Page loads with bounded retry and content-level block detection.
//!
//! Transport failures (timeouts, connection resets) are retried with a
//! fixed delay. Content-level blocks — verification challenges and
//! not-found pages — are classified after a successful load and are
//! never retried here: a challenge is escalated to the authentication
//! flow and a not-found page is terminal.

use crate::renderer::RenderContext;
use crate::site::SiteProfile;
use anyhow::Result;
use scraper::{Html, Selector};
use std::time::Duration;

/// Transport retry budget per `open` call.
pub const MAX_ATTEMPTS: u32 = 3;

/// Delay between transport retries.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Per-attempt navigation timeout.
const NAVIGATION_TIMEOUT_MS: u64 = 120_000;

/// Extra settle wait applied in network-quiescent mode.
const QUIESCE_TIMEOUT_MS: u64 = 10_000;

/// Why a successfully loaded page is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// An anti-automation verification challenge is being shown.
    Challenge,
    /// The target does not exist or is restricted.
    NotFound,
}

/// Tagged result of attempting to load a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Loaded,
    /// Transport failed on every attempt; carries the last cause.
    TransientFailure(String),
    /// The page loaded but shows blocking content instead of the target.
    Blocked(BlockReason),
}

/// Wait condition for a page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Return as soon as the DOM is ready. Used for the login surface,
    /// which is cheap and mostly static.
    DomReady,
    /// Additionally wait for the network to go quiet. Used for target
    /// pages that populate content after load.
    NetworkIdle,
}

/// Navigation controller bound to one site's block markers.
pub struct Navigator<'a> {
    site: &'a SiteProfile,
}

impl<'a> Navigator<'a> {
    pub fn new(site: &'a SiteProfile) -> Self {
        Self { site }
    }

    /// Load a URL, retrying transport failures up to [`MAX_ATTEMPTS`]
    /// with [`RETRY_DELAY`] between attempts, then classify the loaded
    /// content.
    pub async fn open(
        &self,
        ctx: &mut dyn RenderContext,
        url: &str,
        mode: WaitMode,
    ) -> Result<NavigationOutcome> {
        let mut last_error = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            match ctx.navigate(url, NAVIGATION_TIMEOUT_MS).await {
                Ok(nav) => {
                    tracing::debug!(url, attempt, load_time_ms = nav.load_time_ms, "page loaded");
                    if mode == WaitMode::NetworkIdle {
                        // Best-effort: a page that never goes quiet is
                        // still classified below.
                        let _ = ctx.wait_for_navigation(QUIESCE_TIMEOUT_MS).await;
                    }
                    let html = ctx.get_html().await?;
                    return Ok(classify_page(&html, self.site));
                }
                Err(e) => {
                    tracing::warn!(
                        url,
                        attempt,
                        remaining = MAX_ATTEMPTS - attempt,
                        error = %e,
                        "navigation attempt failed"
                    );
                    last_error = e.to_string();
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }

        Ok(NavigationOutcome::TransientFailure(last_error))
    }
}

/// Classify loaded page content against the site's block markers.
///
/// Challenge markers take precedence over not-found markers: a
/// verification interstitial can replace any page.
pub fn classify_page(html: &str, site: &SiteProfile) -> NavigationOutcome {
    let document = Html::parse_document(html);
    let title = page_title(&document);

    if has_selector(&document, site.challenge_selector)
        || title.contains(site.challenge_title)
    {
        return NavigationOutcome::Blocked(BlockReason::Challenge);
    }

    if has_selector(&document, site.error_page_selector)
        || title.contains(site.not_found_title)
    {
        return NavigationOutcome::Blocked(BlockReason::NotFound);
    }

    NavigationOutcome::Loaded
}

fn page_title(document: &Html) -> String {
    let sel = match Selector::parse("title") {
        Ok(s) => s,
        Err(_) => return String::new(),
    };
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
}

fn has_selector(document: &Html, selector: &str) -> bool {
    match Selector::parse(selector) {
        Ok(sel) => document.select(&sel).next().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteProfile {
        SiteProfile::linkedin()
    }

    #[test]
    fn test_classify_plain_page_is_loaded() {
        let html = "<html><head><title>Jane Doe | Profile</title></head><body><h1>Jane Doe</h1></body></html>";
        assert_eq!(classify_page(html, &site()), NavigationOutcome::Loaded);
    }

    #[test]
    fn test_classify_challenge_form() {
        let html = r#"<html><body><form class="challenge-form"></form></body></html>"#;
        assert_eq!(
            classify_page(html, &site()),
            NavigationOutcome::Blocked(BlockReason::Challenge)
        );
    }

    #[test]
    fn test_classify_challenge_title() {
        let html = "<html><head><title>Verify your identity</title></head><body></body></html>";
        assert_eq!(
            classify_page(html, &site()),
            NavigationOutcome::Blocked(BlockReason::Challenge)
        );
    }

    #[test]
    fn test_classify_not_found_marker() {
        let html = r#"<html><body><div class="error-page">Gone</div></body></html>"#;
        assert_eq!(
            classify_page(html, &site()),
            NavigationOutcome::Blocked(BlockReason::NotFound)
        );
    }

    #[test]
    fn test_classify_not_found_title() {
        let html = "<html><head><title>Page not found</title></head><body></body></html>";
        assert_eq!(
            classify_page(html, &site()),
            NavigationOutcome::Blocked(BlockReason::NotFound)
        );
    }

    #[test]
    fn test_challenge_wins_over_not_found() {
        let html = r#"<html><head><title>Page not found</title></head>
            <body><form class="challenge-form"></form></body></html>"#;
        assert_eq!(
            classify_page(html, &site()),
            NavigationOutcome::Blocked(BlockReason::Challenge)
        );
    }
}
