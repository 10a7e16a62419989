//! Layered profile extraction from a rendered page.
//!
//! Strategies run in a fixed order and the first complete record wins:
//! embedded structured data (JSON-LD) is preferred because it is
//! machine-authored; DOM heuristics are the fallback when a page ships
//! no metadata. A record is never returned without a name — any path
//! that cannot establish one collapses to no result.

use crate::renderer::RenderContext;
use crate::site::SiteProfile;
use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel for fields the page does not expose.
pub const UNAVAILABLE: &str = "unavailable";

/// How long to wait for the primary heading before extracting anyway.
const SETTLE_TIMEOUT_MS: u64 = 30_000;

/// Structured record produced by a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    pub photo_url: String,
    pub profile_url: String,
}

/// Result of one engine run: the record (if any) and which strategies
/// were invoked, in order.
#[derive(Debug)]
pub struct Extraction {
    pub record: Option<ProfileRecord>,
    pub attempted: Vec<&'static str>,
}

/// One way of populating a [`ProfileRecord`] from the current page.
///
/// An attempt either yields a complete record or signals no match —
/// never a partial one.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(
        &self,
        ctx: &dyn RenderContext,
        site: &SiteProfile,
    ) -> Result<Option<ProfileRecord>>;
}

/// Strategy 1: JSON-LD entity of the site's expected type.
pub struct StructuredDataStrategy;

#[async_trait]
impl ExtractionStrategy for StructuredDataStrategy {
    fn name(&self) -> &'static str {
        "structured-data"
    }

    async fn attempt(
        &self,
        ctx: &dyn RenderContext,
        site: &SiteProfile,
    ) -> Result<Option<ProfileRecord>> {
        let html = ctx.get_html().await?;
        Ok(record_from_structured_data(&html, site))
    }
}

/// Strategy 2: known heading and image selectors.
pub struct DomHeuristicsStrategy;

#[async_trait]
impl ExtractionStrategy for DomHeuristicsStrategy {
    fn name(&self) -> &'static str {
        "dom-heuristics"
    }

    async fn attempt(
        &self,
        ctx: &dyn RenderContext,
        site: &SiteProfile,
    ) -> Result<Option<ProfileRecord>> {
        let html = ctx.get_html().await?;
        let current_url = ctx.get_url().await?;
        Ok(record_from_dom(&html, &current_url, site))
    }
}

/// Ordered fallback chain of extraction strategies.
pub struct ExtractionEngine {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(StructuredDataStrategy),
                Box::new(DomHeuristicsStrategy),
            ],
        }
    }
}

impl ExtractionEngine {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Run the strategy chain against the current page. First complete
    /// record wins; strategies that error are logged and skipped so a
    /// flaky evaluation cannot mask a later match.
    pub async fn extract(&self, ctx: &dyn RenderContext, site: &SiteProfile) -> Result<Extraction> {
        // Give late-populating pages a chance to render the heading.
        // A timeout here is tolerated: strategy order handles the rest.
        let heading_union = site.heading_selectors.join(", ");
        match ctx.wait_for_selector(&heading_union, SETTLE_TIMEOUT_MS).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("heading did not appear within settle wait, extracting anyway"),
            Err(e) => tracing::debug!(error = %e, "settle wait failed, extracting anyway"),
        }

        let mut attempted = Vec::new();
        for strategy in &self.strategies {
            attempted.push(strategy.name());
            match strategy.attempt(ctx, site).await {
                Ok(Some(record)) => {
                    tracing::info!(strategy = strategy.name(), name = %record.name, "extraction succeeded");
                    return Ok(Extraction {
                        record: Some(record),
                        attempted,
                    });
                }
                Ok(None) => {
                    tracing::debug!(strategy = strategy.name(), "strategy found no match");
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), error = %e, "strategy errored, trying next");
                }
            }
        }

        tracing::info!("no extraction strategy produced a record");
        Ok(Extraction {
            record: None,
            attempted,
        })
    }
}

/// Scan JSON-LD blocks for an entity of the expected type and map it to
/// a record. Missing photo/url sub-fields default to [`UNAVAILABLE`];
/// a missing name disqualifies the block entirely.
pub fn record_from_structured_data(html: &str, site: &SiteProfile) -> Option<ProfileRecord> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    for element in document.select(&sel) {
        let text = element.inner_html();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(_) => continue, // malformed blocks are skipped, not fatal
        };

        // Entities may be at the top level or inside an @graph array.
        if let Some(graph) = value.get("@graph").and_then(|g| g.as_array()) {
            for item in graph {
                if let Some(record) = entity_to_record(item, site.entity_type) {
                    return Some(record);
                }
            }
        } else if let Some(record) = entity_to_record(&value, site.entity_type) {
            return Some(record);
        }
    }
    None
}

fn entity_to_record(value: &Value, entity_type: &str) -> Option<ProfileRecord> {
    if value.get("@type").and_then(|t| t.as_str()) != Some(entity_type) {
        return None;
    }

    let name = value
        .get("name")
        .and_then(|n| n.as_str())
        .map(str::trim)
        .filter(|n| !n.is_empty())?;

    // `image` is either a bare string or an ImageObject with a url.
    let photo_url = value
        .get("image")
        .and_then(|i| {
            i.as_str()
                .or_else(|| i.get("url").and_then(|u| u.as_str()))
        })
        .unwrap_or(UNAVAILABLE);

    let profile_url = value
        .get("url")
        .and_then(|u| u.as_str())
        .unwrap_or(UNAVAILABLE);

    Some(ProfileRecord {
        name: name.to_string(),
        photo_url: photo_url.to_string(),
        profile_url: profile_url.to_string(),
    })
}

/// Extract a record from visible DOM structure: the first matching
/// heading supplies the name, the first matching image the photo, and
/// the resolved URL the profile link.
pub fn record_from_dom(html: &str, current_url: &str, site: &SiteProfile) -> Option<ProfileRecord> {
    let document = Html::parse_document(html);

    let name = site.heading_selectors.iter().find_map(|selector| {
        let sel = Selector::parse(selector).ok()?;
        document.select(&sel).find_map(|el| {
            let text = el.text().collect::<String>().trim().to_string();
            (!text.is_empty()).then_some(text)
        })
    })?;

    let photo_url = site
        .photo_selectors
        .iter()
        .find_map(|selector| {
            let sel = Selector::parse(selector).ok()?;
            document
                .select(&sel)
                .find_map(|el| el.value().attr("src").map(str::to_string))
        })
        .map(|src| resolve_url(current_url, &src))
        .unwrap_or_else(|| UNAVAILABLE.to_string());

    Some(ProfileRecord {
        name,
        photo_url,
        profile_url: current_url.to_string(),
    })
}

/// Resolve a possibly-relative image source against the page URL.
fn resolve_url(base: &str, href: &str) -> String {
    match url::Url::parse(base).and_then(|b| b.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}
