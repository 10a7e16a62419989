//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). The
//! pipeline only talks to these traits, so tests can substitute a
//! scripted context.

pub mod chromium;

use crate::session::SessionCookie;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab).
///
/// Wait-style methods take `&self` so several can be raced with
/// `tokio::select!` over one shared borrow.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Wait for the next navigation (load event) to complete.
    async fn wait_for_navigation(&self, timeout_ms: u64) -> Result<()>;
    /// Wait for a selector to appear. `Ok(false)` means the wait timed
    /// out without the element appearing.
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<bool>;
    /// Whether an element matching the selector currently exists.
    async fn exists(&self, selector: &str) -> Result<bool>;
    /// Focus a form field and type a value into it.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;
    /// Click an element.
    async fn click(&self, selector: &str) -> Result<()>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Capture the current cookie jar.
    async fn get_cookies(&self) -> Result<Vec<SessionCookie>>;
    /// Apply a cookie jar to this context.
    async fn set_cookies(&self, cookies: Vec<SessionCookie>) -> Result<()>;
    /// Capture a full-page screenshot as PNG bytes.
    async fn screenshot(&self) -> Result<Vec<u8>>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}
