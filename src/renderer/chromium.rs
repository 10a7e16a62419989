//! Chromium-based renderer using chromiumoxide.

use super::{NavigationResult, RenderContext, Renderer};
use crate::config::RuntimeConfig;
use crate::session::SessionCookie;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, Headers, SetExtraHttpHeadersParams, TimeSinceEpoch,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// User agent applied to every context, matching a current desktop Chrome.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How often selector waits re-poll the page.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Pause between typed characters; instant fills trip bot heuristics.
const TYPE_DELAY: Duration = Duration::from_millis(100);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. PROSPECT_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("PROSPECT_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.prospect/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".prospect/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".prospect/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".prospect/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".prospect/chromium/chrome-linux64/chrome"),
                home.join(".prospect/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance. Headless unless `config.visible` is
    /// set — a visible window is only useful when an operator will solve
    /// challenges by hand.
    pub async fn launch(config: &RuntimeConfig) -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found. Set PROSPECT_CHROMIUM_PATH or install Chrome.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--lang=en-US");
        if config.visible {
            builder = builder.with_head();
        } else {
            builder = builder.arg("--headless=new");
        }
        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch Chromium")?;

        // Spawn the handler task
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        // Shape the context like a real browser before the first
        // navigation: anti-automation defenses key on both.
        page.set_user_agent(SetUserAgentOverrideParams::new(USER_AGENT))
            .await
            .context("failed to set user agent")?;
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(
            serde_json::json!({
                "Accept-Language": "en-US,en;q=0.9",
                "Accept": "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            }),
        )))
        .await
        .context("failed to set extra headers")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        // Browser is dropped when ChromiumRenderer is dropped
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_response)) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn wait_for_navigation(&self, timeout_ms: u64) -> Result<()> {
        tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.wait_for_navigation(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("navigation wait timed out after {timeout_ms}ms"))?
        .context("navigation wait failed")?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<bool> {
        // chromiumoxide has no built-in selector wait; poll the DOM.
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.page.find_element(selector).await.is_ok())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("field not found: {selector}"))?;
        element.focus().await.context("failed to focus field")?;
        let mut buf = [0u8; 4];
        for ch in value.chars() {
            element
                .type_str(ch.encode_utf8(&mut buf))
                .await
                .with_context(|| format!("failed to type into {selector}"))?;
            tokio::time::sleep(TYPE_DELAY).await;
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("element not found: {selector}"))?;
        element
            .click()
            .await
            .with_context(|| format!("failed to click {selector}"))?;
        Ok(())
    }

    async fn get_html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;

        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert HTML result: {e:?}"))?;

        Ok(html)
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn get_cookies(&self) -> Result<Vec<SessionCookie>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .context("failed to read cookies")?;

        Ok(cookies
            .into_iter()
            .map(|c| SessionCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                // CDP reports -1 for session-scoped cookies.
                expires: (c.expires > 0.0)
                    .then(|| chrono::DateTime::from_timestamp(c.expires as i64, 0))
                    .flatten(),
                secure: c.secure,
                http_only: c.http_only,
            })
            .collect())
    }

    async fn set_cookies(&self, cookies: Vec<SessionCookie>) -> Result<()> {
        let params: Vec<CookieParam> = cookies.into_iter().map(cookie_param).collect();

        if !params.is_empty() {
            self.page
                .set_cookies(params)
                .await
                .context("failed to apply cookies")?;
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .context("failed to capture screenshot")
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}

/// Map a stored cookie back onto the wire parameter, preserving expiry
/// so a restored session cookie does not degrade to session scope.
fn cookie_param(c: SessionCookie) -> CookieParam {
    let mut cookie = CookieParam::new(c.name, c.value);
    cookie.domain = Some(c.domain);
    cookie.path = Some(c.path);
    cookie.secure = Some(c.secure);
    cookie.http_only = Some(c.http_only);
    cookie.expires = c
        .expires
        .map(|exp| TimeSinceEpoch::new(exp.timestamp() as f64));
    cookie
}
