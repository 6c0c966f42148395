use crate::config::ScrapperConfig;
use crate::error::QueryError;
use crate::parsers::text::uuid_from_text;
use crate::pipeline::{ListingOutcome, ListingScrapper};
use crate::scrapers::frontier::{CrawlFrontier, CrawlRequest, RequestLabel, RetryDecision};
use crate::scrapers::traits::{DocumentQuery, Locator};
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const LIST_CONTENT: &str = ".list-content-properties";
const DETAIL_LINK: &str = ".property-info-content > a";
const PAGINATION: &str = ".pagination";
const PAGINATION_LINK: &str = ".pagination > a";

// Shared by every locator script: `find(selector, needle)` returns the first
// element whose normalised text contains `needle` (any element when null).
const FIND_ELEMENT: &str = r#"
    const norm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
    const find = (selector, needle) => Array.from(document.querySelectorAll(selector))
        .find((el) => needle === null || norm(el.textContent).includes(norm(needle)));
"#;

/// Listing document rendered in a headless Chrome tab.
///
/// Every call is a blocking CDP round trip, so each runs on tokio's blocking
/// pool. Scripts return JSON strings to get arrays back by value.
pub struct BrowserPage {
    tab: Arc<Tab>,
}

fn js_literal<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn locator_script(locator: &Locator, action: &str) -> String {
    format!(
        "(() => {{ {find} const el = find({selector}, {needle}); const inner = {inner}; \
         const target = el && inner !== null ? el.querySelector(inner) : el; {action} }})()",
        find = FIND_ELEMENT,
        selector = js_literal(&locator.selector),
        needle = js_literal(&locator.has_text),
        inner = js_literal(&locator.inner),
        action = action,
    )
}

fn eval_json<T: DeserializeOwned>(tab: &Tab, script: &str) -> Result<T, QueryError> {
    let result = tab
        .evaluate(script, false)
        .map_err(|err| QueryError::Driver(err.to_string()))?;

    let raw = result
        .value
        .as_ref()
        .and_then(|value| value.as_str())
        .ok_or_else(|| QueryError::Driver("script returned no value".to_string()))?;

    serde_json::from_str(raw).map_err(|err| QueryError::Driver(err.to_string()))
}

impl BrowserPage {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    async fn blocking<T, F>(&self, call: F) -> Result<T, QueryError>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> Result<T, QueryError> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || call(&tab))
            .await
            .map_err(|err| QueryError::Driver(err.to_string()))?
    }

    async fn evaluate<T: DeserializeOwned + Send + 'static>(&self, script: String) -> Result<T, QueryError> {
        self.blocking(move |tab| eval_json(tab, &script)).await
    }

    /// Loads `url` and waits for navigation to settle
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        let tab = Arc::clone(&self.tab);

        tokio::task::spawn_blocking(move || -> Result<()> {
            tab.navigate_to(&url)
                .with_context(|| format!("Failed to navigate to {url}"))?
                .wait_until_navigated()
                .context("Page did not finish loading")?;
            Ok(())
        })
        .await
        .context("Navigation task failed")?
    }

    /// Absolute hrefs of the links matching `selector`
    pub async fn links(&self, selector: &str) -> Vec<String> {
        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})).map((el) => el.href).filter(Boolean))",
            js_literal(selector)
        );
        self.evaluate(script).await.unwrap_or_else(|err| {
            debug!(selector, error = %err, "could not read links");
            Vec::new()
        })
    }

    /// Serialised DOM, used for debug dumps
    pub async fn content(&self) -> Result<String, QueryError> {
        self.blocking(|tab| tab.get_content().map_err(|err| QueryError::Driver(err.to_string())))
            .await
    }
}

#[async_trait]
impl DocumentQuery for BrowserPage {
    fn url(&self) -> String {
        self.tab.get_url()
    }

    async fn locate_text(&self, locator: &Locator, timeout: Duration) -> Option<String> {
        if self.wait_for(&locator.selector, timeout).await.is_err() {
            return None;
        }

        let script = locator_script(
            locator,
            "return JSON.stringify(target ? target.textContent : null);",
        );
        match self.evaluate::<Option<String>>(script).await {
            Ok(text) => text.map(|text| text.trim().to_string()),
            Err(err) => {
                debug!(selector = %locator.selector, error = %err, "text query failed");
                None
            }
        }
    }

    async fn locate_attribute(&self, selector: &str, name: &str, timeout: Duration) -> Option<String> {
        if self.wait_for(selector, timeout).await.is_err() {
            return None;
        }

        let script = format!(
            "(() => {{ const el = document.querySelector({}); return JSON.stringify(el ? el.getAttribute({}) : null); }})()",
            js_literal(selector),
            js_literal(name)
        );
        self.evaluate::<Option<String>>(script).await.ok().flatten()
    }

    async fn attribute_values(&self, selector: &str, name: &str) -> Vec<Option<String>> {
        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})).map((el) => el.getAttribute({})))",
            js_literal(selector),
            js_literal(name)
        );
        self.evaluate(script).await.unwrap_or_default()
    }

    async fn count(&self, selector: &str) -> usize {
        let script = format!(
            "JSON.stringify(document.querySelectorAll({}).length)",
            js_literal(selector)
        );
        self.evaluate(script).await.unwrap_or(0)
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<(), QueryError> {
        self.wait_for(&locator.selector, timeout).await?;

        let script = locator_script(
            locator,
            "if (!target) { return JSON.stringify(false); } target.click(); return JSON.stringify(true);",
        );
        match self.evaluate::<bool>(script).await? {
            true => Ok(()),
            false => Err(QueryError::NotFound(locator.selector.clone())),
        }
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), QueryError> {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            tab.wait_for_element_with_custom_timeout(&selector, timeout)
                .map(|_| ())
                .map_err(|_| QueryError::Timeout(selector.clone()))
        })
        .await
    }
}

/// Totals for one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub list_pages: usize,
    pub delivered: usize,
    pub skipped: usize,
    pub retried: usize,
    pub failed: usize,
}

/// Minimal crawl driver: walks search pages in a single tab and feeds every
/// listing page to a [`ListingScrapper`].
///
/// Retryable listings are re-queued at the back up to
/// `max_request_retries` times.
pub struct BrowserCrawler {
    browser: Browser,
    config: ScrapperConfig,
}

impl BrowserCrawler {
    pub fn new(config: ScrapperConfig) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .idle_browser_timeout(config.navigation_timeout)
            .args(vec![OsStr::new("--ignore-certificate-errors")])
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self { browser, config })
    }

    /// Crawls every configured target. The scrapper's partial batch is left
    /// for the caller to flush.
    pub async fn run(&self, scrapper: &ListingScrapper) -> Result<CrawlStats> {
        let tab = self.browser.new_tab().context("Failed to open tab")?;
        tab.set_default_timeout(self.config.navigation_timeout);
        let page = BrowserPage::new(tab);

        let mut frontier = CrawlFrontier::seeded(
            self.config.target_urls.iter().cloned(),
            self.config.max_request_retries,
        );
        let mut stats = CrawlStats::default();

        while let Some(request) = frontier.pop() {
            if let Err(err) = page.navigate(&request.url).await {
                warn!(url = %request.url, error = %err, "Navigation failed");
                stats.failed += 1;
                continue;
            }

            match request.label {
                RequestLabel::List => {
                    stats.list_pages += 1;
                    for found in self.discover(&page, &request.url).await {
                        frontier.enqueue(found);
                    }
                }
                RequestLabel::Detail => match scrapper.handle_detail(&page).await {
                    Ok(ListingOutcome::Delivered { .. }) => stats.delivered += 1,
                    Ok(ListingOutcome::Skipped(reason)) => {
                        debug!(url = %request.url, reason = %reason, "Listing skipped");
                        stats.skipped += 1;
                    }
                    Err(err) if err.is_retryable() => {
                        self.dump_page(&page, &request).await;

                        let url = request.url.clone();
                        match frontier.retry(request) {
                            RetryDecision::Requeued { attempt } => {
                                info!(url = %url, attempt, error = %err, "Re-queueing listing");
                                stats.retried += 1;
                            }
                            RetryDecision::GaveUp => {
                                warn!(url = %url, error = %err, "Giving up on listing");
                                stats.failed += 1;
                            }
                        }
                    }
                    Err(err) => return Err(err.into()),
                },
            }
        }

        info!(?stats, "Crawl finished");
        Ok(stats)
    }

    /// Listing and pagination links of a search page
    async fn discover(&self, page: &BrowserPage, url: &str) -> Vec<CrawlRequest> {
        info!("[{}] Enqueueing pagination", url);

        if let Err(err) = page.wait_for(LIST_CONTENT, self.config.list_timeout).await {
            debug!(url, error = %err, "No listings on page");
            return Vec::new();
        }

        let mut found: Vec<CrawlRequest> = page
            .links(DETAIL_LINK)
            .await
            .into_iter()
            .map(|link| CrawlRequest::new(link, RequestLabel::Detail))
            .collect();
        info!("[{}] Enqueueing {} property details", url, found.len());

        if page.wait_for(PAGINATION, self.config.list_timeout).await.is_ok() {
            found.extend(
                page.links(PAGINATION_LINK)
                    .await
                    .into_iter()
                    .map(|link| CrawlRequest::new(link, RequestLabel::List)),
            );
        }

        found
    }

    /// Saves the rendered page of a listing that failed a retryable check
    async fn dump_page(&self, page: &BrowserPage, request: &CrawlRequest) {
        let Some(dir) = &self.config.debug_dir else {
            return;
        };

        let html = match page.content().await {
            Ok(html) => html,
            Err(err) => {
                debug!(error = %err, "Could not capture page HTML");
                return;
            }
        };

        let name = uuid_from_text(&request.url).unwrap_or("listing");
        let path = dir.join(format!("{}-{}.html", name, request.attempt));

        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, html).await
        };
        match written.await {
            Ok(()) => info!("Saved page HTML to {}", path.display()),
            Err(err) => warn!(error = %err, "Could not save page HTML"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_script_embeds_escaped_arguments() {
        let locator = Locator::new("div > span")
            .has_text("Casa(s) de \"Banho\"")
            .inner("strong");
        let script = locator_script(&locator, "return 1;");

        assert!(script.contains(r#"find("div > span", "Casa(s) de \"Banho\"")"#));
        assert!(script.contains(r#"const inner = "strong";"#));
        assert!(script.ends_with("return 1; })()"));
    }

    #[test]
    fn locator_script_without_filters_passes_null() {
        let script = locator_script(&Locator::new("h1"), "return 1;");
        assert!(script.contains(r#"find("h1", null)"#));
        assert!(script.contains("const inner = null;"));
    }
}
