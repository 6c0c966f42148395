use crate::error::QueryError;
use crate::scrapers::traits::{DocumentQuery, Locator};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Listing document backed by static HTML.
///
/// Nothing renders here, so timeouts are ignored, `click` only checks that
/// its target exists and every tab panel is read as delivered.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    url: String,
    source: String,
}

impl HtmlDocument {
    pub fn new(url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    // `Html` is not `Send`, so it is parsed per query and never held across
    // an await point.
    fn parse(&self) -> Html {
        Html::parse_document(&self.source)
    }

    fn first_match<T>(
        &self,
        locator: &Locator,
        read: impl FnOnce(ElementRef<'_>) -> Option<T>,
    ) -> Result<Option<T>, QueryError> {
        let selector = parse_selector(&locator.selector)?;
        let inner = locator.inner.as_deref().map(parse_selector).transpose()?;
        let document = self.parse();

        let Some(element) = document
            .select(&selector)
            .find(|element| locator.text_matches(&text_of(*element)))
        else {
            return Ok(None);
        };

        let target = match &inner {
            Some(inner) => element.select(inner).next(),
            None => Some(element),
        };

        Ok(target.and_then(read))
    }

    fn all_matches<T>(&self, selector: &str, read: impl Fn(ElementRef<'_>) -> T) -> Result<Vec<T>, QueryError> {
        let selector = parse_selector(selector)?;
        let document = self.parse();
        let values = document.select(&selector).map(read).collect();
        Ok(values)
    }

    fn require(&self, locator: &Locator) -> Result<(), QueryError> {
        match self.first_match(locator, |_| Some(()))? {
            Some(()) => Ok(()),
            None => Err(QueryError::NotFound(locator.selector.clone())),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, QueryError> {
    Selector::parse(selector).map_err(|_| QueryError::InvalidSelector(selector.to_string()))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn log_failure<T: Default>(result: Result<T, QueryError>) -> T {
    result.unwrap_or_else(|err| {
        warn!(error = %err, "document query failed");
        T::default()
    })
}

#[async_trait]
impl DocumentQuery for HtmlDocument {
    fn url(&self) -> String {
        self.url.clone()
    }

    async fn locate_text(&self, locator: &Locator, _timeout: Duration) -> Option<String> {
        log_failure(self.first_match(locator, |element| Some(text_of(element).trim().to_string())))
    }

    async fn locate_attribute(&self, selector: &str, name: &str, _timeout: Duration) -> Option<String> {
        let locator = Locator::new(selector);
        log_failure(self.first_match(&locator, |element| element.value().attr(name).map(str::to_string)))
    }

    async fn attribute_values(&self, selector: &str, name: &str) -> Vec<Option<String>> {
        log_failure(self.all_matches(selector, |element| element.value().attr(name).map(str::to_string)))
    }

    async fn count(&self, selector: &str) -> usize {
        log_failure(self.all_matches(selector, |_| ())).len()
    }

    async fn click(&self, locator: &Locator, _timeout: Duration) -> Result<(), QueryError> {
        self.require(locator)
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<(), QueryError> {
        self.require(&Locator::new(selector))
    }
}

/// HTTP client used for plain (non-rendered) page retrieval
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

/// Downloads a page and wraps it as a static listing document
pub async fn fetch_document(client: &Client, url: &str) -> Result<HtmlDocument> {
    debug!("Fetching URL: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to fetch {}: {}", url, response.status());
    }

    let final_url = response.url().to_string();
    let html = response.text().await.context("Failed to read response body")?;
    debug!("Downloaded {} bytes of HTML", html.len());

    Ok(HtmlDocument::new(final_url, html))
}
