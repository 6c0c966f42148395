use crate::error::QueryError;
use async_trait::async_trait;
use std::time::Duration;

/// Element query: a CSS selector, optionally narrowed to elements whose text
/// contains `has_text`, optionally descending into `inner` within the first
/// such element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub selector: String,
    pub has_text: Option<String>,
    pub inner: Option<String>,
}

impl Locator {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            has_text: None,
            inner: None,
        }
    }

    pub fn has_text(mut self, text: impl Into<String>) -> Self {
        self.has_text = Some(text.into());
        self
    }

    pub fn inner(mut self, selector: impl Into<String>) -> Self {
        self.inner = Some(selector.into());
        self
    }

    /// Text filter match: case-insensitive, whitespace-normalised substring
    pub fn text_matches(&self, element_text: &str) -> bool {
        match &self.has_text {
            Some(needle) => normalize(element_text).contains(&normalize(needle)),
            None => true,
        }
    }
}

fn normalize(text: &str) -> String {
    crate::parsers::text::squash_whitespace(text).to_lowercase()
}

/// Read access to one rendered listing document.
///
/// Absence and timeouts are ordinary outcomes: reads return `None` (or an
/// empty list / zero) and never fail the caller.
#[async_trait]
pub trait DocumentQuery: Send + Sync {
    /// Current URL of the document
    fn url(&self) -> String;

    /// Trimmed text content of the first element matching `locator`
    async fn locate_text(&self, locator: &Locator, timeout: Duration) -> Option<String>;

    /// Attribute of the first element matching `selector`
    async fn locate_attribute(&self, selector: &str, name: &str, timeout: Duration) -> Option<String>;

    /// Attribute of every element matching `selector`, in document order
    async fn attribute_values(&self, selector: &str, name: &str) -> Vec<Option<String>>;

    /// Number of elements matching `selector`, zero if the query fails
    async fn count(&self, selector: &str) -> usize;

    /// Clicks the first element matching `locator`
    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<(), QueryError>;

    /// Waits until `selector` matches at least one element
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), QueryError>;
}
