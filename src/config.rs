use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of rows per delivered batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Search pages the crawl starts from when none are given
pub const DEFAULT_TARGET_URLS: &[&str] = &[
    "https://casa.sapo.pt/comprar-apartamentos/lisboa/",
    "https://casa.sapo.pt/comprar-moradias/lisboa/",
    "https://casa.sapo.pt/comprar-apartamentos/porto/",
    "https://casa.sapo.pt/comprar-moradias/porto/",
    "https://casa.sapo.pt/comprar-terrenos/setubal/",
    "https://casa.sapo.pt/alugar-apartamentos/lisboa/",
];

/// Runtime settings for a scrape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapperConfig {
    /// Bound on every individual document read
    pub parser_timeout: Duration,
    /// Bound on loading a page in the browser
    pub navigation_timeout: Duration,
    /// How long a search page may take to show its listings or pagination
    pub list_timeout: Duration,
    /// How many times a retryable listing is re-queued
    pub max_request_retries: u32,
    pub batch_size: usize,
    pub headless: bool,
    pub target_urls: Vec<String>,
    /// Where pages of failed listings are dumped, when set
    pub debug_dir: Option<PathBuf>,
}

impl Default for ScrapperConfig {
    fn default() -> Self {
        Self {
            parser_timeout: Duration::from_secs(1),
            navigation_timeout: Duration::from_secs(60 * 5),
            list_timeout: Duration::from_secs(30),
            max_request_retries: 3,
            batch_size: DEFAULT_BATCH_SIZE,
            headless: true,
            target_urls: DEFAULT_TARGET_URLS.iter().map(|url| url.to_string()).collect(),
            debug_dir: None,
        }
    }
}

impl ScrapperConfig {
    /// Parses a JSON config; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid scrapper config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn with_parser_timeout(mut self, timeout: Duration) -> Self {
        self.parser_timeout = timeout;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_debug_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_dir = dir;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_target_urls(mut self, urls: Vec<String>) -> Self {
        if !urls.is_empty() {
            self.target_urls = urls;
        }
        self
    }
}
