use anyhow::{Context, Result};
use casa_scout::scrapers::html::{fetch_document, http_client};
use casa_scout::scrapers::{BrowserCrawler, DocumentQuery, HtmlDocument};
use casa_scout::{ListingOutcome, ListingScrapper, OnScrapped, ScrappedRow, ScrapperConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SUMMARY_FILE: &str = "scraped_properties.json";

#[derive(Parser)]
#[command(name = "casa-scout", about = "Property listing scraper for casa.sapo.pt")]
struct Cli {
    /// JSON config file; flags given on the command line take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory the per-row or per-batch JSON files are written to
    #[arg(long, global = true, default_value = "raw_scrape")]
    out_dir: PathBuf,

    /// Deliver rows in batches of this size instead of one by one
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Timeout for each document read, in milliseconds
    #[arg(long, global = true)]
    parser_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl search pages in headless Chrome and scrape every listing found
    Crawl {
        /// Search page to start from (repeatable); defaults to the built-in list
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Show the browser window
        #[arg(long)]
        headful: bool,

        /// How many times a listing caught mid-render is re-queued
        #[arg(long)]
        retries: Option<u32>,

        /// Save the HTML of listings that failed a retryable check
        #[arg(long)]
        debug_dir: Option<PathBuf>,
    },
    /// Scrape a listing page saved to disk
    Parse {
        file: PathBuf,

        /// URL the page was served from; carries the listing id
        #[arg(long)]
        url: String,
    },
    /// Download a listing page without rendering it and scrape it
    Fetch { url: String },
}

/// Writes delivered rows to disk and keeps them for the summary file
struct RowSink {
    dir: PathBuf,
    rows: Mutex<Vec<ScrappedRow>>,
    batches: AtomicUsize,
}

impl RowSink {
    fn new(dir: PathBuf) -> Result<Arc<Self>> {
        std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Arc::new(Self {
            dir,
            rows: Mutex::new(Vec::new()),
            batches: AtomicUsize::new(0),
        }))
    }

    fn write_row(&self, row: ScrappedRow) -> Result<()> {
        write_json(&self.dir.join(format!("{}.json", row.id)), &row)?;
        info!("💾 Saved property {}", row.id);
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).push(row);
        Ok(())
    }

    fn write_batch(&self, rows: Vec<ScrappedRow>) -> Result<()> {
        let index = self.batches.fetch_add(1, Ordering::SeqCst);
        write_json(&self.dir.join(format!("batch-{index:04}.json")), &rows)?;
        info!("💾 Saved batch {} with {} properties", index, rows.len());
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).extend(rows);
        Ok(())
    }

    fn on_scrapped(self: &Arc<Self>, batch_size: Option<usize>) -> OnScrapped {
        let sink = Arc::clone(self);
        match batch_size {
            Some(size) => OnScrapped::batch(move |rows| sink.write_batch(rows), Some(size)),
            None => OnScrapped::row(move |row| sink.write_row(row)),
        }
    }

    fn rows(&self) -> Vec<ScrappedRow> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

async fn scrape_one(scrapper: &ListingScrapper, doc: &dyn DocumentQuery) -> Result<()> {
    match scrapper.handle_detail(doc).await? {
        ListingOutcome::Delivered { id } => info!("✅ Scraped listing {}", id),
        ListingOutcome::Skipped(reason) => info!("⏭️  Skipped {}: {}", doc.url(), reason),
    }
    Ok(())
}

fn print_rows(rows: &[ScrappedRow]) {
    for (i, row) in rows.iter().enumerate() {
        println!("{}. {} ({} €)", i + 1, row.title, row.price);
        println!(
            "   {:?}, {} bedrooms, {} m²",
            row.typology_id,
            row.bedrooms.map_or_else(|| "?".to_string(), |n| n.to_string()),
            row.gross_area
        );
        println!(
            "   {}, {}",
            row.address.as_deref().unwrap_or(&row.city_name),
            row.district_name.as_deref().unwrap_or("?")
        );
        println!("   ID: {}", row.id);
        println!("   URL: {}", row.backlink_url);
        println!();
    }
}

async fn run_command(command: Commands, mut config: ScrapperConfig, scrapper: &ListingScrapper) -> Result<()> {
    match command {
        Commands::Crawl {
            urls,
            headful,
            retries,
            debug_dir,
        } => {
            config = config.with_target_urls(urls);
            if headful {
                config = config.with_headless(false);
            }
            if debug_dir.is_some() {
                config = config.with_debug_dir(debug_dir);
            }
            if let Some(retries) = retries {
                config.max_request_retries = retries;
            }

            let crawler = BrowserCrawler::new(config)?;
            let stats = crawler.run(scrapper).await?;
            info!(
                "Visited {} search pages: {} delivered, {} skipped, {} failed",
                stats.list_pages, stats.delivered, stats.skipped, stats.failed
            );
        }
        Commands::Parse { file, url } => {
            let html = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            scrape_one(scrapper, &HtmlDocument::new(url, html)).await?;
        }
        Commands::Fetch { url } => {
            let client = http_client(config.navigation_timeout)?;
            let doc = fetch_document(&client, &url).await?;
            scrape_one(scrapper, &doc).await?;
        }
    }

    Ok(())
}

/// Delivers the partial batch and writes every delivered row to `summary`.
/// Runs whether or not the command succeeded.
fn finish(scrapper: &ListingScrapper, sink: &RowSink, summary: &Path) -> Result<usize> {
    let flushed = scrapper.flush();
    match &flushed {
        Ok(0) => {}
        Ok(count) => info!("Flushed {} buffered properties", count),
        Err(err) => error!("❌ Could not flush buffered properties: {:#}", err),
    }

    let rows = sink.rows();
    print_rows(&rows);

    write_json(summary, &rows)?;
    info!("💾 Saved {} properties to {}", rows.len(), summary.display());

    flushed.map(|_| rows.len())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,headless_chrome=warn".into()))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("🏠 Casa Scout");
    info!("=============");

    let mut config = match &cli.config {
        Some(path) => ScrapperConfig::load(path)?,
        None => ScrapperConfig::default(),
    };
    if let Some(ms) = cli.parser_timeout_ms {
        config = config.with_parser_timeout(Duration::from_millis(ms));
    }
    if let Some(size) = cli.batch_size {
        config = config.with_batch_size(size);
    }

    let sink = RowSink::new(cli.out_dir.clone())?;
    let scrapper = ListingScrapper::new(
        sink.on_scrapped(cli.batch_size.map(|_| config.batch_size)),
        config.parser_timeout,
    );

    let outcome = run_command(cli.command, config, &scrapper).await;
    if let Err(err) = &outcome {
        error!("❌ Scrape stopped early, saving what was collected: {:#}", err);
    }

    let finished = finish(&scrapper, &sink, Path::new(SUMMARY_FILE));
    outcome.and(finished.map(|_| ()))
}
