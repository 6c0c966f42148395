pub mod assembler;
pub mod browser;
pub mod features;
pub mod frontier;
pub mod html;
pub mod traits;

pub use assembler::RowAssembler;
pub use browser::{BrowserCrawler, BrowserPage};
pub use features::FeatureExtractor;
pub use frontier::{CrawlFrontier, CrawlRequest, RequestLabel};
pub use html::HtmlDocument;
pub use traits::{DocumentQuery, Locator};
