//! Listing scraper for casa.sapo.pt.
//!
//! A listing document goes through [`scrapers::RowAssembler`] into a
//! [`models::ScrappedRow`], which [`pipeline::ListingScrapper`] hands to the
//! consumer one by one or in batches.

pub mod config;
pub mod delivery;
pub mod error;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod scrapers;

pub use config::ScrapperConfig;
pub use delivery::{BatchingContainer, OnScrapped};
pub use error::{ListingError, QueryError};
pub use models::{LocationStructure, ScrappedRow};
pub use pipeline::{ListingOutcome, ListingScrapper};
