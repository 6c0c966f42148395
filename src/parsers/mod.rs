//! Text heuristics that turn free text into typed listing fields.
//!
//! Everything here is pure and synchronous; the document reads that feed
//! these functions live in [`crate::scrapers`].

pub mod location;
pub mod price;
pub mod property_type;
pub mod text;
pub mod typology;

pub use location::parse_location;
pub use price::parse_price;
pub use property_type::{classify, PropertyClass};
pub use typology::typology_id;
