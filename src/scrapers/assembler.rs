use crate::error::ListingError;
use crate::models::{AgentContact, PurchaseType, ScrappedRow};
use crate::parsers::{classify, parse_location, parse_price, text::uuid_from_text, typology_id};
use crate::scrapers::features::FeatureExtractor;
use crate::scrapers::traits::{DocumentQuery, Locator};
use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};

const EXPIRED_MARKER: &str = ".detail-main-content.nodetail";
const TITLE: &str = "div.detail-section.detail-title > h1";
const SUB_TITLE: &str = "div.detail-section.detail-title > div.detail-title-location";
const PRICE: &str = "div.detail-title-info > div.detail-title-price > div > div.detail-title-price-value";
const DESCRIPTION: &str = "body > main > div.detail-main.center-content > div.detail-main-content > div.detail-section.detail-description > div.detail-description-text";
const AGENT_NAME: &str = "#detailLeadFormComponent > div.detail-form-property-owner > div > div.detail-form-property-owner-name";
const LOCATION_LABEL: &str = "div.detail-section.detail-map > div.detail-section-title";

/// Turns one listing document into a [`ScrappedRow`].
///
/// The steps run in a fixed order and the first failing check ends the
/// attempt: identifier, expiry, mandatory title and price, then the
/// best-effort fields, then the location structure.
#[derive(Debug, Clone)]
pub struct RowAssembler {
    timeout: Duration,
}

impl RowAssembler {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn text(&self, doc: &dyn DocumentQuery, selector: &str) -> Option<String> {
        doc.locate_text(&Locator::new(selector), self.timeout).await
    }

    pub async fn assemble(&self, doc: &dyn DocumentQuery) -> Result<ScrappedRow, ListingError> {
        let url = doc.url();

        let Some(id) = uuid_from_text(&url).map(str::to_string) else {
            warn!(url = %url, "Id not found");
            return Err(ListingError::MissingIdentifier { url });
        };

        if doc.count(EXPIRED_MARKER).await > 0 {
            warn!(property_id = %id, url = %url, "Property expired");
            return Err(ListingError::Expired { id });
        }

        info!(property_id = %id, url = %url, "Parsing property details");

        let title = self.text(doc, TITLE).await.unwrap_or_default();
        let sub_title = self.text(doc, SUB_TITLE).await.unwrap_or_default();
        let raw_price = self.text(doc, PRICE).await;
        let description = self.text(doc, DESCRIPTION).await.unwrap_or_default();
        let agent_name = self.text(doc, AGENT_NAME).await.filter(|name| !name.is_empty());

        if title.is_empty() {
            warn!(
                property_id = %id,
                sub_title = %sub_title,
                price = ?raw_price,
                agent = ?agent_name,
                url = %url,
                "Could not find the title, the request will be re-scheduled"
            );
            return Err(ListingError::MissingTitle { url });
        }

        let price = match raw_price.as_deref().and_then(parse_price) {
            Some(price) if price > 0 => price,
            price => {
                warn!(property_id = %id, raw_price = ?raw_price, url = %url, "Parsed price is not a positive number");
                return Err(ListingError::InvalidPrice { url, price });
            }
        };

        let features = FeatureExtractor::new(doc, self.timeout);

        let (images, (latitude, longitude), energetic_certification, main_features) = tokio::join!(
            features.image_urls(),
            features.coordinates(),
            features.energetic_certification(),
            features.main_features(),
        );

        let purchase_type_id = if url.contains("comprar") {
            PurchaseType::Sale
        } else {
            PurchaseType::Rent
        };

        // title first: shorter and more reliable than the description
        let typology_id = typology_id(&[title.as_str(), description.as_str()]);
        let property_class = classify(&url, &title, &sub_title);

        // tab-gated panels share the tab state, so they are read one at a time
        let divisions = features.divisions().await;
        let equipments = features.equipment().await;
        let infra = features.infrastructure().await;

        let label = self.text(doc, LOCATION_LABEL).await.unwrap_or_default();
        let Some(location) = parse_location(&label, &sub_title) else {
            warn!(property_id = %id, label = %label, "Location structure could not be properly parsed");
            return Err(ListingError::UnresolvedLocation { id });
        };

        if location.district_name.is_none() {
            warn!(property_id = %id, url = %url, "District not found");
        }

        Ok(ScrappedRow {
            id,
            agent_contact: agent_name.map(|name| AgentContact { name, phone: None }),
            title,
            video_url: None,
            address: Some(sub_title),
            zip_code: None,
            parish_name: location.parish_name,
            city_name: location.city_name,
            district_name: location.district_name,
            floor: None,
            latitude,
            longitude,
            property_type_id: property_class.type_id,
            property_sub_type_id: property_class.sub_type_id,
            condition_id: main_features.condition_id,
            purchase_type_id,
            typology_id,
            bedrooms: divisions.bedrooms,
            bathrooms: divisions.bathrooms,
            divisions: None,
            price,
            price_m2: None,
            backlink_url: url,
            gross_area: main_features.gross_area,
            usable_area: main_features.usable_area,
            images,
            equipments,
            infra,
            energetic_certification,
            construction_year: main_features.construction_year,
            scraped_at: Utc::now(),
        })
    }
}
