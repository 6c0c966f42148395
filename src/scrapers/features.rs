//! Best-effort reads of the feature panels of a listing page.
//!
//! Every read degrades to a default instead of failing: a missing panel,
//! a timeout or an unparseable value simply leaves the field empty.

use crate::models::{EquipmentId, InfrastructureId, PropertyConditionId};
use crate::parsers::text::{normalize_m2, year_from_text};
use crate::scrapers::traits::{DocumentQuery, Locator};
use futures::future::join_all;
use std::time::Duration;
use tracing::debug;

const MAIN_FEATURES_LIST: &str = "div.detail-section.detail-main-features > div.detail-main-features-list";
const MAIN_FEATURE_ITEM: &str =
    "div.detail-section.detail-main-features > div.detail-main-features-list .detail-main-features-item";
const FEATURE_ITEM: &str =
    "div.detail-section.detail-features > div.detail-features-content > div.detail-features-items > div";
const ACTIVE_TAB: &str = "div.detail-features-menu-content > span.active";
const TAB_CONTROL: &str =
    "div.detail-section.detail-features > div.detail-features-content > div.detail-features-menu > div > span";
const GALLERY_IMAGE: &str =
    ".swiper-wrapper .swiper-slide:not(.swiper-slide-duplicate)[data-swiper-slide-index] picture img";
const MAP: &str = "#objMap";
const ENERGETIC_VALUE: &str = ".energetic-value";

const EQUIPMENT_LABELS: [(&str, EquipmentId); 4] = [
    ("Elevador", EquipmentId::Lift),
    ("Ar Condicionado", EquipmentId::AirConditioner),
    ("Aquecimento Central", EquipmentId::CentralHeating),
    ("Painéis Solares", EquipmentId::SolarPanel),
];

// Garden is checked with the storage-room label, so both flags always agree.
// Looks like a slip at the source; kept until the real garden label is known.
const INFRASTRUCTURE_LABELS: [(&str, InfrastructureId); 4] = [
    ("Garagem", InfrastructureId::Garage),
    ("Piscina", InfrastructureId::Pool),
    ("Arrecadação", InfrastructureId::Garden),
    ("Arrecadação", InfrastructureId::StorageRoom),
];

/// "Main features" block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainFeatures {
    pub condition_id: PropertyConditionId,
    pub gross_area: f64,
    pub usable_area: f64,
    pub construction_year: Option<i32>,
}

impl MainFeatures {
    /// Used when the block is not on the page at all
    pub const FALLBACK: Self = Self {
        condition_id: PropertyConditionId::Used,
        gross_area: 0.0,
        usable_area: 0.0,
        construction_year: None,
    };

    /// Builds the block from its raw texts.
    ///
    /// Missing gross area is 0; missing usable area is the gross area.
    pub fn from_texts(
        condition: Option<&str>,
        gross_area: Option<&str>,
        usable_area: Option<&str>,
        construction_year: Option<&str>,
    ) -> Self {
        let gross_area = gross_area.and_then(normalize_m2).unwrap_or(0.0);
        let usable_area = usable_area.and_then(normalize_m2).unwrap_or(gross_area);

        Self {
            condition_id: condition_id(condition),
            gross_area,
            usable_area,
            construction_year: construction_year.and_then(year_from_text),
        }
    }
}

/// Condition from the "Estado" text. Defaults to `Used`.
pub fn condition_id(condition: Option<&str>) -> PropertyConditionId {
    match condition {
        Some(text) if text.contains("Novo") => PropertyConditionId::New,
        Some(text) if text.contains("Em construção") => PropertyConditionId::UnderConstruction,
        _ => PropertyConditionId::Used,
    }
}

/// Room counts from the divisions tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Divisions {
    pub bathrooms: Option<u32>,
    pub bedrooms: Option<u32>,
}

/// Tabs of the characteristics panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureTab {
    Divisions,
    Equipment,
    Infrastructure,
}

impl FeatureTab {
    pub fn label(self) -> &'static str {
        match self {
            Self::Divisions => "Divisões",
            Self::Equipment => "Equipamentos",
            Self::Infrastructure => "Infraestruturas",
        }
    }
}

pub struct FeatureExtractor<'a> {
    doc: &'a dyn DocumentQuery,
    timeout: Duration,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(doc: &'a dyn DocumentQuery, timeout: Duration) -> Self {
        Self { doc, timeout }
    }

    async fn text(&self, locator: Locator) -> Option<String> {
        let value = self.doc.locate_text(&locator, self.timeout).await;
        if value.is_none() {
            debug!(selector = %locator.selector, has_text = ?locator.has_text, "feature not found");
        }
        value
    }

    async fn main_feature(&self, label: &str) -> Option<String> {
        self.text(Locator::new(MAIN_FEATURE_ITEM).has_text(label).inner("div:nth-child(2)"))
            .await
    }

    /// Condition, areas and construction year, read concurrently
    pub async fn main_features(&self) -> MainFeatures {
        if self.doc.count(MAIN_FEATURES_LIST).await == 0 {
            debug!(url = %self.doc.url(), "main features block missing, using fallback");
            return MainFeatures::FALLBACK;
        }

        let (condition, gross_area, usable_area, construction_year) = tokio::join!(
            self.main_feature("Estado"),
            self.main_feature("Área Bruta"),
            self.main_feature("Área Útil"),
            self.main_feature("Ano de construção"),
        );

        MainFeatures::from_texts(
            condition.as_deref(),
            gross_area.as_deref(),
            usable_area.as_deref(),
            construction_year.as_deref(),
        )
    }

    /// Makes `tab` the active one. Never fails: the read that follows runs
    /// against whatever is rendered.
    pub async fn ensure_tab(&self, tab: FeatureTab) {
        if let Err(err) = self.doc.wait_for(ACTIVE_TAB, self.timeout).await {
            debug!(error = %err, "feature tabs not found");
            return;
        }

        let active = self.doc.locate_text(&Locator::new(ACTIVE_TAB), self.timeout).await;
        if active.as_deref() == Some(tab.label()) {
            return;
        }

        let control = Locator::new(TAB_CONTROL).has_text(tab.label());
        if let Err(err) = self.doc.click(&control, self.timeout).await {
            debug!(tab = tab.label(), error = %err, "could not activate tab");
        }
    }

    async fn numeric_item(&self, label: &str) -> Option<u32> {
        // values such as "Não" count as absent
        self.text(Locator::new(FEATURE_ITEM).has_text(label).inner("strong"))
            .await
            .and_then(|value| value.trim().parse().ok())
    }

    async fn has_item(&self, label: &str) -> bool {
        self.text(Locator::new(FEATURE_ITEM).has_text(label))
            .await
            .is_some_and(|value| !value.is_empty())
    }

    pub async fn divisions(&self) -> Divisions {
        self.ensure_tab(FeatureTab::Divisions).await;

        let (bathrooms, bedrooms) = tokio::join!(
            self.numeric_item("Casa(s) de Banho"),
            self.numeric_item("Total quarto(s)"),
        );

        Divisions { bathrooms, bedrooms }
    }

    async fn present<T: Copy>(&self, labels: &[(&str, T)]) -> Vec<T> {
        let checks = labels.iter().map(|(label, _)| self.has_item(label));
        let found = join_all(checks).await;

        labels
            .iter()
            .zip(found)
            .filter_map(|((_, id), present)| present.then_some(*id))
            .collect()
    }

    pub async fn equipment(&self) -> Vec<EquipmentId> {
        self.ensure_tab(FeatureTab::Equipment).await;
        self.present(&EQUIPMENT_LABELS).await
    }

    pub async fn infrastructure(&self) -> Vec<InfrastructureId> {
        self.ensure_tab(FeatureTab::Infrastructure).await;
        self.present(&INFRASTRUCTURE_LABELS).await
    }

    /// Gallery image URLs in slide order, lazy-loaded placeholders resolved
    pub async fn image_urls(&self) -> Vec<String> {
        if let Err(err) = self.doc.wait_for(GALLERY_IMAGE, self.timeout).await {
            debug!(error = %err, "no gallery images");
            return Vec::new();
        }

        let (sources, lazy_sources) = tokio::join!(
            self.doc.attribute_values(GALLERY_IMAGE, "src"),
            self.doc.attribute_values(GALLERY_IMAGE, "data-src"),
        );

        sources
            .into_iter()
            .zip(lazy_sources.into_iter().chain(std::iter::repeat(None)))
            .filter_map(|(src, lazy)| match src {
                Some(src) if src.contains("data:image") => lazy,
                src => src,
            })
            .filter(|url| !url.is_empty())
            .collect()
    }

    /// Latitude and longitude, NaN when unavailable
    pub async fn coordinates(&self) -> (f64, f64) {
        let (latitude, longitude) = tokio::join!(
            self.doc.locate_attribute(MAP, "data-latitude", self.timeout),
            self.doc.locate_attribute(MAP, "data-longitude", self.timeout),
        );

        (parse_coordinate(latitude), parse_coordinate(longitude))
    }

    pub async fn energetic_certification(&self) -> Option<String> {
        self.text(Locator::new(ENERGETIC_VALUE))
            .await
            .filter(|value| !value.is_empty())
    }
}

fn parse_coordinate(value: Option<String>) -> f64 {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::fixtures::{listing_document, RecordingDocument, LISTING_HTML, LISTING_URL};
    use crate::scrapers::html::HtmlDocument;

    const WAIT: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn reads_main_features() {
        let doc = listing_document();
        let features = FeatureExtractor::new(&doc, WAIT).main_features().await;

        assert_eq!(
            features,
            MainFeatures {
                condition_id: PropertyConditionId::New,
                gross_area: 150.0,
                usable_area: 150.0,
                construction_year: Some(2019),
            }
        );
    }

    #[tokio::test]
    async fn missing_main_features_block_falls_back() {
        let doc = HtmlDocument::new(LISTING_URL, "<html><body><h1>Loja</h1></body></html>");
        let features = FeatureExtractor::new(&doc, WAIT).main_features().await;

        assert_eq!(features, MainFeatures::FALLBACK);
        assert_eq!(features.condition_id, PropertyConditionId::Used);
        assert_eq!(features.gross_area, 0.0);
        assert_eq!(features.usable_area, 0.0);
        assert_eq!(features.construction_year, None);
    }

    #[test]
    fn usable_area_defaults_to_gross_area() {
        let features = MainFeatures::from_texts(None, Some("98 m²"), None, None);
        assert_eq!(features.usable_area, 98.0);

        let features = MainFeatures::from_texts(None, Some("98 m²"), Some("80 m²"), Some("n/d"));
        assert_eq!(features.usable_area, 80.0);
        assert_eq!(features.construction_year, None);

        let features = MainFeatures::from_texts(None, None, None, None);
        assert_eq!((features.gross_area, features.usable_area), (0.0, 0.0));
    }

    #[test]
    fn condition_from_text() {
        assert_eq!(condition_id(Some("Novo")), PropertyConditionId::New);
        assert_eq!(condition_id(Some("Em construção")), PropertyConditionId::UnderConstruction);
        assert_eq!(condition_id(Some("Usado")), PropertyConditionId::Used);
        assert_eq!(condition_id(Some("Para recuperar")), PropertyConditionId::Used);
        assert_eq!(condition_id(None), PropertyConditionId::Used);
    }

    #[tokio::test]
    async fn reads_divisions_without_switching_active_tab() {
        let doc = RecordingDocument::new(listing_document());
        let divisions = FeatureExtractor::new(&doc, WAIT).divisions().await;

        assert_eq!(divisions, Divisions { bathrooms: Some(2), bedrooms: Some(3) });
        assert!(doc.clicks().is_empty());
    }

    #[tokio::test]
    async fn non_numeric_division_is_absent() {
        let extractor_doc = listing_document();
        let extractor = FeatureExtractor::new(&extractor_doc, WAIT);
        assert_eq!(extractor.numeric_item("Cozinha equipada").await, None);
    }

    #[tokio::test]
    async fn activates_equipment_tab_before_reading() {
        let doc = RecordingDocument::new(listing_document());
        let equipment = FeatureExtractor::new(&doc, WAIT).equipment().await;

        assert_eq!(equipment, vec![EquipmentId::Lift, EquipmentId::AirConditioner]);
        assert_eq!(doc.clicks(), vec!["Equipamentos".to_string()]);
    }

    #[tokio::test]
    async fn failed_tab_click_is_tolerated() {
        let doc = RecordingDocument::new(listing_document()).failing_clicks();
        let infra = FeatureExtractor::new(&doc, WAIT).infrastructure().await;

        assert_eq!(
            infra,
            vec![InfrastructureId::Garage, InfrastructureId::Garden, InfrastructureId::StorageRoom]
        );
        assert_eq!(doc.clicks(), vec!["Infraestruturas".to_string()]);
    }

    #[tokio::test]
    async fn garden_tracks_storage_room_label() {
        let html = LISTING_HTML.replace("<div><span>Arrecadação</span></div>", "<div><span>Jardim</span></div>");
        let doc = HtmlDocument::new(LISTING_URL, html);
        let infra = FeatureExtractor::new(&doc, WAIT).infrastructure().await;

        assert_eq!(infra, vec![InfrastructureId::Garage]);
    }

    #[tokio::test]
    async fn resolves_gallery_images() {
        let doc = listing_document();
        let images = FeatureExtractor::new(&doc, WAIT).image_urls().await;

        assert_eq!(
            images,
            vec![
                "https://img.test/listing/1.jpg".to_string(),
                "https://img.test/listing/2.jpg".to_string(),
                "https://img.test/listing/3.jpg".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_map_and_certificate_degrade() {
        let doc = HtmlDocument::new(LISTING_URL, "<html><body><div id=\"objMap\" data-latitude=\"x\"></div></body></html>");
        let extractor = FeatureExtractor::new(&doc, WAIT);

        let (latitude, longitude) = extractor.coordinates().await;
        assert!(latitude.is_nan() && longitude.is_nan());
        assert_eq!(extractor.energetic_certification().await, None);
        assert!(extractor.image_urls().await.is_empty());
        assert_eq!(extractor.divisions().await, Divisions::default());
        assert!(extractor.equipment().await.is_empty());
    }

    #[tokio::test]
    async fn reads_map_and_certificate() {
        let doc = listing_document();
        let extractor = FeatureExtractor::new(&doc, WAIT);

        assert_eq!(extractor.coordinates().await, (38.7036, -9.4187));
        assert_eq!(extractor.energetic_certification().await.as_deref(), Some("A+"));
    }
}
