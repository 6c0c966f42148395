pub mod ids;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use ids::{
    EquipmentId, FloorTypeId, InfrastructureId, LicenseTypeId, PropertyConditionId,
    PropertySubTypeId, PropertyTypeId, PurchaseType, TypologyId,
};

/// Listing agent as shown on the lead form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentContact {
    pub name: String,
    pub phone: Option<String>,
}

/// Parish, city and district names derived from the map section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationStructure {
    pub parish_name: Option<String>,
    pub city_name: String,
    pub district_name: Option<String>,
}

/// Finished listing record handed to the consumer
///
/// Built once per listing document by the row assembler and never mutated
/// afterwards. `price > 0` and a non-empty `title` hold for every row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrappedRow {
    /// Listing identifier on the source platform
    pub id: String,
    pub agent_contact: Option<AgentContact>,
    pub title: String,
    pub video_url: Option<String>,
    /// Ad subtitle
    pub address: Option<String>,
    pub zip_code: Option<String>,
    pub parish_name: Option<String>,
    pub city_name: String,
    pub district_name: Option<String>,
    pub floor: Option<FloorTypeId>,
    /// NaN when the map carries no coordinates; written as `null`
    #[serde(with = "nan_as_null")]
    pub latitude: f64,
    #[serde(with = "nan_as_null")]
    pub longitude: f64,
    pub property_type_id: PropertyTypeId,
    pub property_sub_type_id: Option<PropertySubTypeId>,
    pub condition_id: PropertyConditionId,
    pub purchase_type_id: PurchaseType,
    pub typology_id: TypologyId,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub divisions: Option<u32>,
    pub price: u64,
    pub price_m2: Option<f64>,
    pub backlink_url: String,
    pub gross_area: f64,
    /// Equals `gross_area` when the listing does not state it
    pub usable_area: f64,
    pub images: Vec<String>,
    pub equipments: Vec<EquipmentId>,
    pub infra: Vec<InfrastructureId>,
    pub energetic_certification: Option<String>,
    pub construction_year: Option<i32>,
    pub scraped_at: DateTime<Utc>,
}

/// NaN coordinates as JSON `null`, and `null` back to NaN
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        let value = if value.is_nan() { None } else { Some(*value) };
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
