use crate::models::LocationStructure;
use regex::Regex;
use std::sync::LazyLock;

static PARISH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)freguesia de ([^,]*)").expect("valid regex"));

static DISTRICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Distrito d[aeo]\s+(.+)").expect("valid regex"));

/// Parish name from a `"... freguesia de X, ..."` label
pub fn parish_name(label: &str) -> Option<String> {
    PARISH_RE
        .captures(label)
        .map(|caps| caps[1].trim().to_string())
}

/// District name from a `"..., Distrito de X"` subtitle
pub fn district_name(sub_title: &str) -> Option<String> {
    DISTRICT_RE
        .captures(sub_title)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Derives the location structure from the map-section label and subtitle.
///
/// The city is the second comma-separated token of the label. A label
/// without one yields `None`, which means the whole listing is unusable.
pub fn parse_location(label: &str, sub_title: &str) -> Option<LocationStructure> {
    let city_name = label.split(',').nth(1)?.trim().to_string();

    Some(LocationStructure {
        parish_name: parish_name(label),
        city_name,
        district_name: district_name(sub_title),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_structure() {
        let location = parse_location(
            "Localização: freguesia de Arroios, Lisboa, Portugal",
            "Arroios, Lisboa, Distrito de Lisboa",
        )
        .unwrap();

        assert_eq!(location.parish_name.as_deref(), Some("Arroios"));
        assert_eq!(location.city_name, "Lisboa");
        assert_eq!(location.district_name.as_deref(), Some("Lisboa"));
    }

    #[test]
    fn parish_and_district_are_optional() {
        let location = parse_location("Mapa, Porto", "Bonfim, Porto").unwrap();
        assert_eq!(location.parish_name, None);
        assert_eq!(location.city_name, "Porto");
        assert_eq!(location.district_name, None);
    }

    #[test]
    fn district_variants() {
        assert_eq!(district_name("Sé, Distrito do Porto").as_deref(), Some("Porto"));
        assert_eq!(district_name("Distrito da Guarda").as_deref(), Some("Guarda"));
        assert_eq!(district_name("distrito de Faro"), None);
    }

    #[test]
    fn parish_is_case_insensitive() {
        assert_eq!(parish_name("Freguesia de Campanhã, Porto").as_deref(), Some("Campanhã"));
    }

    #[test]
    fn label_without_city_is_unresolvable() {
        assert_eq!(parse_location("Localização indisponível", "Lisboa"), None);
        assert_eq!(parse_location("", ""), None);
    }
}
