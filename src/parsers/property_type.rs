//! Keyword-priority property type classification.
//!
//! The page URL, ad title and subtitle are merged into one lower-cased text
//! and tested against [`KEYWORDS`]. The first keyword *in list order* that
//! occurs anywhere in the text picks the family; other keywords that also
//! occurred may refine the sub-type.

use crate::models::{PropertySubTypeId, PropertyTypeId};
use tracing::warn;

/// Lookup keywords. Order is priority.
pub const KEYWORDS: &[&str] = &[
    "apartamento",
    "duplex",
    "penthouse",
    "moradia",
    "loja",
    "comercial",
    "terreno",
    "quinta",
    "quintinha",
    "herdade",
    "escritório",
    "escritorio",
    "estudio",
    "estúdio",
    "gabinete",
    "armazém",
    "armazem",
    "garagem",
    "parqueamento",
    "residencial",
    // only refine "moradia"
    "geminada",
    "isolada",
    // only refine "terreno"
    "rustico",
    "rústico",
    "misto",
    "lote",
    "urbano",
    "loft",
    "sotao",
    "sótão",
    "hotel",
    "andar",
    "flat",
    "terreo",
];

/// Property type and optional sub-type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyClass {
    pub type_id: PropertyTypeId,
    pub sub_type_id: Option<PropertySubTypeId>,
}

impl PropertyClass {
    pub const OTHER: Self = Self::plain(PropertyTypeId::Other);

    pub const fn plain(type_id: PropertyTypeId) -> Self {
        Self { type_id, sub_type_id: None }
    }

    pub const fn with_sub_type(type_id: PropertyTypeId, sub_type_id: PropertySubTypeId) -> Self {
        Self { type_id, sub_type_id: Some(sub_type_id) }
    }
}

/// Keywords present in the merged text, in [`KEYWORDS`] order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatches(Vec<&'static str>);

impl KeywordMatches {
    pub fn scan(text: &str) -> Self {
        Self(KEYWORDS.iter().copied().filter(|keyword| text.contains(keyword)).collect())
    }

    pub fn primary(&self) -> Option<&'static str> {
        self.0.first().copied()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.0.iter().any(|matched| *matched == keyword)
    }

    pub fn as_slice(&self) -> &[&'static str] {
        &self.0
    }
}

type Resolver = fn(&KeywordMatches) -> PropertyClass;

/// Primary keyword → resolver. A primary keyword with no entry resolves to
/// [`PropertyClass::OTHER`].
const RULES: &[(&[&str], Resolver)] = &[
    (&["terreo"], |_| PropertyClass::plain(PropertyTypeId::Plot)),
    (&["flat", "andar", "estudio", "estúdio"], |_| {
        PropertyClass::plain(PropertyTypeId::Apartment)
    }),
    (&["hotel"], |_| {
        PropertyClass::with_sub_type(PropertyTypeId::Building, PropertySubTypeId::Hotel)
    }),
    (&["loft", "sótão", "sotao"], |_| {
        PropertyClass::with_sub_type(PropertyTypeId::Apartment, PropertySubTypeId::Loft)
    }),
    (&["duplex"], |_| {
        PropertyClass::with_sub_type(PropertyTypeId::Apartment, PropertySubTypeId::Duplex)
    }),
    (&["penthouse"], |_| {
        PropertyClass::with_sub_type(PropertyTypeId::Apartment, PropertySubTypeId::Penthouse)
    }),
    (&["apartamento"], resolve_apartment),
    (&["moradia"], resolve_house),
    (&["loja"], |_| PropertyClass::plain(PropertyTypeId::Shop)),
    (&["comercial"], |_| {
        PropertyClass::with_sub_type(PropertyTypeId::Building, PropertySubTypeId::Commercial)
    }),
    (&["lote"], |_| PropertyClass::plain(PropertyTypeId::Plot)),
    (&["terreno"], resolve_plot),
    (&["quinta", "quintinha", "herdade"], |_| {
        PropertyClass::with_sub_type(PropertyTypeId::House, PropertySubTypeId::Estate)
    }),
    (&["escritorio", "escritório", "gabinete"], |_| {
        PropertyClass::plain(PropertyTypeId::Office)
    }),
    (&["armazem", "armazém"], |_| PropertyClass::plain(PropertyTypeId::Warehouse)),
    (&["residencial"], |_| {
        PropertyClass::with_sub_type(PropertyTypeId::Building, PropertySubTypeId::Residential)
    }),
];

fn resolve_apartment(matches: &KeywordMatches) -> PropertyClass {
    if matches.contains("duplex") {
        PropertyClass::with_sub_type(PropertyTypeId::Apartment, PropertySubTypeId::Duplex)
    } else if matches.contains("penthouse") {
        PropertyClass::with_sub_type(PropertyTypeId::Apartment, PropertySubTypeId::Penthouse)
    } else {
        PropertyClass::plain(PropertyTypeId::Apartment)
    }
}

fn resolve_house(matches: &KeywordMatches) -> PropertyClass {
    let sub_type = if matches.contains("geminada") {
        PropertySubTypeId::SemiDetached
    } else if matches.contains("isolada") {
        PropertySubTypeId::Detached
    } else if matches.contains("duplex") {
        PropertySubTypeId::Duplex
    } else {
        return PropertyClass::plain(PropertyTypeId::House);
    };

    PropertyClass::with_sub_type(PropertyTypeId::House, sub_type)
}

fn resolve_plot(matches: &KeywordMatches) -> PropertyClass {
    let sub_type = if matches.contains("urbano") {
        PropertySubTypeId::Urban
    } else if matches.contains("rustico") || matches.contains("rústico") {
        PropertySubTypeId::Rustic
    } else if matches.contains("misto") {
        PropertySubTypeId::MixedUse
    } else {
        return PropertyClass::plain(PropertyTypeId::Plot);
    };

    PropertyClass::with_sub_type(PropertyTypeId::Plot, sub_type)
}

/// Resolves an already scanned match set
pub fn resolve(matches: &KeywordMatches) -> PropertyClass {
    let Some(primary) = matches.primary() else {
        return PropertyClass::OTHER;
    };

    RULES
        .iter()
        .find(|(keywords, _)| keywords.contains(&primary))
        .map_or(PropertyClass::OTHER, |(_, resolver)| resolver(matches))
}

/// Classifies a listing from its URL, title and subtitle
pub fn classify(page_url: &str, ad_title: &str, sub_title: &str) -> PropertyClass {
    let merged = format!(
        "{} {} {}",
        page_url.to_lowercase(),
        ad_title.to_lowercase(),
        sub_title.to_lowercase()
    );

    let matches = KeywordMatches::scan(&merged);
    if matches.primary().is_none() {
        warn!(ad_title, sub_title, "no property type keyword found");
    }

    resolve(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(url: &str, title: &str, sub_title: &str) -> (PropertyTypeId, Option<PropertySubTypeId>) {
        let class = classify(url, title, sub_title);
        (class.type_id, class.sub_type_id)
    }

    #[test]
    fn apartment_refined_by_co_matches() {
        assert_eq!(
            class("", "Apartamento Duplex T3", ""),
            (PropertyTypeId::Apartment, Some(PropertySubTypeId::Duplex))
        );
        assert_eq!(
            class("https://casa.sapo.pt/comprar-apartamento-t4", "Penthouse com terraço", ""),
            (PropertyTypeId::Apartment, Some(PropertySubTypeId::Penthouse))
        );
        assert_eq!(class("", "Apartamento T2", ""), (PropertyTypeId::Apartment, None));
    }

    #[test]
    fn house_refined_by_co_matches() {
        assert_eq!(
            class("", "Moradia geminada T4", ""),
            (PropertyTypeId::House, Some(PropertySubTypeId::SemiDetached))
        );
        assert_eq!(
            class("", "Moradia Isolada com piscina", ""),
            (PropertyTypeId::House, Some(PropertySubTypeId::Detached))
        );
        assert_eq!(class("", "Moradia T3", "Braga"), (PropertyTypeId::House, None));
    }

    #[test]
    fn plot_refined_by_co_matches() {
        assert_eq!(
            class("", "Terreno urbano", ""),
            (PropertyTypeId::Plot, Some(PropertySubTypeId::Urban))
        );
        assert_eq!(
            class("", "Terreno Rústico", "Alentejo"),
            (PropertyTypeId::Plot, Some(PropertySubTypeId::Rustic))
        );
        assert_eq!(
            class("", "Terreno misto", ""),
            (PropertyTypeId::Plot, Some(PropertySubTypeId::MixedUse))
        );
    }

    #[test]
    fn list_order_beats_text_order() {
        // "moradia" appears first in the text but "apartamento" comes first
        // in the keyword list
        assert_eq!(
            class("", "Moradia convertida em apartamento", ""),
            (PropertyTypeId::Apartment, None)
        );
        // "duplex" outranks "moradia" as a primary keyword
        assert_eq!(
            class("", "Moradia duplex", ""),
            (PropertyTypeId::Apartment, Some(PropertySubTypeId::Duplex))
        );
    }

    #[test]
    fn direct_mappings() {
        assert_eq!(class("", "Loja no centro", ""), (PropertyTypeId::Shop, None));
        assert_eq!(class("", "Escritório", ""), (PropertyTypeId::Office, None));
        assert_eq!(class("", "Gabinete", ""), (PropertyTypeId::Office, None));
        assert_eq!(class("", "Armazém industrial", ""), (PropertyTypeId::Warehouse, None));
        assert_eq!(
            class("", "Quintinha no Minho", ""),
            (PropertyTypeId::House, Some(PropertySubTypeId::Estate))
        );
        assert_eq!(
            class("", "Sótão renovado", ""),
            (PropertyTypeId::Apartment, Some(PropertySubTypeId::Loft))
        );
        assert_eq!(class("", "Estúdio", ""), (PropertyTypeId::Apartment, None));
        assert_eq!(
            class("", "Hotel", ""),
            (PropertyTypeId::Building, Some(PropertySubTypeId::Hotel))
        );
        assert_eq!(
            class("", "Prédio comercial", ""),
            (PropertyTypeId::Building, Some(PropertySubTypeId::Commercial))
        );
        assert_eq!(
            class("", "Prédio residencial", ""),
            (PropertyTypeId::Building, Some(PropertySubTypeId::Residential))
        );
    }

    #[test]
    fn refining_keywords_alone_are_other() {
        assert_eq!(class("", "Garagem fechada", ""), (PropertyTypeId::Other, None));
        assert_eq!(class("", "Urbano", ""), (PropertyTypeId::Other, None));
    }

    #[test]
    fn no_keyword_is_other() {
        assert_eq!(class("https://example.com/x", "Imóvel", "Lisboa"), (PropertyTypeId::Other, None));
        assert_eq!(classify("", "", ""), PropertyClass::OTHER);
    }

    #[test]
    fn match_set_keeps_list_order() {
        let matches = KeywordMatches::scan("terreno urbano com moradia");
        assert_eq!(matches.as_slice(), &["moradia", "terreno", "urbano"]);
        assert_eq!(matches.primary(), Some("moradia"));
    }

    #[test]
    fn deterministic() {
        let first = classify("u", "Terreno urbano", "s");
        assert_eq!(first, classify("u", "Terreno urbano", "s"));
    }
}
