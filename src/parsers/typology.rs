use crate::models::TypologyId;
use regex::Regex;
use std::sync::LazyLock;

// ASCII word boundaries: "T2ª" and "Ref.ºT3" still carry a typology
static TYPOLOGY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)T([0-7])(?-u:\b)").expect("valid regex"));

/// Typology code found in a single fragment
pub fn typology_match(text: &str) -> Option<TypologyId> {
    let caps = TYPOLOGY_RE.captures(text)?;
    let digit: u8 = caps[1].parse().ok()?;
    TypologyId::try_from(digit).ok()
}

/// Scans fragments in priority order and returns the first typology found.
///
/// Later fragments are not inspected once one matches. `Other` when none do.
pub fn typology_id<S: AsRef<str>>(fragments: &[S]) -> TypologyId {
    fragments
        .iter()
        .find_map(|fragment| typology_match(fragment.as_ref()))
        .unwrap_or(TypologyId::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_fragment() {
        assert_eq!(typology_id(&["Apartamento T2 em Alvalade"]), TypologyId::T2);
        assert_eq!(typology_id(&["Moradia para venda"]), TypologyId::Other);
    }

    #[test]
    fn first_matching_fragment_wins() {
        assert_eq!(typology_id(&["no code here", "has T3 inside"]), TypologyId::T3);
        assert_eq!(typology_id(&["T1 no título", "T4 na descrição"]), TypologyId::T1);
    }

    #[test]
    fn requires_standalone_token() {
        assert_eq!(typology_id(&["T8 duplex"]), TypologyId::Other);
        assert_eq!(typology_id(&["ST2 code", "T22"]), TypologyId::Other);
        assert_eq!(typology_id(&["Apartamento T0, centro"]), TypologyId::T0);
    }

    #[test]
    fn boundaries_are_ascii_only() {
        assert_eq!(typology_id(&["Apartamento T2ª"]), TypologyId::T2);
        assert_eq!(typology_id(&["Ref.ºT3"]), TypologyId::T3);
        assert_eq!(typology_id(&["ÉT1"]), TypologyId::T1);
        assert_eq!(typology_id(&["AT1"]), TypologyId::Other);
    }

    #[test]
    fn empty_input_is_other() {
        let none: [&str; 0] = [];
        assert_eq!(typology_id(&none), TypologyId::Other);
    }

    #[test]
    fn deterministic() {
        let fragments = ["Loja", "Apartamento T5 com vista"];
        assert_eq!(typology_id(&fragments), typology_id(&fragments));
    }
}
