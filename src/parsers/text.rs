use regex::Regex;
use std::sync::LazyLock;

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-f\d]{8}(?:-[a-f\d]{4}){3}-[a-f\d]{12})").expect("valid regex")
});

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("valid regex"));

/// First UUID found in `text`, as written
pub fn uuid_from_text(text: &str) -> Option<&str> {
    UUID_RE.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// First standalone four-digit number
pub fn year_from_text(text: &str) -> Option<i32> {
    YEAR_RE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Parses an area such as `"120 m²"` or `"1.5 ha"`.
///
/// Everything except ASCII digits, `.` and `-` is dropped, then the longest
/// numeric prefix of what is left is taken.
pub fn normalize_m2(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    (1..=cleaned.len())
        .rev()
        .find_map(|end| cleaned[..end].parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Collapses runs of whitespace and trims
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
