/// Parses a listed price such as `"2.250.000 €"`.
///
/// Sale-or-rent listings show `"1.350.000 € / 5.500 €"`; only the first
/// (sale) price is kept. `.` is the thousands separator. Returns `None` when
/// the first segment carries no digits.
pub fn parse_price(raw: &str) -> Option<u64> {
    let first = raw.split('/').next()?;
    let digits: String = first.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return None;
    }

    digits.parse().ok()
}
