/// Marker the statistics office uses for "no data".
pub const NO_DATA: &str = "bd";

/// Parse a numeric cell such as `1 679 774,30`.
///
/// Spaces (including non-breaking ones) are thousand separators and a comma
/// is the decimal point. Empty cells, `bd` and anything unparsable are
/// missing.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_DATA) {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{a0}' && *c != '\u{202f}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
