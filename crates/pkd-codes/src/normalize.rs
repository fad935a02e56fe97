use crate::sections::division_range;
use index_core::{CodeLevel, IndustryCode, SECTION_PREFIX};
use tracing::debug;

/// Key used for codes that are empty after cleaning.
pub const UNCLASSIFIED_KEY: &str = "OTHER";

/// Canonicalize a raw code from any source table.
///
/// * `SEK_F`, `SEK F`, `sek_f` and a bare `F` become the section key `SEK_F`.
/// * Dots, whitespace and trailing category letters are stripped from numeric
///   codes: `41.20.Z` → `4120`, `01.1` → `011`, `41.` → `41`.
/// * Granularity follows the digit count (2, 3 or 4).
///
/// Anything else lands in [`CodeLevel::Unclassified`]; this never fails.
pub fn normalize_code(raw: &str) -> IndustryCode {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect::<String>()
        .to_ascii_uppercase();

    if let Some(code) = parse_section(&cleaned) {
        return code;
    }

    let digits: String = cleaned.chars().filter(|c| *c != '.').collect();
    let digits = digits.trim_end_matches(|c: char| c.is_ascii_alphabetic());

    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        let level = match digits.len() {
            2 => Some(CodeLevel::Division),
            3 => Some(CodeLevel::Group),
            4 => Some(CodeLevel::Class),
            _ => None,
        };
        if let Some(level) = level {
            return IndustryCode::new(digits, level);
        }
    }

    debug!(raw, "code matches no granularity, bucketing as unclassified");
    let key = if cleaned.is_empty() {
        UNCLASSIFIED_KEY.to_string()
    } else {
        cleaned
    };
    IndustryCode::new(key, CodeLevel::Unclassified)
}

fn parse_section(cleaned: &str) -> Option<IndustryCode> {
    let rest = match cleaned.strip_prefix(SECTION_PREFIX.trim_end_matches('_')) {
        Some(rest) => rest.trim_start_matches('_'),
        None if cleaned.len() == 1 => cleaned,
        None => return None,
    };

    let mut chars = rest.chars();
    let letter = chars.next()?;
    if chars.next().is_some() || !letter.is_ascii_alphabetic() {
        return None;
    }
    division_range(letter)?;
    Some(IndustryCode::section(letter))
}
