//! Section letter → division range table.
//!
//! Hand-maintained; the single source of truth for section membership, which
//! cannot be inferred from the codes themselves.

/// `(letter, first division, last division)`, inclusive.
pub const SECTION_RANGES: &[(char, u32, u32)] = &[
    ('A', 1, 3),
    ('B', 5, 9),
    ('C', 10, 33),
    ('D', 35, 35),
    ('E', 36, 39),
    ('F', 41, 43),
    ('G', 45, 47),
    ('H', 49, 53),
    ('I', 55, 56),
    ('J', 58, 63),
    ('K', 64, 66),
    ('L', 68, 68),
    ('M', 69, 75),
    ('N', 77, 82),
    ('O', 84, 84),
    ('P', 85, 85),
    ('Q', 86, 88),
    ('R', 90, 93),
    ('S', 94, 96),
];

/// Section letter enclosing a two-digit division.
pub fn section_for_division(division: u32) -> Option<char> {
    SECTION_RANGES
        .iter()
        .find(|(_, lo, hi)| (*lo..=*hi).contains(&division))
        .map(|(letter, _, _)| *letter)
}

/// Inclusive division range of a section letter.
pub fn division_range(letter: char) -> Option<(u32, u32)> {
    let letter = letter.to_ascii_uppercase();
    SECTION_RANGES
        .iter()
        .find(|(l, _, _)| *l == letter)
        .map(|(_, lo, hi)| (*lo, *hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_section() {
        assert_eq!(division_range('F'), Some((41, 43)));
        assert_eq!(division_range('f'), Some((41, 43)));
        for d in 41..=43 {
            assert_eq!(section_for_division(d), Some('F'));
        }
    }

    #[test]
    fn test_gaps_have_no_section() {
        assert_eq!(section_for_division(4), None);
        assert_eq!(section_for_division(40), None);
        assert_eq!(section_for_division(99), None);
        assert_eq!(division_range('Z'), None);
    }

    #[test]
    fn test_ranges_do_not_overlap() {
        for (i, (_, lo_a, hi_a)) in SECTION_RANGES.iter().enumerate() {
            assert!(lo_a <= hi_a);
            for (_, lo_b, hi_b) in &SECTION_RANGES[i + 1..] {
                assert!(hi_a < lo_b || hi_b < lo_a);
            }
        }
    }
}
