use index_core::RawField;

/// Indicator names of the financial table, matched exactly (the source file
/// carries a trailing space on every name).
pub const INDICATORS: &[(&str, RawField)] = &[
    ("GS Przychody ogółem ", RawField::Revenue),
    ("NP Wynik finansowy netto (zysk netto) ", RawField::NetProfit),
    ("LTL Zobowiązania długoterminowe ", RawField::LiabilitiesLong),
    ("STL Zobowiązania krótkoterminowe ", RawField::LiabilitiesShort),
    ("C Środki pieniężne i inne aktywa pieniężne ", RawField::Cash),
    ("IN Nakłady inwestycyjne ", RawField::Investment),
    ("EN Liczba jednostek gospodarczych ", RawField::EntityCount),
    ("PEN Liczba rentownych jednostek gospodarczych ", RawField::ProfitableEntityCount),
];

pub fn indicator_field(name: &str) -> Option<RawField> {
    INDICATORS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_only() {
        assert_eq!(indicator_field("GS Przychody ogółem "), Some(RawField::Revenue));
        assert_eq!(indicator_field("GS Przychody ogółem"), None);
        assert_eq!(indicator_field("gs przychody ogółem "), None);
    }

    #[test]
    fn test_no_research_or_bankruptcy_indicator() {
        assert!(INDICATORS
            .iter()
            .all(|(_, f)| !matches!(f, RawField::ArxivPapers | RawField::BankruptcyCount)));
    }
}
