use crate::clean::parse_amount;
use index_core::{CodeLevel, IndexError, IndexResult, IndustryCode};
use pkd_codes::{normalize_code, section_of};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const ROLE: &str = "bankruptcy counts";

/// Bankruptcy counts keyed by (year, code), in the table's own granularity.
#[derive(Debug, Clone, Default)]
pub struct BankruptcyTable {
    counts: BTreeMap<(i32, IndustryCode), f64>,
}

impl BankruptcyTable {
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn insert(&mut self, year: i32, code: IndustryCode, count: f64) {
        *self.counts.entry((year, code)).or_default() += count;
    }

    pub fn from_path(path: &Path) -> IndexResult<Self> {
        if !path.exists() {
            return Err(IndexError::MissingSourceFile {
                role: ROLE,
                path: path.to_path_buf(),
            });
        }
        let table = Self::from_reader(File::open(path)?)?;
        info!(path = %path.display(), rows = table.len(), "loaded bankruptcy table");
        Ok(table)
    }

    /// Parse `rok;pkd;liczba_upadlosci`. Rows whose year or count does not
    /// parse are dropped; repeated keys are summed.
    pub fn from_reader<R: Read>(reader: R) -> IndexResult<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut table = BankruptcyTable::default();
        let mut dropped = 0usize;
        for result in csv.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(IndexError::Csv { role: ROLE, source: e }),
                Err(_) => {
                    dropped += 1;
                    continue;
                }
            };
            let year = record.get(0).and_then(|y| y.trim().parse::<i32>().ok());
            let count = record.get(2).and_then(parse_amount);
            match (year, record.get(1), count) {
                (Some(year), Some(code), Some(count)) => table.insert(year, normalize_code(code), count),
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(dropped, "dropped unparsable bankruptcy rows");
        }
        Ok(table)
    }

    /// Count for a financial row.
    ///
    /// The exact key wins. Otherwise every recorded code below `code` that
    /// has no recorded code of its own below it is summed, so each branch
    /// contributes at the finest granularity it was reported in. Prefix match
    /// for numeric codes, range-table match for sections. No match yields 0.
    pub fn count_for(&self, code: &IndustryCode, year: i32) -> f64 {
        if let Some(count) = self.counts.get(&(year, code.clone())) {
            return *count;
        }

        let below: Vec<(&IndustryCode, f64)> = self
            .counts
            .range((year, IndustryCode::new("", CodeLevel::Section))..)
            .take_while(|((y, _), _)| *y == year)
            .filter(|((_, c), _)| is_below(c, code))
            .map(|((_, c), n)| (c, *n))
            .collect();

        below
            .iter()
            .filter(|(c, _)| !below.iter().any(|(other, _)| is_below(other, c)))
            .map(|(_, n)| n)
            .sum()
    }
}

fn is_below(candidate: &IndustryCode, code: &IndustryCode) -> bool {
    if candidate.level() <= code.level() || candidate.level() == CodeLevel::Unclassified {
        return false;
    }
    match code.level() {
        CodeLevel::Section => section_of(candidate).as_ref() == Some(code),
        CodeLevel::Division | CodeLevel::Group => candidate.key().starts_with(code.key()),
        CodeLevel::Class | CodeLevel::Unclassified => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
rok;pkd;liczba_upadlosci
2024;41.10;2
2024;41.20;3
2024;4120;1
2024;41.1;7
2024;45;4
2023;41;9
brak;41;1
2024;43;x
";

    fn table() -> BankruptcyTable {
        BankruptcyTable::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_exact_key_wins() {
        let t = table();
        assert_eq!(t.count_for(&IndustryCode::new("41", CodeLevel::Division), 2023), 9.0);
        assert_eq!(t.count_for(&IndustryCode::new("411", CodeLevel::Group), 2024), 7.0);
    }

    #[test]
    fn test_finest_granularity_summed() {
        let t = table();
        // Classes 4110 (2) and 4120 (3 + 1); the group row is coarser.
        assert_eq!(t.count_for(&IndustryCode::new("41", CodeLevel::Division), 2024), 6.0);
    }

    #[test]
    fn test_each_branch_uses_its_own_finest_level() {
        let mut t = BankruptcyTable::default();
        t.insert(2024, IndustryCode::new("4110", CodeLevel::Class), 2.0);
        t.insert(2024, IndustryCode::new("4119", CodeLevel::Class), 1.0);
        t.insert(2024, IndustryCode::new("411", CodeLevel::Group), 9.0);
        t.insert(2024, IndustryCode::new("412", CodeLevel::Group), 5.0);
        // 411 is covered by its classes, 412 only at group level.
        assert_eq!(t.count_for(&IndustryCode::new("41", CodeLevel::Division), 2024), 8.0);
        assert_eq!(t.count_for(&IndustryCode::section('F'), 2024), 8.0);
        assert_eq!(t.count_for(&IndustryCode::new("412", CodeLevel::Group), 2024), 5.0);
    }

    #[test]
    fn test_section_uses_range_table() {
        let t = table();
        assert_eq!(t.count_for(&IndustryCode::section('F'), 2024), 6.0);
        assert_eq!(t.count_for(&IndustryCode::section('G'), 2024), 4.0);
        assert_eq!(t.count_for(&IndustryCode::section('A'), 2024), 0.0);
    }

    #[test]
    fn test_unparsable_rows_dropped() {
        assert_eq!(table().len(), 5);
    }
}
