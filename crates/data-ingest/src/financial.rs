use crate::clean::parse_amount;
use crate::indicators::indicator_field;
use index_core::{IndexError, IndexResult, IndustryCode, RawField};
use pkd_codes::normalize_code;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

const ROLE: &str = "financial indicators";
const CODE_COLUMN: &str = "PKD";
const NAME_COLUMN: &str = "NAZWA_PKD";
const INDICATOR_COLUMN: &str = "WSKAZNIK";

/// Indicator values of one (code, year) after melting and pivoting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialEntry {
    pub name: String,
    pub values: BTreeMap<RawField, f64>,
}

impl FinancialEntry {
    pub fn get(&self, field: RawField) -> Option<f64> {
        self.values.get(&field).copied()
    }
}

/// Long-form financial table keyed by (code, year).
#[derive(Debug, Clone, Default)]
pub struct FinancialTable {
    pub entries: BTreeMap<(IndustryCode, i32), FinancialEntry>,
    /// Unrecognized indicator names and how many rows carried them.
    pub dropped_indicators: BTreeMap<String, usize>,
    pub skipped_lines: usize,
}

impl FinancialTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_path(path: &Path) -> IndexResult<Self> {
        if !path.exists() {
            return Err(IndexError::MissingSourceFile {
                role: ROLE,
                path: path.to_path_buf(),
            });
        }
        let table = Self::from_reader(File::open(path)?)?;
        info!(
            path = %path.display(),
            entries = table.len(),
            skipped_lines = table.skipped_lines,
            "loaded financial table"
        );
        Ok(table)
    }

    /// Parse the wide `PKD;NAZWA_PKD;NUMER_NAZWA_PKD;WSKAZNIK;<year>...` layout.
    ///
    /// Year columns are the headers that parse as integers. The first value
    /// seen for a (code, year, indicator) wins.
    pub fn from_reader<R: Read>(reader: R) -> IndexResult<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv
            .headers()
            .map_err(|source| IndexError::Csv { role: ROLE, source })?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| IndexError::MissingColumn {
                    role: ROLE,
                    column: name.to_string(),
                })
        };
        let code_idx = column(CODE_COLUMN)?;
        let indicator_idx = column(INDICATOR_COLUMN)?;
        let name_idx = headers.iter().position(|h| h == NAME_COLUMN);
        let year_columns: Vec<(usize, i32)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| h.parse::<i32>().ok().map(|y| (i, y)))
            .collect();
        debug!(years = year_columns.len(), "financial table year columns");

        let mut table = FinancialTable::default();
        for (line, result) in csv.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(IndexError::Csv { role: ROLE, source: e }),
                Err(e) => {
                    warn!(line = line + 2, error = %e, "skipping malformed financial line");
                    table.skipped_lines += 1;
                    continue;
                }
            };

            let indicator = record.get(indicator_idx).unwrap_or("");
            let Some(field) = indicator_field(indicator) else {
                *table.dropped_indicators.entry(indicator.to_string()).or_default() += 1;
                continue;
            };
            let Some(raw_code) = record.get(code_idx) else {
                table.skipped_lines += 1;
                continue;
            };
            let code = normalize_code(raw_code);
            let name = name_idx.and_then(|i| record.get(i)).unwrap_or("").trim();

            for (idx, year) in &year_columns {
                let Some(value) = record.get(*idx).and_then(parse_amount) else {
                    continue;
                };
                let entry = table.entries.entry((code.clone(), *year)).or_insert_with(|| FinancialEntry {
                    name: name.to_string(),
                    values: BTreeMap::new(),
                });
                entry.values.entry(field).or_insert(value);
            }
        }

        if !table.dropped_indicators.is_empty() {
            debug!(
                distinct = table.dropped_indicators.len(),
                rows = table.dropped_indicators.values().sum::<usize>(),
                "dropped unrecognized indicators"
            );
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use index_core::CodeLevel;

    const SAMPLE: &str = "\
PKD;NAZWA_PKD;NUMER_NAZWA_PKD;WSKAZNIK;2023;2024
41;Roboty budowlane;41 Roboty budowlane;GS Przychody ogółem ;1 000,0;1 200,0
41;Roboty budowlane;41 Roboty budowlane;EN Liczba jednostek gospodarczych ;50;bd
41;Roboty budowlane;41 Roboty budowlane;XX Nieznany wskaźnik ;1;2
41;Roboty budowlane;41 Roboty budowlane;GS Przychody ogółem ;9;9
SEK_F;BUDOWNICTWO;F BUDOWNICTWO;GS Przychody ogółem ;5 000;6 000
";

    #[test]
    fn test_melt_and_pivot() {
        let table = FinancialTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let key = (IndustryCode::new("41", CodeLevel::Division), 2023);
        let entry = &table.entries[&key];
        assert_eq!(entry.name, "Roboty budowlane");
        assert_eq!(entry.get(RawField::Revenue), Some(1000.0));
        assert_eq!(entry.get(RawField::EntityCount), Some(50.0));

        let later = &table.entries[&(IndustryCode::new("41", CodeLevel::Division), 2024)];
        assert_eq!(later.get(RawField::Revenue), Some(1200.0));
        assert_eq!(later.get(RawField::EntityCount), None);

        let section = &table.entries[&(IndustryCode::section('F'), 2024)];
        assert_eq!(section.get(RawField::Revenue), Some(6000.0));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_unknown_indicator_dropped_and_counted() {
        let table = FinancialTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.dropped_indicators.get("XX Nieznany wskaźnik "), Some(&1));
    }

    #[test]
    fn test_missing_indicator_column() {
        let err = FinancialTable::from_reader("PKD;2024\n41;1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, IndexError::MissingColumn { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FinancialTable::from_path(&dir.path().join("wsk_fin.csv")).unwrap_err();
        assert!(matches!(err, IndexError::MissingSourceFile { role: ROLE, .. }));
    }
}
