use index_core::{Availability, IndexError, IndexResult, IndustryCode};
use pkd_codes::{normalize_code, section_of};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

const ROLE: &str = "research intensity lookup";

/// Research-paper counts per section and year.
///
/// Shaped like `{ "SEK_A": { "2019": 12, "2020": 15 }, ... }`. Every code is
/// looked up through its section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResearchLookup {
    counts: BTreeMap<(IndustryCode, i32), f64>,
}

impl ResearchLookup {
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn from_json_str(text: &str) -> IndexResult<Self> {
        let raw: BTreeMap<String, BTreeMap<String, f64>> =
            serde_json::from_str(text).map_err(|source| IndexError::Json { role: ROLE, source })?;

        let mut counts = BTreeMap::new();
        for (key, years) in raw {
            let Some(section) = section_of(&normalize_code(&key)) else {
                warn!(key = %key, "research lookup key is not a section, ignoring");
                continue;
            };
            for (year, count) in years {
                match year.trim().parse::<i32>() {
                    Ok(year) => {
                        counts.insert((section.clone(), year), count);
                    }
                    Err(_) => warn!(key = %key, year = %year, "research lookup year does not parse, ignoring"),
                }
            }
        }
        Ok(Self { counts })
    }

    /// Load the lookup; an absent file leaves every row `DataUnavailable`.
    pub fn from_path(path: &Path) -> IndexResult<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "research lookup not found, research intensity unavailable");
            return Ok(Self::default());
        }
        let lookup = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), points = lookup.len(), "loaded research lookup");
        Ok(lookup)
    }

    pub fn lookup(&self, code: &IndustryCode, year: i32) -> Availability {
        let count = section_of(code).and_then(|section| self.counts.get(&(section, year)).copied());
        Availability::from_option(count)
    }
}
