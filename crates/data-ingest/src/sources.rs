use crate::bankruptcy::BankruptcyTable;
use crate::commentary::CommentaryCache;
use crate::financial::FinancialTable;
use crate::research::ResearchLookup;
use index_core::{IndexResult, IndustryRecord, RawAggregates, RawField};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FINANCIAL_FILE: &str = "wsk_fin.csv";
pub const BANKRUPTCY_FILE: &str = "krz_pkd.csv";
pub const RESEARCH_FILE: &str = "arxiv_daily_hype.json";
pub const COMMENTARY_FILE: &str = "ai_debates.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub financial: PathBuf,
    pub bankruptcy: PathBuf,
    pub research: PathBuf,
    pub commentary: PathBuf,
}

impl SourcePaths {
    /// Default file names inside one data directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            financial: dir.join(FINANCIAL_FILE),
            bankruptcy: dir.join(BANKRUPTCY_FILE),
            research: dir.join(RESEARCH_FILE),
            commentary: dir.join(COMMENTARY_FILE),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub financial: FinancialTable,
    pub bankruptcies: BankruptcyTable,
    pub research: ResearchLookup,
    pub commentary: CommentaryCache,
}

/// Load every source once. The financial and bankruptcy tables are required.
pub fn load_sources(paths: &SourcePaths) -> IndexResult<SourceTables> {
    let financial = FinancialTable::from_path(&paths.financial)?;
    let bankruptcies = BankruptcyTable::from_path(&paths.bankruptcy)?;
    let research = ResearchLookup::from_path(&paths.research)?;
    let commentary = CommentaryCache::load(&paths.commentary);
    Ok(SourceTables {
        financial,
        bankruptcies,
        research,
        commentary,
    })
}

/// Build the historical records, one per (code, year).
///
/// Missing aggregates default to 0. Dormant rows (no revenue and no debt)
/// are dropped. Output is ordered by code then year.
pub fn assemble(tables: &SourceTables) -> Vec<IndustryRecord> {
    let mut records = Vec::with_capacity(tables.financial.len());
    let mut dormant = 0usize;

    for ((code, year), entry) in &tables.financial.entries {
        let value = |field: RawField| entry.get(field).unwrap_or(0.0);
        let raw = RawAggregates {
            revenue: value(RawField::Revenue),
            net_profit: value(RawField::NetProfit),
            liabilities_long: value(RawField::LiabilitiesLong),
            liabilities_short: value(RawField::LiabilitiesShort),
            cash: value(RawField::Cash),
            investment: value(RawField::Investment),
            entity_count: value(RawField::EntityCount),
            profitable_entity_count: value(RawField::ProfitableEntityCount),
            bankruptcy_count: tables.bankruptcies.count_for(code, *year),
        };
        let mut record = IndustryRecord::historical(code.clone(), entry.name.clone(), *year, raw);
        if record.is_dormant() {
            dormant += 1;
            continue;
        }
        record.arxiv_papers = tables.research.lookup(code, *year);
        records.push(record);
    }

    if dormant > 0 {
        debug!(dormant, "dropped dormant rows");
    }
    info!(records = records.len(), "assembled historical records");
    records
}
