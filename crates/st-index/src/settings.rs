use anyhow::{Context, Result};
use data_ingest::sources::{BANKRUPTCY_FILE, COMMENTARY_FILE, FINANCIAL_FILE, RESEARCH_FILE};
use data_ingest::SourcePaths;
use std::env;
use std::path::PathBuf;

/// Process-level settings read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub data_dir: PathBuf,
    pub financial_file: String,
    pub bankruptcy_file: String,
    pub research_file: String,
    pub commentary_file: String,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    /// Overrides the horizon of the loaded config when set.
    pub horizon: Option<u32>,
    pub delimiter: u8,
}

impl PipelineSettings {
    pub fn from_env() -> Result<Self> {
        let delimiter = env::var("ST_INDEX_DELIMITER").unwrap_or_else(|_| ";".to_string());
        let settings = Self {
            data_dir: env::var("ST_INDEX_DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            financial_file: env::var("ST_INDEX_FINANCIAL_FILE").unwrap_or_else(|_| FINANCIAL_FILE.to_string()),
            bankruptcy_file: env::var("ST_INDEX_BANKRUPTCY_FILE").unwrap_or_else(|_| BANKRUPTCY_FILE.to_string()),
            research_file: env::var("ST_INDEX_RESEARCH_FILE").unwrap_or_else(|_| RESEARCH_FILE.to_string()),
            commentary_file: env::var("ST_INDEX_COMMENTARY_FILE").unwrap_or_else(|_| COMMENTARY_FILE.to_string()),
            output: env::var("ST_INDEX_OUTPUT")
                .unwrap_or_else(|_| "data/processed_index.csv".to_string())
                .into(),
            config: env::var("ST_INDEX_CONFIG").ok().map(PathBuf::from),
            horizon: env::var("ST_INDEX_HORIZON")
                .ok()
                .map(|h| h.parse())
                .transpose()
                .context("ST_INDEX_HORIZON must be a non-negative integer")?,
            delimiter: parse_delimiter(&delimiter)?,
        };
        Ok(settings)
    }

    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths {
            financial: self.data_dir.join(&self.financial_file),
            bankruptcy: self.data_dir.join(&self.bankruptcy_file),
            research: self.data_dir.join(&self.research_file),
            commentary: self.data_dir.join(&self.commentary_file),
        }
    }
}

pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw.as_bytes() {
        [b] => Ok(*b),
        _ if raw == "\\t" => Ok(b'\t'),
        _ => anyhow::bail!("delimiter must be a single byte, got {raw:?}"),
    }
}
