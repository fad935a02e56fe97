use clap::{Parser, Subcommand, ValueEnum};
use index_core::{CodeLevel, NormalizationStrategy};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Min-max within each (year, level) cohort
    Relative,
    /// Fixed calibrated bounds, comparable across cohorts and years
    Absolute,
}

impl From<StrategyArg> for NormalizationStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Relative => NormalizationStrategy::Relative,
            StrategyArg::Absolute => NormalizationStrategy::Absolute,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "st-index")]
#[command(about = "Industry Stability & Transformation index", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding the source tables (overrides ST_INDEX_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// JSON scoring/forecast configuration (overrides ST_INDEX_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, score (and optionally forecast) everything, then export
    Build {
        /// Output file (overrides ST_INDEX_OUTPUT)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Normalization; defaults to absolute when forecasting, relative otherwise
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Forecast horizon in years; 0 disables forecasting
        #[arg(long)]
        horizon: Option<u32>,

        /// Field delimiter (overrides ST_INDEX_DELIMITER)
        #[arg(long)]
        delimiter: Option<String>,
    },

    /// Rank one year's cohort by a numeric column, descending
    Rank {
        /// Column name from the output header
        #[arg(short, long, default_value = "stability_score")]
        column: String,

        /// Year; defaults to the latest loaded year
        #[arg(long)]
        year: Option<i32>,

        /// Granularity: SECTION, L2, L3 or L4
        #[arg(long, default_value = "L2")]
        level: CodeLevel,

        /// Only codes inside this section letter
        #[arg(long)]
        section: Option<char>,

        #[arg(long)]
        min_revenue: Option<f64>,

        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// One entity's historical and forecast series
    Forecast {
        /// Industry code in any accepted form (41, 41.20.Z, SEK_F)
        #[arg(long)]
        code: String,

        #[arg(long)]
        horizon: Option<u32>,
    },

    /// Hierarchy drill-down below a code
    Drill {
        #[arg(long)]
        code: String,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long, default_value = "3")]
        depth: usize,

        /// Follow the child with the highest value in this column instead of
        /// printing the whole subtree
        #[arg(long)]
        follow: Option<String>,
    },

    /// Section totals rolled up from divisions, with the consistency check
    Sections {
        #[arg(long)]
        year: Option<i32>,

        /// Relative tolerance of the roll-up check
        #[arg(long, default_value = "0.01")]
        tolerance: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_conversion() {
        assert_eq!(NormalizationStrategy::from(StrategyArg::Relative), NormalizationStrategy::Relative);
        assert_eq!(NormalizationStrategy::from(StrategyArg::Absolute), NormalizationStrategy::Absolute);
    }

    #[test]
    fn test_cli_parsing_build_command() {
        let cli = Cli::parse_from([
            "st-index",
            "--data-dir",
            "/srv/data",
            "build",
            "--strategy",
            "absolute",
            "--horizon",
            "3",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/data")));
        match cli.command {
            Commands::Build { strategy, horizon, output, .. } => {
                assert!(matches!(strategy, Some(StrategyArg::Absolute)));
                assert_eq!(horizon, Some(3));
                assert!(output.is_none());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_parsing_rank_defaults() {
        let cli = Cli::parse_from(["st-index", "rank", "--section", "F"]);
        match cli.command {
            Commands::Rank {
                column,
                level,
                section,
                top,
                year,
                ..
            } => {
                assert_eq!(column, "stability_score");
                assert_eq!(level, CodeLevel::Division);
                assert_eq!(section, Some('F'));
                assert_eq!(top, 10);
                assert!(year.is_none());
            }
            _ => panic!("Expected Rank command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_level() {
        assert!(Cli::try_parse_from(["st-index", "rank", "--level", "L9"]).is_err());
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let cli = Cli::parse_from(["st-index", "sections", "--config", "weights.json"]);
        assert_eq!(cli.config, Some(PathBuf::from("weights.json")));
        match cli.command {
            Commands::Sections { tolerance, .. } => assert!((tolerance - 0.01).abs() < 1e-12),
            _ => panic!("Expected Sections command"),
        }
    }
}
