mod cli;
mod settings;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use index_core::{IndustryCode, NormalizationStrategy, PipelineConfig};
use index_pipeline::{CohortFilter, IndexPipeline, OutputRow, OutputTable};
use pkd_codes::{normalize_code, DrillNode};
use settings::{parse_delimiter, PipelineSettings};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut settings = PipelineSettings::from_env()?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if cli.config.is_some() {
        settings.config = cli.config;
    }

    let mut config = match &settings.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let horizon_flag = match &cli.command {
        Commands::Build { horizon, .. } | Commands::Forecast { horizon, .. } => *horizon,
        _ => None,
    };
    if let Some(horizon) = horizon_flag.or(settings.horizon) {
        config.forecast.horizon = horizon;
    }

    let paths = settings.source_paths();
    tracing::info!(data_dir = %settings.data_dir.display(), "loading source tables");
    let pipeline = IndexPipeline::load(config, &paths).context("failed to load source tables")?;

    match cli.command {
        Commands::Build {
            output,
            strategy,
            delimiter,
            ..
        } => {
            let horizon = pipeline.config().forecast.horizon;
            let strategy = strategy.map(NormalizationStrategy::from).unwrap_or(if horizon > 0 {
                NormalizationStrategy::Absolute
            } else {
                NormalizationStrategy::Relative
            });
            let delimiter = match delimiter {
                Some(d) => parse_delimiter(&d)?,
                None => settings.delimiter,
            };
            let output = output.unwrap_or(settings.output);
            build(&pipeline, strategy, &output, delimiter)
        }
        Commands::Rank {
            column,
            year,
            level,
            section,
            min_revenue,
            top,
        } => {
            let year = resolve_year(&pipeline, year)?;
            let mut filter = CohortFilter::year(year).with_level(level);
            if let Some(letter) = section {
                filter = filter.with_section(letter);
            }
            if let Some(min) = min_revenue {
                filter = filter.with_min_revenue(min);
            }
            let table = OutputTable::from_scored(&pipeline.score_relative(&filter))
                .rank_by(&column)?
                .top(top);
            println!("{year} {level} by {column}");
            for (i, row) in table.rows().iter().enumerate() {
                let value = row.value(&column)?.map_or("-".to_string(), |v| format!("{v:.2}"));
                println!("{:>3}. {:<10} {:>10}  {}", i + 1, row.code, value, row.name);
            }
            Ok(())
        }
        Commands::Forecast { code, .. } => {
            let code = normalize_code(&code);
            forecast(&pipeline, &code, pipeline.config().forecast.horizon)
        }
        Commands::Drill {
            code,
            year,
            depth,
            follow,
        } => {
            let code = normalize_code(&code);
            let year = resolve_year(&pipeline, year)?;
            match follow {
                Some(column) => {
                    for row in pipeline.drill_path(&code, year, depth, &column)? {
                        let value = row.value(&column)?.map_or("-".to_string(), |v| format!("{v:.2}"));
                        println!("{:<10} {:>10}  {}", row.code, value, row.name);
                    }
                }
                None => {
                    let node = pipeline
                        .drill(&code, year, depth)
                        .ok_or_else(|| anyhow!("{code} has no data in {year}"))?;
                    print_node(&node, 0);
                }
            }
            Ok(())
        }
        Commands::Sections { year, tolerance } => {
            let year = resolve_year(&pipeline, year)?;
            let report = pipeline.sections(year, tolerance);
            for total in &report.totals {
                let s = &total.summary;
                println!(
                    "{:<7} revenue {:>14} net_profit {:>12} debt {:>14} entities {:>8}",
                    total.section,
                    s.revenue.round_dp(2),
                    s.net_profit.round_dp(2),
                    s.total_debt().round_dp(2),
                    s.entity_count.round_dp(0),
                );
            }
            for m in &report.mismatches {
                println!(
                    "MISMATCH {} {} {}: reported {} vs divisions {} (diff {})",
                    m.section,
                    m.year,
                    m.field,
                    m.reported.round_dp(2),
                    m.from_children.round_dp(2),
                    m.difference().round_dp(2),
                );
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("st_index=info,index_pipeline=info,data_ingest=info"))
    };

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).with_writer(std::io::stderr).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).with_writer(std::io::stderr).init();
    }
}

fn resolve_year(pipeline: &IndexPipeline, year: Option<i32>) -> Result<i32> {
    year.or_else(|| pipeline.latest_year())
        .ok_or_else(|| anyhow!("no historical rows loaded"))
}

fn build(pipeline: &IndexPipeline, strategy: NormalizationStrategy, output: &Path, delimiter: u8) -> Result<()> {
    let table = pipeline.run(strategy)?;
    table
        .write_to_path(output, delimiter)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(rows = table.len(), path = %output.display(), "index written");
    Ok(())
}

fn forecast(pipeline: &IndexPipeline, code: &IndustryCode, horizon: u32) -> Result<()> {
    let series = pipeline
        .forecast_entity(code, horizon)
        .with_context(|| format!("failed to forecast {code}"))?;
    if series.is_empty() {
        return Err(anyhow!("{code} has no history"));
    }
    let table = OutputTable::from_scored(&series);
    if let Some(first) = table.rows().first() {
        println!("{} {}", first.code, first.name);
    }
    for row in table.rows() {
        print_series_row(row);
    }
    if let Some(commentary) = pipeline.commentary().get(code) {
        println!();
        println!("CRO: {}", commentary.cro_opinion);
        println!("CSO: {}", commentary.cso_opinion);
        println!("Verdict: {}", commentary.final_verdict);
    }
    Ok(())
}

fn print_series_row(row: &OutputRow) {
    let marker = if row.is_forecast { "F" } else { " " };
    let status = row.forecast_status.as_deref().unwrap_or(&row.status);
    println!(
        "{} {}  revenue {:>14.2}  stability {:>6.2}  transformation {:>6.2}  lending {:>6.2}  {}",
        row.year,
        marker,
        row.revenue,
        row.stability_score,
        row.transformation_score,
        row.lending_score,
        status
    );
}

fn print_node(node: &DrillNode, indent: usize) {
    println!("{:indent$}{}", "", node.code, indent = indent * 2);
    for child in &node.children {
        print_node(child, indent + 1);
    }
}
