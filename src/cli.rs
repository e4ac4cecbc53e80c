//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_data_adapter::CsvDataAdapter;
use crate::adapters::csv_store_adapter::CsvSummaryStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::condition::Condition;
use crate::domain::error::TsefilterError;
use crate::domain::history::HistoryFilter;
use crate::domain::indicator_config::IndicatorConfig;
use crate::domain::realtime::RealtimeFilter;
use crate::domain::schema::{Schema, TableKind};
use crate::domain::table::Table;
use crate::ports::data_port::TableProvider;

#[derive(Parser, Debug)]
#[command(name = "tsefilter", about = "Condition-based screener for market tables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Realtime,
    History,
}

impl From<KindArg> for TableKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Realtime => TableKind::Realtime,
            KindArg::History => TableKind::History,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Filter the realtime snapshot once and print matching symbols
    Realtime {
        /// Directory holding realtime.csv
        #[arg(short, long)]
        data: PathBuf,
        /// Condition text given inline
        #[arg(short, long)]
        expr: Option<String>,
        /// File holding the condition text
        #[arg(short, long)]
        condition: Option<PathBuf>,
    },
    /// Build or filter the per-instrument history summary
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Validate a condition against a schema kind
    Validate {
        #[arg(short, long, value_enum)]
        kind: KindArg,
        #[arg(short, long)]
        expr: Option<String>,
        #[arg(short, long)]
        condition: Option<PathBuf>,
        /// Indicator configuration (history schema only)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the valid column names for a schema kind
    Columns {
        #[arg(short, long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Fetch every symbol's series and persist the summary table
    Download {
        /// Directory holding one <symbol>.csv series per instrument
        #[arg(short, long)]
        data: PathBuf,
        /// Where to write the summary table
        #[arg(short, long)]
        summary: PathBuf,
        /// Comma-separated symbol list; defaults to every series on disk
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Filter the persisted summary and print matching symbols
    Filter {
        #[arg(short, long)]
        summary: PathBuf,
        #[arg(short, long)]
        expr: Option<String>,
        #[arg(short, long)]
        condition: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Realtime {
            data,
            expr,
            condition,
        } => run_realtime(&data, expr.as_deref(), condition.as_ref()),
        Command::History { action } => match action {
            HistoryCommand::Download {
                data,
                summary,
                symbols,
                config,
            } => run_history_download(&data, &summary, symbols.as_deref(), config.as_ref()),
            HistoryCommand::Filter {
                summary,
                expr,
                condition,
                config,
            } => run_history_filter(&summary, expr.as_deref(), condition.as_ref(), config.as_ref()),
        },
        Command::Validate {
            kind,
            expr,
            condition,
            config,
        } => run_validate(kind, expr.as_deref(), condition.as_ref(), config.as_ref()),
        Command::Columns { kind, config } => run_columns(kind, config.as_ref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn condition_text(
    expr: Option<&str>,
    file: Option<&PathBuf>,
) -> Result<String, TsefilterError> {
    match (expr, file) {
        (Some(text), None) => Ok(text.to_string()),
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
        _ => Err(TsefilterError::ConditionInvalid {
            reason: "provide exactly one of --expr or --condition".to_string(),
        }),
    }
}

fn load_indicator_config(path: Option<&PathBuf>) -> Result<IndicatorConfig, TsefilterError> {
    match path {
        None => Ok(IndicatorConfig::default()),
        Some(path) => {
            let adapter =
                FileConfigAdapter::from_file(path).map_err(|e| TsefilterError::ConfigParse {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            IndicatorConfig::from_config(&adapter)
        }
    }
}

fn compile_condition(text: &str, schema: &Schema) -> Result<Condition, TsefilterError> {
    Condition::new(text, schema).map_err(|err| {
        if let TsefilterError::ConditionParse(parse_err) = &err {
            eprintln!(
                "{}",
                parse_err.display_with_context(&text.trim().to_lowercase())
            );
        }
        err
    })
}

fn parse_symbol_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn print_matches(table: &Table) {
    for symbol in table.symbols() {
        println!("{symbol}");
    }
    eprintln!("{} symbol(s) matched", table.len());
}

fn run_realtime(
    data: &PathBuf,
    expr: Option<&str>,
    condition_file: Option<&PathBuf>,
) -> Result<(), TsefilterError> {
    let text = condition_text(expr, condition_file)?;
    let provider = CsvDataAdapter::new(data.clone());
    let mut session = RealtimeFilter::new();

    let condition = compile_condition(&text, session.schema())?;
    session.set_condition(condition);
    let matched = session.filter_by_condition(&provider, true)?;
    if !session.download_ok() {
        eprintln!("warning: snapshot unavailable, empty result");
    }
    print_matches(&matched);
    Ok(())
}

fn run_history_download(
    data: &PathBuf,
    summary: &PathBuf,
    symbols: Option<&str>,
    config: Option<&PathBuf>,
) -> Result<(), TsefilterError> {
    let config = load_indicator_config(config)?;
    let provider = CsvDataAdapter::new(data.clone());
    let store = CsvSummaryStore::new(summary.clone());
    let mut session = HistoryFilter::new(config);

    let symbols = match symbols {
        Some(list) => parse_symbol_list(list),
        None => provider.list_symbols()?,
    };
    session.download_summary(&provider, &store, &symbols)?;
    println!("{session}");
    Ok(())
}

fn run_history_filter(
    summary: &PathBuf,
    expr: Option<&str>,
    condition_file: Option<&PathBuf>,
    config: Option<&PathBuf>,
) -> Result<(), TsefilterError> {
    let text = condition_text(expr, condition_file)?;
    let config = load_indicator_config(config)?;
    let store = CsvSummaryStore::new(summary.clone());
    let mut session = HistoryFilter::new(config);

    let condition = compile_condition(&text, session.schema())?;
    session.set_condition(condition);
    let matched = session.filter_by_condition(&store)?;
    print_matches(&matched);
    Ok(())
}

fn run_validate(
    kind: KindArg,
    expr: Option<&str>,
    condition_file: Option<&PathBuf>,
    config: Option<&PathBuf>,
) -> Result<(), TsefilterError> {
    let text = condition_text(expr, condition_file)?;
    let config = load_indicator_config(config)?;
    let schema = Schema::for_kind(kind.into(), &config);
    let condition = compile_condition(&text, &schema)?;
    println!("valid {} condition: {}", schema.kind(), condition);
    Ok(())
}

fn run_columns(kind: KindArg, config: Option<&PathBuf>) -> Result<(), TsefilterError> {
    let config = load_indicator_config(config)?;
    let schema = Schema::for_kind(kind.into(), &config);
    for column in schema.columns() {
        println!("{column}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_text_requires_exactly_one_source() {
        assert!(condition_text(None, None).is_err());
        assert_eq!(condition_text(Some("pl > 1"), None).unwrap(), "pl > 1");

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cond.txt");
        std::fs::write(&path, "tvol > 0").unwrap();
        assert_eq!(condition_text(None, Some(&path)).unwrap(), "tvol > 0");
        assert!(condition_text(Some("pl > 1"), Some(&path)).is_err());
    }

    #[test]
    fn parse_symbol_list_trims_and_skips_empty() {
        assert_eq!(
            parse_symbol_list(" aaa, bbb ,,ccc "),
            vec!["aaa", "bbb", "ccc"]
        );
    }

    #[test]
    fn load_indicator_config_defaults_without_path() {
        let config = load_indicator_config(None).unwrap();
        assert!(!config.indicators.is_empty());
    }
}
