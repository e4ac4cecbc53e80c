//! CSV file table provider.
//!
//! Serves tables from a directory of CSV files: `realtime.csv` for the
//! snapshot, `<symbol>.csv` for each instrument's series. This is the
//! offline stand-in for a live feed; per the port contract every failure
//! is logged and reported as "no table".

use crate::adapters::csv_table;
use crate::domain::error::TsefilterError;
use crate::domain::table::Table;
use crate::ports::data_port::TableProvider;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

const REALTIME_FILE: &str = "realtime.csv";
const SUMMARY_FILE: &str = "summary.csv";

pub struct CsvDataAdapter {
    base_path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

impl TableProvider for CsvDataAdapter {
    fn fetch_realtime(&self) -> Option<Table> {
        let path = self.base_path.join(REALTIME_FILE);
        match csv_table::read_table(&path) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "realtime snapshot unavailable");
                None
            }
        }
    }

    fn fetch_history(&self, symbol: &str, length: usize) -> Option<Table> {
        let path = self.base_path.join(format!("{symbol}.csv"));
        let table = match csv_table::read_table(&path) {
            Ok(table) => table,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "history series unavailable");
                return None;
            }
        };
        if table.len() <= length {
            return Some(table);
        }
        // Keep only the trailing window the indicators need.
        let skip = table.len() - length;
        let mask: Vec<bool> = (0..table.len()).map(|i| i >= skip).collect();
        Some(table.select(&mask))
    }

    fn list_symbols(&self) -> Result<Vec<String>, TsefilterError> {
        let entries = fs::read_dir(&self.base_path)?;
        let mut symbols = Vec::new();

        for entry in entries {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if name == REALTIME_FILE || name == SUMMARY_FILE {
                continue;
            }
            if let Some(stem) = name.strip_suffix(".csv") {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
