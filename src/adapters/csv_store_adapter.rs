//! CSV summary store.

use crate::adapters::csv_table;
use crate::domain::error::TsefilterError;
use crate::domain::table::Table;
use crate::ports::store_port::SummaryStore;
use std::path::PathBuf;

pub struct CsvSummaryStore {
    path: PathBuf,
}

impl CsvSummaryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SummaryStore for CsvSummaryStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn save(&self, table: &Table) -> Result<(), TsefilterError> {
        csv_table::write_table(&self.path, "symbol", table)
    }

    fn load(&self) -> Result<Table, TsefilterError> {
        if !self.exists() {
            return Err(TsefilterError::SummaryMissing {
                path: self.path.display().to_string(),
            });
        }
        csv_table::read_table(&self.path)
    }
}
