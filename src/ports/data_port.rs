//! Table provider port.
//!
//! The fetch methods return `None` on any transport or parse failure so
//! polling callers degrade to an empty result instead of crashing; the
//! adapter is expected to log the cause.

use crate::domain::error::TsefilterError;
use crate::domain::table::Table;

pub trait TableProvider {
    /// One cross-sectional snapshot row per instrument, realtime columns.
    fn fetch_realtime(&self) -> Option<Table>;

    /// Per-instrument time series, oldest first, at least `length` periods
    /// where available, with all current-period history columns populated.
    fn fetch_history(&self, symbol: &str, length: usize) -> Option<Table>;

    fn list_symbols(&self) -> Result<Vec<String>, TsefilterError>;
}
