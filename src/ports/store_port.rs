//! Summary persistence port.

use crate::domain::error::TsefilterError;
use crate::domain::table::Table;

/// Durable keyed store for the history summary table. Values must
/// round-trip without precision loss sufficient to change predicate
/// outcomes.
pub trait SummaryStore {
    fn exists(&self) -> bool;

    fn save(&self, table: &Table) -> Result<(), TsefilterError>;

    /// Load the persisted summary. A store that was never written returns
    /// [`TsefilterError::SummaryMissing`] — an operator mistake, distinct
    /// from a transient fetch failure.
    fn load(&self) -> Result<Table, TsefilterError>;
}
