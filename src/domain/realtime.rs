//! Realtime filter session.
//!
//! Owns one snapshot at a time: `refresh` replaces the whole table (or
//! records a failed fetch), filtering runs the bound condition over it.
//! Provider failures degrade to an empty, schema-shaped result so a caller
//! polling on a cadence keeps running through transient outages.

use crate::domain::condition::Condition;
use crate::domain::condition_eval;
use crate::domain::error::TsefilterError;
use crate::domain::schema::Schema;
use crate::domain::table::{Table, Value};
use crate::ports::data_port::TableProvider;
use tracing::{debug, info, warn};

pub struct RealtimeFilter {
    schema: Schema,
    condition: Option<Condition>,
    datas: Option<Table>,
    filtered: Option<Table>,
    download_status: bool,
}

impl RealtimeFilter {
    pub fn new() -> Self {
        Self {
            schema: Schema::realtime(),
            condition: None,
            datas: None,
            filtered: None,
            download_status: false,
        }
    }

    pub fn with_condition(condition: Condition) -> Self {
        let mut session = Self::new();
        session.condition = Some(condition);
        session
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.condition = Some(condition);
    }

    pub fn download_ok(&self) -> bool {
        self.download_status
    }

    pub fn last_filtered(&self) -> Option<&Table> {
        self.filtered.as_ref()
    }

    /// Replace the owned snapshot with a fresh fetch. A failed fetch leaves
    /// no table; the previous filtered result is discarded either way.
    pub fn refresh(&mut self, provider: &dyn TableProvider) {
        self.datas = provider.fetch_realtime();
        self.filtered = None;
        self.download_status = self.datas.is_some();
        match &self.datas {
            Some(table) => debug!(rows = table.len(), "realtime snapshot refreshed"),
            None => warn!("realtime fetch failed, no snapshot available"),
        }
    }

    /// The full snapshot, optionally refreshed first.
    pub fn all(&mut self, provider: &dyn TableProvider, update_data: bool) -> Option<&Table> {
        if update_data {
            self.refresh(provider);
        }
        self.datas.as_ref()
    }

    /// Run the bound condition over the snapshot. With `update_data` the
    /// snapshot is refreshed first. No snapshot (failed fetch) yields an
    /// empty, schema-shaped table rather than an error.
    pub fn filter_by_condition(
        &mut self,
        provider: &dyn TableProvider,
        update_data: bool,
    ) -> Result<Table, TsefilterError> {
        if self.condition.is_none() {
            return Err(TsefilterError::ConditionMissing);
        }
        if update_data {
            self.refresh(provider);
        }
        let Some(condition) = self.condition.as_ref() else {
            return Err(TsefilterError::ConditionMissing);
        };

        let Some(table) = self.datas.as_ref() else {
            return Ok(Table::new(self.schema.columns().to_vec()));
        };

        let matched = condition_eval::apply(table, condition)?;
        let matched = drop_null_symbols(matched);
        info!(
            matched = matched.len(),
            total = table.len(),
            condition = %condition,
            "realtime filter applied"
        );
        self.filtered = Some(matched.clone());
        Ok(matched)
    }

    /// Compile `text` against the realtime schema, bind it, and filter with
    /// a fresh snapshot.
    pub fn filter_by_text(
        &mut self,
        provider: &dyn TableProvider,
        text: &str,
    ) -> Result<Table, TsefilterError> {
        let condition = Condition::new(text, &self.schema)?;
        self.condition = Some(condition);
        self.filter_by_condition(provider, true)
    }
}

impl Default for RealtimeFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Rows whose symbol cell is null or empty are feed artifacts; drop them.
fn drop_null_symbols(table: Table) -> Table {
    if table.column_position("symbol").is_none() {
        return table;
    }
    let mask: Vec<bool> = (0..table.len())
        .map(|row| match table.value(row, "symbol") {
            Some(Value::Text(s)) => !s.is_empty(),
            Some(Value::Number(_)) => true,
            _ => false,
        })
        .collect();
    table.select(&mask)
}
