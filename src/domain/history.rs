//! History filter session.
//!
//! Owns the indicator configuration and the schema derived from it. The
//! summarization step reduces each instrument's time series to a single
//! row — last period in the current columns, second-to-last under the lag
//! prefix — persists the resulting table through a [`SummaryStore`], and
//! filtering always runs against the persisted summary. Filtering before
//! any summary exists is an operator mistake and surfaces as a hard
//! [`TsefilterError::SummaryMissing`].

use crate::domain::condition::Condition;
use crate::domain::condition_eval;
use crate::domain::error::TsefilterError;
use crate::domain::indicator_config::IndicatorConfig;
use crate::domain::schema::{LAG_PREFIX, Schema};
use crate::domain::table::{Table, Value};
use crate::ports::data_port::TableProvider;
use crate::ports::store_port::SummaryStore;
use tracing::{info, warn};

pub struct HistoryFilter {
    config: IndicatorConfig,
    schema: Schema,
    condition: Option<Condition>,
    filtered: Option<Table>,
    download_status: bool,
    num_success: usize,
    num_symbols: usize,
}

impl HistoryFilter {
    pub fn new(config: IndicatorConfig) -> Self {
        let schema = Schema::history(&config);
        Self {
            config,
            schema,
            condition: None,
            filtered: None,
            download_status: false,
            num_success: 0,
            num_symbols: 0,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Swap in a new indicator configuration and rebuild the schema from
    /// it. A previously bound condition stays bound; if it references a
    /// column the new schema no longer produces, the next filter fails
    /// fast on the missing column.
    pub fn set_config(&mut self, config: IndicatorConfig) {
        self.schema = Schema::history(&config);
        self.config = config;
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

    /// Fetch each symbol's series, reduce it to one summary row, and
    /// persist the batch. Symbols whose fetch fails, whose series is too
    /// short to carry a lag period, or that repeat an earlier entry are
    /// skipped, not fatal. A batch that produces no rows persists nothing,
    /// so a store that was never written still reports the summary as
    /// missing.
    pub fn download_summary(
        &mut self,
        provider: &dyn TableProvider,
        store: &dyn SummaryStore,
        symbols: &[String],
    ) -> Result<Table, TsefilterError> {
        let length = self.config.length_hint();
        let mut summary = Table::new(self.schema.columns().to_vec());

        for symbol in symbols {
            if summary.symbols().contains(symbol) {
                warn!(symbol = %symbol, "duplicate symbol in request, skipping");
                continue;
            }
            let Some(series) = provider.fetch_history(symbol, length) else {
                warn!(symbol = %symbol, "history fetch failed, skipping");
                continue;
            };
            if series.len() < 2 {
                warn!(
                    symbol = %symbol,
                    rows = series.len(),
                    "series too short for a lag period, skipping"
                );
                continue;
            }
            summary.push_row(symbol.clone(), self.summarize_series(&series))?;
        }

        self.num_symbols = symbols.len();
        self.num_success = summary.len();
        self.download_status = !summary.is_empty();

        if summary.is_empty() {
            warn!(total = self.num_symbols, "no symbol yielded a summary row, nothing persisted");
            return Ok(summary);
        }

        info!(
            success = self.num_success,
            total = self.num_symbols,
            "history summary built"
        );
        store.save(&summary)?;
        Ok(summary)
    }

    /// One summary row in schema column order: current columns from the
    /// series' last period, lag columns from the one before it. Columns the
    /// provider did not deliver are null and so never match a comparison.
    fn summarize_series(&self, series: &Table) -> Vec<Value> {
        let last = series.len() - 1;
        let prev = last - 1;
        self.schema
            .columns()
            .iter()
            .map(|column| {
                let (row, name) = match column.strip_prefix(LAG_PREFIX) {
                    Some(base) => (prev, base),
                    None => (last, column.as_str()),
                };
                series.value(row, name).cloned().unwrap_or(Value::Null)
            })
            .collect()
    }

    /// Run the bound condition over the persisted summary.
    pub fn filter_by_condition(
        &mut self,
        store: &dyn SummaryStore,
    ) -> Result<Table, TsefilterError> {
        let condition = self
            .condition
            .as_ref()
            .ok_or(TsefilterError::ConditionMissing)?;
        let summary = store.load()?;
        let matched = condition_eval::apply(&summary, condition)?;
        info!(
            matched = matched.len(),
            total = summary.len(),
            condition = %condition,
            "history filter applied"
        );
        self.filtered = Some(matched.clone());
        Ok(matched)
    }

    /// Compile `text` against this session's history schema, bind it, and
    /// filter the persisted summary.
    pub fn filter_by_text(
        &mut self,
        store: &dyn SummaryStore,
        text: &str,
    ) -> Result<Table, TsefilterError> {
        let condition = Condition::new(text, &self.schema)?;
        self.condition = Some(condition);
        self.filter_by_condition(store)
    }
}

impl std::fmt::Display for HistoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.download_status {
            write!(
                f,
                "history summary: {} of {} symbols downloaded",
                self.num_success, self.num_symbols
            )
        } else {
            write!(f, "no history summary downloaded yet")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct MockProvider {
        series: HashMap<String, Table>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                series: HashMap::new(),
            }
        }

        fn with_series(mut self, symbol: &str, closes: &[f64]) -> Self {
            let mut t = Table::new(vec!["close".into(), "rsi".into()]);
            for (i, close) in closes.iter().enumerate() {
                t.push_row(
                    format!("{symbol}-{i}"),
                    vec![Value::Number(*close), Value::Number(50.0)],
                )
                .unwrap();
            }
            self.series.insert(symbol.to_string(), t);
            self
        }
    }

    impl TableProvider for MockProvider {
        fn fetch_realtime(&self) -> Option<Table> {
            None
        }

        fn fetch_history(&self, symbol: &str, _length: usize) -> Option<Table> {
            self.series.get(symbol).cloned()
        }

        fn list_symbols(&self) -> Result<Vec<String>, TsefilterError> {
            let mut symbols: Vec<String> = self.series.keys().cloned().collect();
            symbols.sort();
            Ok(symbols)
        }
    }

    struct MemoryStore {
        table: RefCell<Option<Table>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                table: RefCell::new(None),
            }
        }
    }

    impl SummaryStore for MemoryStore {
        fn exists(&self) -> bool {
            self.table.borrow().is_some()
        }

        fn save(&self, table: &Table) -> Result<(), TsefilterError> {
            *self.table.borrow_mut() = Some(table.clone());
            Ok(())
        }

        fn load(&self) -> Result<Table, TsefilterError> {
            self.table
                .borrow()
                .clone()
                .ok_or_else(|| TsefilterError::SummaryMissing {
                    path: "memory".to_string(),
                })
        }
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn download_summary_reduces_to_current_and_lag() {
        let provider = MockProvider::new().with_series("aaa", &[80.0, 90.0, 100.0]);
        let store = MemoryStore::new();
        let mut session = HistoryFilter::new(IndicatorConfig::default());

        let summary = session
            .download_summary(&provider, &store, &symbols(&["aaa"]))
            .unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary.symbols(), &["aaa".to_string()]);
        assert_eq!(summary.value(0, "close"), Some(&Value::Number(100.0)));
        assert_eq!(summary.value(0, "y_close"), Some(&Value::Number(90.0)));
        // Columns the provider never delivered are null.
        assert_eq!(summary.value(0, "macd"), Some(&Value::Null));
        assert!(store.exists());
        assert!(session.download_ok());
    }

    #[test]
    fn failed_and_short_series_are_skipped_not_fatal() {
        let provider = MockProvider::new()
            .with_series("good", &[1.0, 2.0])
            .with_series("short", &[1.0]);
        let store = MemoryStore::new();
        let mut session = HistoryFilter::new(IndicatorConfig::default());

        let summary = session
            .download_summary(&provider, &store, &symbols(&["good", "short", "absent"]))
            .unwrap();

        assert_eq!(summary.symbols(), &["good".to_string()]);
        assert_eq!(format!("{session}"), "history summary: 1 of 3 symbols downloaded");
    }

    #[test]
    fn filter_before_download_is_a_hard_error() {
        let store = MemoryStore::new();
        let mut session = HistoryFilter::new(IndicatorConfig::default());
        let err = session.filter_by_text(&store, "close > 0").unwrap_err();
        assert!(matches!(err, TsefilterError::SummaryMissing { .. }));
    }

    #[test]
    fn filter_by_text_selects_from_persisted_summary() {
        let provider = MockProvider::new()
            .with_series("rising", &[90.0, 100.0])
            .with_series("falling", &[100.0, 90.0]);
        let store = MemoryStore::new();
        let mut session = HistoryFilter::new(IndicatorConfig::default());
        session
            .download_summary(&provider, &store, &provider.list_symbols().unwrap())
            .unwrap();

        let matched = session.filter_by_text(&store, "close > y_close").unwrap();
        assert_eq!(matched.symbols(), &["rising".to_string()]);
    }

    #[test]
    fn empty_batch_persists_nothing() {
        let provider = MockProvider::new();
        let store = MemoryStore::new();
        let mut session = HistoryFilter::new(IndicatorConfig::default());

        let summary = session
            .download_summary(&provider, &store, &symbols(&["absent"]))
            .unwrap();
        assert!(summary.is_empty());
        assert!(!session.download_ok());
        assert!(!store.exists());

        // The missing-prerequisite error survives a failed batch.
        let err = session.filter_by_text(&store, "close > 0").unwrap_err();
        assert!(matches!(err, TsefilterError::SummaryMissing { .. }));
    }

    #[test]
    fn empty_batch_leaves_previous_summary_intact() {
        let provider = MockProvider::new().with_series("aaa", &[1.0, 2.0]);
        let store = MemoryStore::new();
        let mut session = HistoryFilter::new(IndicatorConfig::default());
        session
            .download_summary(&provider, &store, &symbols(&["aaa"]))
            .unwrap();

        session
            .download_summary(&MockProvider::new(), &store, &symbols(&["aaa"]))
            .unwrap();
        assert_eq!(store.load().unwrap().symbols(), &["aaa".to_string()]);
    }

    #[test]
    fn duplicate_symbols_are_summarized_once() {
        let provider = MockProvider::new().with_series("aaa", &[1.0, 2.0]);
        let store = MemoryStore::new();
        let mut session = HistoryFilter::new(IndicatorConfig::default());

        let summary = session
            .download_summary(&provider, &store, &symbols(&["aaa", "aaa"]))
            .unwrap();
        assert_eq!(summary.symbols(), &["aaa".to_string()]);
    }

    #[test]
    fn set_config_rebuilds_schema() {
        use crate::domain::indicator_config::IndicatorSpec;

        let mut session = HistoryFilter::new(IndicatorConfig::default());
        assert!(!session.schema().contains("foo"));

        let mut config = IndicatorConfig::default();
        config.indicators.push(IndicatorSpec::SingleOutput {
            name: "foo".to_string(),
            columns: vec!["foo".to_string()],
            params: Default::default(),
        });
        session.set_config(config);
        assert!(session.schema().contains("foo"));
        assert!(session.schema().contains("y_foo"));
    }
}
