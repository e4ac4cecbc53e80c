//! End-to-end tests across the schema registry, condition compiler,
//! evaluator, sessions and CSV adapters.

mod common;

use common::*;
use proptest::prelude::*;
use tsefilter::adapters::csv_data_adapter::CsvDataAdapter;
use tsefilter::adapters::csv_store_adapter::CsvSummaryStore;
use tsefilter::domain::condition::Condition;
use tsefilter::domain::condition_eval;
use tsefilter::domain::error::TsefilterError;
use tsefilter::domain::history::HistoryFilter;
use tsefilter::domain::indicator_config::{IndicatorConfig, IndicatorSpec};
use tsefilter::domain::realtime::RealtimeFilter;
use tsefilter::domain::schema::Schema;
use tsefilter::ports::data_port::TableProvider;
use tsefilter::ports::store_port::SummaryStore;

mod schema_wide_validity {
    use super::*;

    /// Every numeric column accepts a near-always-true bound and the
    /// validation row satisfies it.
    fn assert_all_columns_filterable(schema: &Schema) {
        let validation = schema.validation_table();
        for column in schema.columns() {
            if validation.value(0, column).unwrap().as_number().is_none() {
                continue; // text column
            }
            let condition = Condition::new(&format!("{column} > -1e18"), schema)
                .unwrap_or_else(|e| panic!("column {column}: {e}"));
            let matched = condition_eval::apply(&validation, &condition).unwrap();
            assert_eq!(matched.len(), 1, "column {column} did not match");
        }
    }

    #[test]
    fn every_realtime_column_is_filterable() {
        assert_all_columns_filterable(&Schema::realtime());
    }

    #[test]
    fn every_history_column_is_filterable() {
        assert_all_columns_filterable(&Schema::history(&IndicatorConfig::default()));
    }
}

mod cross_kind_misuse {
    use super::*;

    #[test]
    fn history_condition_on_realtime_table_fails_fast() {
        let schema = Schema::history(&IndicatorConfig::default());
        let condition = Condition::new("rsi < 40 and power_of_demand > 2", &schema).unwrap();
        let err = condition_eval::apply(&sample_snapshot(), &condition).unwrap_err();
        assert!(matches!(err, TsefilterError::MissingColumn { .. }));
    }

    #[test]
    fn realtime_condition_on_history_table_fails_fast() {
        let condition = Condition::new("tvol > 0", &Schema::realtime()).unwrap();
        let history_shaped = table(&["close", "y_close"], &[("aaa", vec![num(1.0), num(2.0)])]);
        let err = condition_eval::apply(&history_shaped, &condition).unwrap_err();
        assert!(matches!(
            err,
            TsefilterError::MissingColumn { ref column } if column == "tvol"
        ));
    }
}

mod realtime_pipeline {
    use super::*;

    #[test]
    fn filter_by_text_selects_expected_subset() {
        let provider = MockProvider::new().with_realtime(sample_snapshot());
        let mut session = RealtimeFilter::new();

        let matched = session
            .filter_by_text(&provider, "pl > 100 and tvol > 100")
            .unwrap();
        assert_eq!(matched.symbols(), &["strong".to_string()]);

        let matched = session
            .filter_by_text(&provider, "pl > 100 and tvol > 100 or power > 2")
            .unwrap();
        assert_eq!(
            matched.symbols(),
            &["strong".to_string(), "thin".to_string()]
        );
    }

    #[test]
    fn provider_failure_yields_empty_shaped_result() {
        let provider = MockProvider::new();
        let mut session = RealtimeFilter::new();
        let matched = session.filter_by_text(&provider, "pl > 0").unwrap();
        assert!(matched.is_empty());
        assert_eq!(matched.columns(), session.schema().columns());
    }

    #[test]
    fn csv_backed_snapshot_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("realtime.csv"),
            "id,symbol,pl,tvol,power\n\
             1,alpha,100,5000,2.5\n\
             2,beta,300,100,0.4\n",
        )
        .unwrap();
        let provider = CsvDataAdapter::new(dir.path().to_path_buf());

        let mut session = RealtimeFilter::new();
        let matched = session.filter_by_text(&provider, "power > 1").unwrap();
        assert_eq!(matched.symbols(), &["1".to_string()]);
        assert!(session.download_ok());
    }
}

mod history_pipeline {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn download_filter_and_reload_across_sessions() {
        let provider = MockProvider::new()
            .with_series("rising", sample_series(&[90.0, 95.0, 100.0], 35.0))
            .with_series("falling", sample_series(&[100.0, 95.0, 90.0], 75.0));
        let dir = tempfile::TempDir::new().unwrap();
        let store = CsvSummaryStore::new(dir.path().join("summary.csv"));

        let mut session = HistoryFilter::new(IndicatorConfig::default());
        session
            .download_summary(&provider, &store, &provider.list_symbols().unwrap())
            .unwrap();

        let matched = session
            .filter_by_text(&store, "close > y_close and rsi < 40")
            .unwrap();
        assert_eq!(matched.symbols(), &["rising".to_string()]);

        // A brand-new session filters the persisted summary identically.
        let mut fresh = HistoryFilter::new(IndicatorConfig::default());
        let matched = fresh
            .filter_by_text(&store, "close > y_close and rsi < 40")
            .unwrap();
        assert_eq!(matched.symbols(), &["rising".to_string()]);

        let summary = store.load().unwrap();
        let close = summary.value(0, "close").unwrap().as_number().unwrap();
        let y_close = summary.value(0, "y_close").unwrap().as_number().unwrap();
        assert_relative_eq!((close - y_close).abs(), 5.0);
    }

    #[test]
    fn filter_without_summary_is_hard_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = CsvSummaryStore::new(dir.path().join("summary.csv"));
        let mut session = HistoryFilter::new(IndicatorConfig::default());
        let err = session.filter_by_text(&store, "close > 0").unwrap_err();
        assert!(matches!(err, TsefilterError::SummaryMissing { .. }));
    }

    #[test]
    fn csv_series_feed_end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("alpha.csv"),
            "date,close,rsi\nd1,90,30\nd2,100,35\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("beta.csv"),
            "date,close,rsi\nd1,100,80\nd2,90,85\n",
        )
        .unwrap();
        let provider = CsvDataAdapter::new(dir.path().to_path_buf());
        let store = CsvSummaryStore::new(dir.path().join("summary.csv"));

        let mut session = HistoryFilter::new(IndicatorConfig::default());
        let symbols = provider.list_symbols().unwrap();
        assert_eq!(symbols, vec!["alpha".to_string(), "beta".to_string()]);

        session.download_summary(&provider, &store, &symbols).unwrap();
        let matched = session.filter_by_text(&store, "rsi < 40").unwrap();
        assert_eq!(matched.symbols(), &["alpha".to_string()]);
    }

    #[test]
    fn configured_column_flows_into_summary_and_filter() {
        let mut config = IndicatorConfig::default();
        config.indicators.push(IndicatorSpec::SingleOutput {
            name: "foo".to_string(),
            columns: vec!["foo".to_string()],
            params: Default::default(),
        });

        let mut series = tsefilter::domain::table::Table::new(vec!["close".into(), "foo".into()]);
        series
            .push_row("p0".into(), vec![num(1.0), num(10.0)])
            .unwrap();
        series
            .push_row("p1".into(), vec![num(2.0), num(20.0)])
            .unwrap();
        let provider = MockProvider::new().with_series("aaa", series);

        let dir = tempfile::TempDir::new().unwrap();
        let store = CsvSummaryStore::new(dir.path().join("summary.csv"));
        let mut session = HistoryFilter::new(config);
        session
            .download_summary(&provider, &store, &["aaa".to_string()])
            .unwrap();

        let matched = session.filter_by_text(&store, "foo > y_foo").unwrap();
        assert_eq!(matched.symbols(), &["aaa".to_string()]);
        let none = session.filter_by_text(&store, "foo < y_foo").unwrap();
        assert!(none.is_empty());
    }
}

mod condition_persistence {
    use super::*;

    #[test]
    fn saved_condition_selects_identical_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cond.txt");
        let schema = Schema::realtime();
        let snapshot = sample_snapshot();

        let original = Condition::new("PL > 100 AND tvol > 100 OR power > 2", &schema).unwrap();
        let before = condition_eval::apply(&snapshot, &original).unwrap();
        original.save(&path).unwrap();

        let reloaded = Condition::from_file(&path, &schema).unwrap();
        let after = condition_eval::apply(&snapshot, &reloaded).unwrap();
        assert_eq!(before.symbols(), after.symbols());
    }
}

proptest! {
    /// An arbitrary finite threshold partitions rows exactly as the native
    /// comparison does.
    #[test]
    fn threshold_matches_native_comparison(
        value in -1e12f64..1e12,
        threshold in -1e12f64..1e12,
    ) {
        let schema = Schema::realtime();
        let condition = Condition::new(&format!("pl > {threshold}"), &schema).unwrap();
        let t = table(&["pl"], &[("row", vec![num(value)])]);
        let matched = condition_eval::apply(&t, &condition).unwrap();
        prop_assert_eq!(matched.len(), usize::from(value > threshold));
    }

    /// Any column drawn from the realtime schema validates with the
    /// universal bound.
    #[test]
    fn any_numeric_realtime_column_validates(index in 0usize..77) {
        let schema = Schema::realtime();
        let column = &schema.columns()[index];
        let validation = schema.validation_table();
        prop_assume!(validation.value(0, column).unwrap().as_number().is_some());
        let condition = Condition::new(&format!("{column} > -1e18"), &schema).unwrap();
        let matched = condition_eval::apply(&validation, &condition).unwrap();
        prop_assert_eq!(matched.len(), 1);
    }
}
