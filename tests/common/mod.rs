//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use tsefilter::domain::error::TsefilterError;
use tsefilter::domain::table::{Table, Value};
use tsefilter::ports::data_port::TableProvider;

/// In-memory table provider: a snapshot plus per-symbol series.
pub struct MockProvider {
    pub realtime: Option<Table>,
    pub series: HashMap<String, Table>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            realtime: None,
            series: HashMap::new(),
        }
    }

    pub fn with_realtime(mut self, table: Table) -> Self {
        self.realtime = Some(table);
        self
    }

    pub fn with_series(mut self, symbol: &str, table: Table) -> Self {
        self.series.insert(symbol.to_string(), table);
        self
    }
}

impl TableProvider for MockProvider {
    fn fetch_realtime(&self) -> Option<Table> {
        self.realtime.clone()
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

pub fn num(v: f64) -> Value {
    Value::Number(v)
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Build a table from column names and `(symbol, values)` rows.
pub fn table(columns: &[&str], rows: &[(&str, Vec<Value>)]) -> Table {
    let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
    for (symbol, values) in rows {
        t.push_row(symbol.to_string(), values.clone()).unwrap();
    }
    t
}

/// A small realtime-shaped snapshot with symbol, price and demand columns.
pub fn sample_snapshot() -> Table {
    table(
        &["symbol", "pl", "tvol", "power"],
        &[
            ("weak", vec![text("weak"), num(50.0), num(1000.0), num(0.5)]),
            (
                "strong",
                vec![text("strong"), num(150.0), num(9000.0), num(3.2)],
            ),
            ("thin", vec![text("thin"), num(200.0), num(10.0), num(2.1)]),
        ],
    )
}

/// An ascending close series with an rsi column, oldest first.
pub fn sample_series(closes: &[f64], rsi: f64) -> Table {
    let mut t = Table::new(vec!["close".into(), "rsi".into()]);
    for (i, close) in closes.iter().enumerate() {
        t.push_row(format!("p{i}"), vec![num(*close), num(rsi)])
            .unwrap();
    }
    t
}
