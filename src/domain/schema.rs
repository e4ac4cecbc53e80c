//! Schema registry for the two table kinds.
//!
//! A [`Schema`] is the authoritative ordered column set for one table kind,
//! together with a one-row synthetic validation table used to dry-run
//! compiled conditions before they ever touch real data. The realtime
//! schema is fixed; the history schema is derived from an
//! [`IndicatorConfig`] and rebuilt from scratch on every call, so edits to
//! the configuration can never be masked by a stale cache.

use crate::domain::indicator_config::IndicatorConfig;
use crate::domain::table::{Table, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Realtime,
    History,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::Realtime => write!(f, "realtime"),
            TableKind::History => write!(f, "history"),
        }
    }
}

/// Prefix marking the prior-period half of the history schema.
pub const LAG_PREFIX: &str = "y_";

/// Realtime snapshot columns: identity, price levels, thresholds, percent
/// changes, client-type flow, and depth-of-book zones 1 through 5.
const REALTIME_COLUMNS: [&str; 77] = [
    "code",
    "symbol",
    "name",
    "pf",
    "pmin",
    "pmax",
    "pl",
    "pc",
    "py",
    "tno",
    "tvol",
    "tval",
    "eps",
    "bvol",
    "tmax",
    "tmin",
    "plp",
    "pcp",
    "pfp",
    "pminp",
    "pmaxp",
    "tminp",
    "tmaxp",
    "z",
    "buy_i_count",
    "buy_n_count",
    "buy_i_volume",
    "buy_n_volume",
    "sell_i_count",
    "sell_n_count",
    "sell_i_volume",
    "sell_n_volume",
    "buy_i_value",
    "sell_i_value",
    "buy_n_value",
    "sell_n_value",
    "buy_per_capita",
    "sell_per_capita",
    "power",
    "volume",
    "ind_buy_ratio",
    "ind_sell_ratio",
    "cor_buy_ratio",
    "cor_sell_ratio",
    "money_flow",
    "d1_value",
    "o1_value",
    "zo1",
    "zd1",
    "pd1",
    "po1",
    "qd1",
    "qo1",
    "zo2",
    "zd2",
    "pd2",
    "po2",
    "qd2",
    "qo2",
    "zo3",
    "zd3",
    "pd3",
    "po3",
    "qd3",
    "qo3",
    "zo4",
    "zd4",
    "pd4",
    "po4",
    "qd4",
    "qo4",
    "zo5",
    "zd5",
    "pd5",
    "po5",
    "qd5",
    "qo5",
];

/// Base per-period history columns as delivered by the provider, before
/// indicator and client-metric expansion.
const HISTORY_BASE_COLUMNS: [&str; 23] = [
    "date",
    "open",
    "low",
    "high",
    "close",
    "adj_close",
    "volume",
    "value",
    "count",
    "yesterday_adj_close",
    "inscode",
    "buy_i_volume",
    "buy_n_volume",
    "buy_i_value",
    "buy_n_value",
    "buy_n_count",
    "sell_i_volume",
    "buy_i_count",
    "sell_n_volume",
    "sell_i_value",
    "sell_n_value",
    "sell_n_count",
    "sell_i_count",
];

/// Columns that hold text rather than numbers. Their validation placeholder
/// is the string `"1"`; every other column gets numeric `1`.
const TEXT_COLUMNS: [&str; 5] = ["code", "symbol", "name", "date", "inscode"];

fn is_text_column(name: &str) -> bool {
    let base = name.strip_prefix(LAG_PREFIX).unwrap_or(name);
    TEXT_COLUMNS.contains(&base)
}

#[derive(Debug, Clone)]
pub struct Schema {
    kind: TableKind,
    columns: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl Schema {
    fn build(kind: TableKind, columns: Vec<String>) -> Self {
        let lookup = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            kind,
            columns,
            lookup,
        }
    }

    /// The fixed cross-sectional snapshot schema.
    pub fn realtime() -> Self {
        Self::build(
            TableKind::Realtime,
            REALTIME_COLUMNS.iter().map(|c| c.to_string()).collect(),
        )
    }

    /// The per-instrument summary schema: base columns plus every column
    /// the configuration derives, then the whole set again under the lag
    /// prefix. Recomputed on every call.
    pub fn history(config: &IndicatorConfig) -> Self {
        let mut current: Vec<String> = HISTORY_BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect();
        current.extend(config.derived_columns());

        let mut columns = current.clone();
        columns.extend(current.iter().map(|c| format!("{LAG_PREFIX}{c}")));
        Self::build(TableKind::History, columns)
    }

    pub fn for_kind(kind: TableKind, config: &IndicatorConfig) -> Self {
        match kind {
            TableKind::Realtime => Self::realtime(),
            TableKind::History => Self::history(config),
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.lookup.contains_key(column)
    }

    /// One-row table with a type-appropriate placeholder in every column,
    /// for dry-running compiled predicates.
    pub fn validation_table(&self) -> Table {
        let mut table = Table::new(self.columns.clone());
        let row = self
            .columns
            .iter()
            .map(|c| {
                if is_text_column(c) {
                    Value::Text("1".to_string())
                } else {
                    Value::Number(1.0)
                }
            })
            .collect();
        // A single synthetic row can never collide or mis-shape.
        table
            .push_row("validation".to_string(), row)
            .expect("validation row matches its own schema");
        table
    }
}
