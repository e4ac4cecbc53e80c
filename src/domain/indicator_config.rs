//! Declarative indicator configuration.
//!
//! The history schema is generated from this configuration: each entry
//! contributes one or more named output columns. The numeric computation of
//! those columns happens behind the [`TableProvider`] boundary — the core
//! only ever reads the column names and the parameters' magnitudes (to size
//! the fetch window).
//!
//! [`TableProvider`]: crate::ports::data_port::TableProvider

use crate::domain::error::TsefilterError;
use crate::ports::config_port::ConfigPort;
use std::collections::BTreeMap;

/// One configured indicator and the columns it emits.
///
/// Most indicators emit columns aligned with the bar they are computed on.
/// The split-horizon variant (the Ichimoku cloud in the default set) also
/// emits columns that are plotted ahead of the current bar; those are kept
/// separate so a summarizer can treat the horizons differently.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorSpec {
    SingleOutput {
        name: String,
        columns: Vec<String>,
        params: BTreeMap<String, f64>,
    },
    SplitHorizon {
        name: String,
        current_columns: Vec<String>,
        future_columns: Vec<String>,
        params: BTreeMap<String, f64>,
    },
}

impl IndicatorSpec {
    pub fn name(&self) -> &str {
        match self {
            IndicatorSpec::SingleOutput { name, .. } => name,
            IndicatorSpec::SplitHorizon { name, .. } => name,
        }
    }

    /// All output column names, current horizon first.
    pub fn output_columns(&self) -> Vec<&str> {
        match self {
            IndicatorSpec::SingleOutput { columns, .. } => {
                columns.iter().map(String::as_str).collect()
            }
            IndicatorSpec::SplitHorizon {
                current_columns,
                future_columns,
                ..
            } => current_columns
                .iter()
                .chain(future_columns.iter())
                .map(String::as_str)
                .collect(),
        }
    }

    fn params(&self) -> &BTreeMap<String, f64> {
        match self {
            IndicatorSpec::SingleOutput { params, .. } => params,
            IndicatorSpec::SplitHorizon { params, .. } => params,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingMethod {
    Mean,
    Sum,
}

/// A rolling reduction over one of the derived client-flow metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingMetric {
    pub column: String,
    pub source: String,
    pub method: RollingMethod,
    pub period: usize,
}

/// Client-flow metrics derived per row before any rolling reduction.
pub const DERIVED_CLIENT_COLUMNS: [&str; 4] = [
    "buy_per_capita",
    "sell_per_capita",
    "power_of_demand",
    "individual_money_flow",
];

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub indicators: Vec<IndicatorSpec>,
    pub rolling: Vec<RollingMetric>,
}

fn single(name: &str, columns: &[&str], params: &[(&str, f64)]) -> IndicatorSpec {
    IndicatorSpec::SingleOutput {
        name: name.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        params: params
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
    }
}

impl Default for IndicatorConfig {
    /// The built-in indicator set: oscillators, moving averages, channel
    /// indicators and rolling extrema, matching the stock screener's
    /// shipped configuration.
    fn default() -> Self {
        let indicators = vec![
            single("rsi", &["rsi"], &[("length", 14.0)]),
            single(
                "macd",
                &["macd", "histogram", "signal"],
                &[("fast", 12.0), ("slow", 26.0), ("signal", 9.0)],
            ),
            single(
                "stoch",
                &["k", "d"],
                &[("k", 5.0), ("d", 3.0), ("smooth_k", 3.0)],
            ),
            single("mfi", &["mfi"], &[("length", 14.0), ("drift", 1.0)]),
            single("sma", &["sma50"], &[("length", 50.0)]),
            single("sma", &["sma21"], &[("length", 21.0)]),
            single("ema", &["ema21"], &[("length", 21.0)]),
            single(
                "stochrsi",
                &["rsi_k", "rsi_d"],
                &[
                    ("length", 14.0),
                    ("rsi_length", 14.0),
                    ("k", 3.0),
                    ("d", 3.0),
                ],
            ),
            single(
                "bbands",
                &[
                    "lower_band",
                    "mid_band",
                    "upper_band",
                    "band_width",
                    "band_percent",
                ],
                &[("length", 5.0), ("std", 2.0)],
            ),
            IndicatorSpec::SplitHorizon {
                name: "ichimoku".to_string(),
                current_columns: vec![
                    "spana".to_string(),
                    "spanb".to_string(),
                    "tenkan".to_string(),
                    "kijun".to_string(),
                ],
                future_columns: vec!["future_spana".to_string(), "future_spanb".to_string()],
                params: [
                    ("tenkan".to_string(), 9.0),
                    ("kijun".to_string(), 26.0),
                    ("senkou".to_string(), 52.0),
                ]
                .into_iter()
                .collect(),
            },
            single(
                "max",
                &["highest21", "dis_from_highest21"],
                &[("period", 21.0)],
            ),
            single(
                "max",
                &["highest63", "dis_from_highest63"],
                &[("period", 63.0)],
            ),
            single(
                "min",
                &["lowest21", "dis_from_lowest21"],
                &[("period", 21.0)],
            ),
            single(
                "min",
                &["lowest63", "dis_from_lowest63"],
                &[("period", 63.0)],
            ),
        ];

        let rolling = vec![
            RollingMetric {
                column: "buy_per_capita_avg10".to_string(),
                source: "buy_per_capita".to_string(),
                method: RollingMethod::Mean,
                period: 10,
            },
            RollingMetric {
                column: "sell_per_capita_avg10".to_string(),
                source: "sell_per_capita".to_string(),
                method: RollingMethod::Mean,
                period: 10,
            },
            RollingMetric {
                column: "power_avg10".to_string(),
                source: "power_of_demand".to_string(),
                method: RollingMethod::Mean,
                period: 10,
            },
            RollingMetric {
                column: "money_flow_total10".to_string(),
                source: "individual_money_flow".to_string(),
                method: RollingMethod::Sum,
                period: 10,
            },
        ];

        Self {
            indicators,
            rolling,
        }
    }
}

impl IndicatorConfig {
    /// Every derived column the history schema gains from this config, in
    /// declaration order: indicator outputs, per-row client metrics, then
    /// rolling client metrics.
    pub fn derived_columns(&self) -> Vec<String> {
        let mut out = Vec::new();
        for spec in &self.indicators {
            for col in spec.output_columns() {
                out.push(col.to_string());
            }
        }
        for col in DERIVED_CLIENT_COLUMNS {
            out.push(col.to_string());
        }
        for metric in &self.rolling {
            out.push(metric.column.clone());
        }
        out
    }

    /// How many periods of history a provider must supply so every
    /// configured indicator has a full warm-up window: the largest numeric
    /// parameter anywhere in the config, floored at 100, plus 100 slack.
    pub fn length_hint(&self) -> usize {
        let mut max = 100.0f64;
        for spec in &self.indicators {
            for value in spec.params().values() {
                if *value > max {
                    max = *value;
                }
            }
        }
        for metric in &self.rolling {
            if metric.period as f64 > max {
                max = metric.period as f64;
            }
        }
        max as usize + 100
    }

    /// Load a configuration from an INI-backed [`ConfigPort`].
    ///
    /// One section per indicator: a required `columns` list, an optional
    /// `future_columns` list (which makes the entry split-horizon), and any
    /// further numeric keys as parameters. Sections named
    /// `rolling.<column>` declare rolling client metrics with `source`,
    /// `method` (`mean`/`sum`) and `period` keys. Sections and keys are
    /// processed in sorted order so the resulting schema is deterministic
    /// regardless of file layout.
    pub fn from_config(cfg: &dyn ConfigPort) -> Result<Self, TsefilterError> {
        let mut sections = cfg.sections();
        sections.sort();

        let mut indicators = Vec::new();
        let mut rolling = Vec::new();

        for section in &sections {
            if let Some(column) = section.strip_prefix("rolling.") {
                rolling.push(parse_rolling(cfg, section, column)?);
            } else {
                indicators.push(parse_indicator(cfg, section)?);
            }
        }

        Ok(Self {
            indicators,
            rolling,
        })
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_indicator(cfg: &dyn ConfigPort, section: &str) -> Result<IndicatorSpec, TsefilterError> {
    let columns = cfg
        .get_string(section, "columns")
        .map(|raw| parse_list(&raw))
        .filter(|cols| !cols.is_empty())
        .ok_or_else(|| TsefilterError::ConfigInvalid {
            section: section.to_string(),
            key: "columns".to_string(),
            reason: "missing or empty column list".to_string(),
        })?;
    let future_columns = cfg
        .get_string(section, "future_columns")
        .map(|raw| parse_list(&raw));

    let mut params = BTreeMap::new();
    let mut keys = cfg.keys(section);
    keys.sort();
    for key in keys {
        if key == "columns" || key == "future_columns" {
            continue;
        }
        let raw = cfg.get_string(section, &key).unwrap_or_default();
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| TsefilterError::ConfigInvalid {
                section: section.to_string(),
                key: key.clone(),
                reason: format!("expected a number, got '{}'", raw),
            })?;
        params.insert(key, value);
    }

    Ok(match future_columns {
        Some(future) if !future.is_empty() => IndicatorSpec::SplitHorizon {
            name: section.to_string(),
            current_columns: columns,
            future_columns: future,
            params,
        },
        _ => IndicatorSpec::SingleOutput {
            name: section.to_string(),
            columns,
            params,
        },
    })
}

fn parse_rolling(
    cfg: &dyn ConfigPort,
    section: &str,
    column: &str,
) -> Result<RollingMetric, TsefilterError> {
    let source =
        cfg.get_string(section, "source")
            .ok_or_else(|| TsefilterError::ConfigInvalid {
                section: section.to_string(),
                key: "source".to_string(),
                reason: "missing source column".to_string(),
            })?;
    let method = match cfg.get_string(section, "method").as_deref() {
        Some("mean") => RollingMethod::Mean,
        Some("sum") => RollingMethod::Sum,
        other => {
            return Err(TsefilterError::ConfigInvalid {
                section: section.to_string(),
                key: "method".to_string(),
                reason: format!("expected mean or sum, got '{}'", other.unwrap_or("")),
            });
        }
    };
    let period = cfg.get_int(section, "period", 0);
    if period <= 0 {
        return Err(TsefilterError::ConfigInvalid {
            section: section.to_string(),
            key: "period".to_string(),
            reason: "period must be a positive integer".to_string(),
        });
    }
    Ok(RollingMetric {
        column: column.to_string(),
        source,
        method,
        period: period as usize,
    })
}
