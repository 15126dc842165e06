//! Conversion of raw chart records into canonical [`ChartSpec`]s.
//!
//! This is the only place raw, shape-unknown chart payloads are inspected.
//! Malformed records never fail: they become the "data unavailable"
//! placeholder with a [`ChartValidationFailure`] reason.

use log::debug;
use serde_json::Value;

use super::raw::{
    as_label, as_number, as_string_list, RawChart, CATEGORY_ALIASES, ID_ALIASES,
    INSIGHT_ALIASES, MAX_ALIASES, PLOT_TYPE_ALIASES, SERIES_ALIASES, STATUS_ALIASES,
    TITLE_ALIASES, UNIT_ALIASES, VALUE_ALIASES,
};
use super::spec::{
    ChartSeries, ChartSpec, ChartStatus, ChartValidationFailure, NamedSeries, Orientation,
    PlotType,
};

/// Gauge maximum used when the record does not carry one.
pub const DEFAULT_GAUGE_MAX: f64 = 100.0;

/// Validates a categorical pair: both non-empty and of equal length.
pub fn validate_categorical(
    categories: &[String],
    values: &[f64],
) -> Result<(), ChartValidationFailure> {
    if categories.is_empty() || values.is_empty() {
        return Err(ChartValidationFailure::EmptySeries);
    }
    if categories.len() != values.len() {
        return Err(ChartValidationFailure::LengthMismatch {
            categories: categories.len(),
            values: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ChartValidationFailure::NonNumericValue);
    }
    Ok(())
}

fn read_labels(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(items.iter().map(|v| as_label(v).unwrap_or_default()).collect())
}

fn read_numbers(items: &[Value]) -> Result<Vec<f64>, ChartValidationFailure> {
    items
        .iter()
        .map(|v| as_number(v).ok_or(ChartValidationFailure::NonNumericValue))
        .collect()
}

/// Normalizes one raw chart. `index` is the chart's position in its payload
/// and names charts that arrive without an id.
pub fn normalize(raw: &RawChart, index: usize) -> ChartSpec {
    let id = raw
        .lookup_str(ID_ALIASES)
        .unwrap_or_else(|| format!("chart_{}", index));
    let title = raw
        .lookup_str(TITLE_ALIASES)
        .unwrap_or_else(|| format!("Chart {}", index + 1));
    let hint = raw
        .lookup_str(PLOT_TYPE_ALIASES)
        .and_then(|h| PlotType::from_hint(&h));
    let explicit_status = raw
        .lookup_str(STATUS_ALIASES)
        .and_then(|s| ChartStatus::parse(&s));
    let insights = raw
        .lookup(INSIGHT_ALIASES)
        .map(as_string_list)
        .unwrap_or_default();

    let mut spec = ChartSpec {
        id,
        title,
        plot_type: PlotType::Placeholder,
        orientation: Orientation::Vertical,
        series: ChartSeries::Unavailable {
            reason: ChartValidationFailure::NoData,
        },
        status: explicit_status.unwrap_or_default(),
        insights,
        source_id: None,
    };

    if raw.as_object().is_none() {
        spec.series = ChartSeries::Unavailable {
            reason: ChartValidationFailure::NotAnObject,
        };
        return spec;
    }

    let categories = raw.lookup_where(CATEGORY_ALIASES, Value::is_array);
    let value_array = raw.lookup_where(VALUE_ALIASES, Value::is_array);

    match (categories, value_array) {
        (Some(categories), Some(values)) => {
            let (plot_type, orientation) = match hint {
                Some((plot_type, orientation)) if plot_type.is_categorical() => {
                    (plot_type, orientation.unwrap_or_default())
                }
                _ => (PlotType::Pie, Orientation::Vertical),
            };
            spec.plot_type = plot_type;
            spec.orientation = orientation;
            spec.series = categorical_series(categories, values);
        }
        (categories, values) => {
            if let Some(series) = multi_series(raw, categories) {
                let (plot_type, orientation) = match hint {
                    Some((PlotType::Bar, orientation)) => {
                        (PlotType::Bar, orientation.unwrap_or_default())
                    }
                    _ => (PlotType::Line, Orientation::Vertical),
                };
                spec.plot_type = plot_type;
                spec.orientation = orientation;
                spec.series = series;
            } else if let Some(value) = raw
                .lookup_where(VALUE_ALIASES, |v| !v.is_array() && !v.is_null())
                .and_then(as_number)
            {
                spec.plot_type = PlotType::Gauge;
                spec.series = gauge_series(raw, value);
                if explicit_status.is_none() {
                    if let ChartSeries::Gauge {
                        value, max_value, ..
                    } = spec.series
                    {
                        spec.status = ChartStatus::from_ratio(value / max_value);
                    }
                }
            } else {
                let reason = if categories.is_some() || values.is_some() {
                    ChartValidationFailure::MissingPair
                } else {
                    ChartValidationFailure::NoData
                };
                spec.series = ChartSeries::Unavailable { reason };
            }
        }
    }

    // A chart that failed validation never keeps a drawable encoding.
    if let ChartSeries::Unavailable { reason } = &spec.series {
        debug!("Chart '{}' is unavailable: {}", spec.id, reason);
        spec.plot_type = PlotType::Placeholder;
        spec.orientation = Orientation::Vertical;
    }

    spec
}

fn categorical_series(categories: &Value, values: &Value) -> ChartSeries {
    let labels = read_labels(categories).unwrap_or_default();
    let numbers = match values.as_array().map(|items| read_numbers(items)) {
        Some(Ok(numbers)) => numbers,
        Some(Err(reason)) => return ChartSeries::Unavailable { reason },
        None => Vec::new(),
    };

    match validate_categorical(&labels, &numbers) {
        Ok(()) => ChartSeries::Categorical {
            categories: labels,
            values: numbers,
        },
        Err(reason) => ChartSeries::Unavailable { reason },
    }
}

/// Reads a `series` map of equal-length numeric arrays. Returns `None` when
/// the record has no usable map so the caller can try other shapes.
fn multi_series(raw: &RawChart, categories: Option<&Value>) -> Option<ChartSeries> {
    let map = raw.lookup(SERIES_ALIASES)?.as_object()?;
    if map.is_empty() {
        return None;
    }

    let mut series = Vec::with_capacity(map.len());
    for (name, values) in map {
        let numbers = read_numbers(values.as_array()?).ok()?;
        series.push(NamedSeries {
            name: name.clone(),
            values: numbers,
        });
    }
    series.sort_by(|a, b| a.name.cmp(&b.name));

    let len = series[0].values.len();
    if len == 0 {
        return Some(ChartSeries::Unavailable {
            reason: ChartValidationFailure::EmptySeries,
        });
    }
    if let Some(bad) = series.iter().find(|s| s.values.len() != len) {
        return Some(ChartSeries::Unavailable {
            reason: ChartValidationFailure::LengthMismatch {
                categories: len,
                values: bad.values.len(),
            },
        });
    }

    let categories = match categories.and_then(read_labels) {
        Some(labels) if labels.len() == len => labels,
        Some(labels) => {
            return Some(ChartSeries::Unavailable {
                reason: ChartValidationFailure::LengthMismatch {
                    categories: labels.len(),
                    values: len,
                },
            })
        }
        None => (1..=len).map(|i| i.to_string()).collect(),
    };

    Some(ChartSeries::MultiSeries { categories, series })
}

fn gauge_series(raw: &RawChart, value: f64) -> ChartSeries {
    let max_value = match raw.lookup(MAX_ALIASES) {
        Some(max) => match as_number(max) {
            Some(max) => max,
            None => {
                return ChartSeries::Unavailable {
                    reason: ChartValidationFailure::InvalidGauge,
                }
            }
        },
        None => DEFAULT_GAUGE_MAX,
    };

    if max_value <= 0.0 {
        return ChartSeries::Unavailable {
            reason: ChartValidationFailure::InvalidGauge,
        };
    }

    let unit = raw.lookup_str(UNIT_ALIASES).unwrap_or_default();
    ChartSeries::Gauge {
        value,
        max_value,
        unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(value: Value) -> ChartSpec {
        normalize(&RawChart::new(value), 0)
    }

    #[test]
    fn test_category_value_pair_becomes_pie() {
        let spec = norm(json!({"id": "x", "category": ["A", "B"], "value": [3, 7]}));
        assert_eq!(spec.plot_type, PlotType::Pie);
        assert_eq!(
            spec.series,
            ChartSeries::Categorical {
                categories: vec!["A".into(), "B".into()],
                values: vec![3.0, 7.0],
            }
        );
    }

    #[test]
    fn test_length_mismatch_is_unavailable() {
        let spec = norm(json!({"id": "x", "category": ["A", "B"], "value": [3]}));
        assert!(!spec.is_available());
        assert_eq!(spec.plot_type, PlotType::Placeholder);
        assert_eq!(
            spec.series,
            ChartSeries::Unavailable {
                reason: ChartValidationFailure::LengthMismatch {
                    categories: 2,
                    values: 1
                }
            }
        );
    }

    #[test]
    fn test_scalar_value_becomes_gauge() {
        let spec = norm(json!({"title": "Score", "value": "72", "max_value": 80, "unit": "pts"}));
        assert_eq!(spec.plot_type, PlotType::Gauge);
        assert_eq!(
            spec.series,
            ChartSeries::Gauge {
                value: 72.0,
                max_value: 80.0,
                unit: "pts".into()
            }
        );
        assert_eq!(spec.status, ChartStatus::Excellent);
        assert_eq!(spec.id, "chart_0");
    }

    #[test]
    fn test_explicit_status_wins_over_ratio() {
        let spec = norm(json!({"value": 95, "status": "attention_needed"}));
        assert_eq!(spec.status, ChartStatus::AttentionNeeded);
    }

    #[test]
    fn test_hint_applies_to_categorical() {
        let spec = norm(json!({"type": "hbar", "labels": ["a"], "values": [1]}));
        assert_eq!(spec.plot_type, PlotType::Bar);
        assert_eq!(spec.orientation, Orientation::Horizontal);
    }

    #[test]
    fn test_non_numeric_values_are_unavailable() {
        let spec = norm(json!({"labels": ["a", "b"], "values": [1, "lots"]}));
        assert_eq!(
            spec.series,
            ChartSeries::Unavailable {
                reason: ChartValidationFailure::NonNumericValue
            }
        );
    }

    #[test]
    fn test_hinted_bar_with_bad_values_is_placeholder() {
        let spec = norm(json!({"type": "hbar", "labels": ["a", "b"], "values": [1, "x"]}));
        assert_eq!(spec.plot_type, PlotType::Placeholder);
        assert_eq!(spec.orientation, Orientation::Vertical);
    }

    #[test]
    fn test_gauge_with_zero_max_is_placeholder() {
        let spec = norm(json!({"value": 5, "max_value": 0}));
        assert_eq!(spec.plot_type, PlotType::Placeholder);
    }

    #[test]
    fn test_non_object_record() {
        let spec = norm(json!("pie"));
        assert_eq!(
            spec.series,
            ChartSeries::Unavailable {
                reason: ChartValidationFailure::NotAnObject
            }
        );
    }

    #[test]
    fn test_only_one_array_is_missing_pair() {
        let spec = norm(json!({"labels": ["a", "b"]}));
        assert_eq!(
            spec.series,
            ChartSeries::Unavailable {
                reason: ChartValidationFailure::MissingPair
            }
        );
    }
}
