//! Loosely-typed chart records as produced by the analysis engine, and the
//! alias table used to read them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names for category labels, highest precedence first.
pub const CATEGORY_ALIASES: &[&str] = &["categories", "labels", "label", "category"];
/// Field names for numeric values (array or scalar), highest precedence first.
pub const VALUE_ALIASES: &[&str] = &["values", "value"];
/// Field names for a `name -> numbers` multi-series map.
pub const SERIES_ALIASES: &[&str] = &["series"];
/// Field names for the plot-type hint.
pub const PLOT_TYPE_ALIASES: &[&str] = &["plot_type", "plotType", "chart_type", "type"];
/// Field names for a gauge maximum.
pub const MAX_ALIASES: &[&str] = &["max_value", "maxValue", "max"];
pub const TITLE_ALIASES: &[&str] = &["title", "name"];
pub const ID_ALIASES: &[&str] = &["id", "chart_id", "chartId"];
pub const UNIT_ALIASES: &[&str] = &["unit", "units"];
pub const STATUS_ALIASES: &[&str] = &["status"];
pub const INSIGHT_ALIASES: &[&str] = &["insights", "insight"];

/// Nested object searched after the record itself.
const DATA_SCOPE: &str = "data";

/// A raw chart record exactly as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawChart(pub Value);

impl RawChart {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// Scopes searched for fields, in precedence order: the record, then its
    /// `data` object when present.
    fn scopes(&self) -> Vec<&Map<String, Value>> {
        let mut scopes = Vec::with_capacity(2);
        if let Some(root) = self.as_object() {
            scopes.push(root);
            if let Some(Value::Object(data)) = root.get(DATA_SCOPE) {
                scopes.push(data);
            }
        }
        scopes
    }

    /// First non-null value for any alias, scanning scopes in order and
    /// aliases in order within each scope.
    pub fn lookup(&self, aliases: &[&str]) -> Option<&Value> {
        self.scopes().into_iter().find_map(|scope| {
            aliases
                .iter()
                .find_map(|alias| scope.get(*alias).filter(|v| !v.is_null()))
        })
    }

    /// First value for any alias that satisfies `accept`.
    pub fn lookup_where(&self, aliases: &[&str], accept: impl Fn(&Value) -> bool) -> Option<&Value> {
        self.scopes().into_iter().find_map(|scope| {
            aliases
                .iter()
                .find_map(|alias| scope.get(*alias).filter(|v| accept(v)))
        })
    }

    pub fn lookup_str(&self, aliases: &[&str]) -> Option<String> {
        match self.lookup(aliases)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Reads a JSON value as a finite number; numeric strings count.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Reads a JSON value as a category label.
pub fn as_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a list of strings from either an array or a single string.
pub fn as_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_prefers_root_then_alias_order() {
        let raw = RawChart::new(json!({
            "label": ["from-label"],
            "labels": ["from-labels"],
            "data": {"categories": ["from-data"]}
        }));
        // "labels" outranks "label" within the root scope, and the root scope
        // outranks the nested data scope.
        assert_eq!(raw.lookup(CATEGORY_ALIASES), Some(&json!(["from-labels"])));
    }

    #[test]
    fn test_lookup_falls_back_to_data_scope() {
        let raw = RawChart::new(json!({"title": "T", "data": {"value": [1, 2]}}));
        assert_eq!(raw.lookup(VALUE_ALIASES), Some(&json!([1, 2])));
    }

    #[test]
    fn test_lookup_skips_nulls() {
        let raw = RawChart::new(json!({"values": null, "value": 5}));
        assert_eq!(raw.lookup(VALUE_ALIASES), Some(&json!(5)));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(&json!(4)), Some(4.0));
        assert_eq!(as_number(&json!("72.5%")), Some(72.5));
        assert_eq!(as_number(&json!("n/a")), None);
        assert_eq!(as_number(&json!(null)), None);
    }

    #[test]
    fn test_string_list() {
        assert_eq!(as_string_list(&json!(["a", " ", "b"])), vec!["a", "b"]);
        assert_eq!(as_string_list(&json!("single")), vec!["single"]);
        assert!(as_string_list(&json!(3)).is_empty());
    }
}
