//! Decoding of API payloads that arrive either as JSON values or as
//! JSON-encoded strings.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::error::{ClientError, Result};

/// Unwraps `{ "success": ..., "data": ... }` envelopes. Objects without a
/// `success` flag are returned unchanged so `{ data, total }` pages survive.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Parses a string that holds JSON; any other value is returned as is.
pub fn parse_embedded(value: Value) -> Result<Value> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(ClientError::Decode("empty JSON string".to_string()));
            }
            serde_json::from_str(trimmed).map_err(|e| {
                ClientError::Decode(format!("malformed embedded JSON: {}", e))
            })
        }
        other => Ok(other),
    }
}

/// Decodes a response payload into `T`, accepting a parsed object, a JSON
/// string, or either of them wrapped in a success envelope.
pub fn decode_payload<T: DeserializeOwned>(value: Value) -> Result<T> {
    let value = parse_embedded(unwrap_envelope(value))?;
    let value = parse_embedded(value)?;
    serde_json::from_value(value).map_err(ClientError::from)
}

/// Serde helper for record fields that may be stored as JSON strings.
/// `null` and missing values become `T::default()`.
pub fn deserialize_lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(T::default()),
        Value::String(ref s) if s.trim().is_empty() => Ok(T::default()),
        other => {
            let parsed = parse_embedded(other).map_err(D::Error::custom)?;
            if parsed.is_null() {
                return Ok(T::default());
            }
            serde_json::from_value(parsed).map_err(D::Error::custom)
        }
    }
}

/// Serde helper for scalar fields the server sometimes sends as `null`.
/// `null` becomes `T::default()`; anything else decodes normally.
pub fn deserialize_null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::types::JobListPage;
    use serde_json::json;

    #[test]
    fn test_decode_object() {
        let page: JobListPage = decode_payload(json!({"data": [], "total": 3})).unwrap();
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_decode_json_string() {
        let page: JobListPage =
            decode_payload(json!(r#"{"data": [{"id": 1, "processingStatus": "queued"}], "total": 1}"#))
                .unwrap();
        assert_eq!(page.data.len(), 1);
    }

    #[test]
    fn test_decode_envelope_with_string_data() {
        let charts: Vec<Value> =
            decode_payload(json!({"success": true, "data": "[{\"title\": \"A\"}]"})).unwrap();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0]["title"], "A");
    }

    #[test]
    fn test_decode_malformed_string_fails() {
        let result: Result<Vec<Value>> = decode_payload(json!("[{\"title\": "));
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_lenient_field() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_lenient")]
            items: Vec<u32>,
        }

        let from_string: Holder = serde_json::from_value(json!({"items": "[1, 2]"})).unwrap();
        assert_eq!(from_string.items, vec![1, 2]);

        let from_null: Holder = serde_json::from_value(json!({"items": null})).unwrap();
        assert!(from_null.items.is_empty());

        let missing: Holder = serde_json::from_value(json!({})).unwrap();
        assert!(missing.items.is_empty());

        let broken = serde_json::from_value::<Holder>(json!({"items": "[1, "}));
        assert!(broken.is_err());
    }

    #[test]
    fn test_null_default_field() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_null_default")]
            status: String,
            #[serde(default, deserialize_with = "deserialize_null_default")]
            score: f64,
        }

        let nulls: Holder = serde_json::from_value(json!({"status": null, "score": null})).unwrap();
        assert_eq!(nulls.status, "");
        assert_eq!(nulls.score, 0.0);

        let values: Holder =
            serde_json::from_value(json!({"status": "failed", "score": 87.5})).unwrap();
        assert_eq!(values.status, "failed");
        assert_eq!(values.score, 87.5);

        let wrong_type = serde_json::from_value::<Holder>(json!({"score": "high"}));
        assert!(wrong_type.is_err());
    }
}
