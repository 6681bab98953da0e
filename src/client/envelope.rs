//! Unwrapping of the per-resource JSON envelope.
//!
//! Beanstalk wraps every record in a mapping with a single key naming the
//! element (`{"repository": {...}}`). List endpoints return an array of such
//! mappings.

use serde_json::Value;

use crate::client::Record;

/// Body some endpoints send instead of `[]` when there is nothing to list.
pub const EMPTY_XML_PLACEHOLDER: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<releases type=\"array\"/>\n";

/// Result of generic unwrapping, keyed on the top-level JSON type.
#[derive(Debug, Clone, PartialEq)]
pub enum Unwrapped {
    Record(Record),
    Records(Vec<Record>),
}

impl Unwrapped {
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Unwrapped::Record(r) => vec![r],
            Unwrapped::Records(rs) => rs,
        }
    }
}

/// Decode a body, honouring the empty-list placeholder.
pub(crate) fn decode(body: &str) -> Result<Value, String> {
    if body == EMPTY_XML_PLACEHOLDER {
        return Ok(Value::Array(Vec::new()));
    }
    serde_json::from_str(body).map_err(|e| e.to_string())
}

/// Unwrap according to the top-level JSON type.
pub(crate) fn unwrap_any(value: Value) -> Result<Unwrapped, String> {
    match value {
        Value::Array(_) => unwrap_list(value).map(Unwrapped::Records),
        Value::Object(_) => unwrap_single(value).map(Unwrapped::Record),
        other => Err(format!("expected an object or array, got {}", kind(&other))),
    }
}

pub(crate) fn unwrap_single(value: Value) -> Result<Record, String> {
    match value {
        Value::Object(map) => {
            let mut entries = map.into_iter();
            match (entries.next(), entries.next()) {
                (Some((_, inner)), None) => Ok(inner),
                (None, _) => Err("empty envelope".to_string()),
                (Some((first, _)), Some((second, _))) => Err(format!(
                    "envelope has more than one key ({first}, {second}, ...)"
                )),
            }
        }
        other => Err(format!("expected a single-key object, got {}", kind(&other))),
    }
}

pub(crate) fn unwrap_list(value: Value) -> Result<Vec<Record>, String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| unwrap_single(item).map_err(|e| format!("item {i}: {e}")))
            .collect(),
        other => Err(format!("expected an array, got {}", kind(&other))),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_envelope_yields_inner_record() {
        let got = unwrap_any(json!({"repository": {"id": 1, "name": "x"}})).unwrap();
        assert_eq!(got, Unwrapped::Record(json!({"id": 1, "name": "x"})));
    }

    #[test]
    fn list_envelope_yields_records_in_order() {
        let got = unwrap_any(json!([{"repository": {"id": 1}}, {"repository": {"id": 2}}])).unwrap();
        assert_eq!(
            got,
            Unwrapped::Records(vec![json!({"id": 1}), json!({"id": 2})])
        );
    }

    #[test]
    fn empty_list_stays_empty() {
        assert_eq!(unwrap_any(json!([])).unwrap(), Unwrapped::Records(vec![]));
    }

    #[test]
    fn placeholder_decodes_to_empty_array() {
        assert_eq!(decode(EMPTY_XML_PLACEHOLDER).unwrap(), json!([]));
    }

    #[test]
    fn other_xml_is_a_decode_error() {
        assert!(decode("<?xml version=\"1.0\"?><error/>").is_err());
    }

    #[test]
    fn list_unwrap_rejects_object() {
        let err = unwrap_list(json!({"user": {"id": 3}})).unwrap_err();
        assert!(err.contains("expected an array"));
    }

    #[test]
    fn multi_key_envelope_is_rejected() {
        let err = unwrap_single(json!({"a": 1, "b": 2})).unwrap_err();
        assert!(err.contains("more than one key"));
    }

    #[test]
    fn list_item_errors_name_their_index() {
        let err = unwrap_list(json!([{"release": {"id": 1}}, 5])).unwrap_err();
        assert!(err.starts_with("item 1:"));
    }
}
