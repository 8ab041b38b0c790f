use serde_json::{Map, Value};

use crate::domain::Record;
use crate::error::{PipelineError, Result};

/// Decode a JSON export into raw records.
///
/// The export must be a non-empty array of objects. Nested objects are flattened into
/// dotted field names (`{"a": {"b": 1}}` becomes `"a.b": 1`); arrays stay as values.
pub fn parse_raw_records(json: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| PipelineError::Input(format!("Failed to decode JSON: {e}")))?;
    let Value::Array(items) = value else {
        return Err(PipelineError::Input("Expected a JSON array of records".to_string()));
    };
    if items.is_empty() {
        return Err(PipelineError::Input("No records in input".to_string()));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => Ok(flatten(object)),
            other => Err(PipelineError::Input(format!(
                "Record {index} is not an object: {other}"
            ))),
        })
        .collect()
}

fn flatten(object: Map<String, Value>) -> Record {
    let mut flat = Record::new();
    flatten_into(&mut flat, None, object);
    flat
}

fn flatten_into(flat: &mut Record, prefix: Option<&str>, object: Map<String, Value>) {
    for (key, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            Value::Object(nested) => flatten_into(flat, Some(&name), nested),
            other => {
                flat.insert(name, other);
            }
        }
    }
}
