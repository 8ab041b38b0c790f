use serde_json::Value;
use tracing::debug;

use crate::domain::reference::ReferenceTable;
use crate::domain::{field_text, CanonicalField, Record};

/// Left-join records against the postcode reference table.
///
/// Every record survives in its original position. On a match the reference city
/// becomes `district`. The record's own `state` column always wins, even when it is
/// `null`; the reference state only fills records that have no `state` field at all.
/// Unmatched records get an empty `district` and keep any state they had. Returns the
/// number of matched records.
pub fn join(records: &mut [Record], reference: &ReferenceTable) -> usize {
    let postcode_field = CanonicalField::Postcode.name();
    let district_field = CanonicalField::District.name();
    let state_field = CanonicalField::State.name();
    let mut matched = 0;

    for record in records.iter_mut() {
        let area = field_text(record, postcode_field).and_then(|postcode| {
            let trimmed = postcode.trim().to_string();
            record.insert(postcode_field.to_string(), Value::String(trimmed.clone()));
            reference.lookup(&trimmed)
        });

        match area {
            Some(area) => {
                matched += 1;
                record.insert(district_field.to_string(), Value::String(area.district.clone()));
                if !record.contains_key(state_field) {
                    record.insert(state_field.to_string(), Value::String(area.state.clone()));
                }
            }
            None => {
                if !record.contains_key(district_field) {
                    record.insert(district_field.to_string(), Value::Null);
                }
                if !record.contains_key(state_field) {
                    record.insert(state_field.to_string(), Value::Null);
                }
            }
        }
    }

    debug!(records = records.len(), matched, "Joined records against postcode reference");
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reference::ReferenceRow;
    use serde_json::json;

    fn table() -> ReferenceTable {
        ReferenceTable::from_rows(vec![
            ReferenceRow {
                postcode: "43000".to_string(),
                city: "Kajang".to_string(),
                state: "Selangor".to_string(),
            },
            ReferenceRow {
                postcode: "01000".to_string(),
                city: "Kangar".to_string(),
                state: "Perlis".to_string(),
            },
        ])
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn test_match_attaches_district_and_keeps_original_state() {
        let mut records = vec![record(json!({
            "state": "SELANGOR DARUL EHSAN",
            "postcode": "43000"
        }))];
        assert_eq!(join(&mut records, &table()), 1);
        assert_eq!(records[0]["district"], json!("Kajang"));
        assert_eq!(records[0]["state"], json!("SELANGOR DARUL EHSAN"));
    }

    #[test]
    fn test_match_fills_state_when_record_has_none() {
        let mut records = vec![record(json!({"postcode": " 01000 "}))];
        join(&mut records, &table());
        assert_eq!(records[0]["district"], json!("Kangar"));
        assert_eq!(records[0]["state"], json!("Perlis"));
        assert_eq!(records[0]["postcode"], json!("01000"));
    }

    #[test]
    fn test_match_keeps_null_state_from_record() {
        let mut records = vec![record(json!({"state": null, "postcode": "43000"}))];
        assert_eq!(join(&mut records, &table()), 1);
        assert_eq!(records[0]["district"], json!("Kajang"));
        assert_eq!(records[0]["state"], Value::Null);
    }

    #[test]
    fn test_numeric_postcode_matches_as_text() {
        let mut records = vec![record(json!({"postcode": 43000}))];
        assert_eq!(join(&mut records, &table()), 1);
        assert_eq!(records[0]["postcode"], json!("43000"));
    }

    #[test]
    fn test_unmatched_record_is_kept_unchanged() {
        let original = record(json!({"name": "ALI", "state": "Johor", "postcode": "99999"}));
        let mut records = vec![original.clone(), record(json!({"name": "NO POSTCODE"}))];
        assert_eq!(join(&mut records, &table()), 0);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["district"], Value::Null);
        assert_eq!(records[0]["state"], json!("Johor"));
        for (key, value) in &original {
            assert_eq!(&records[0][key.as_str()], value);
        }
        assert_eq!(records[1]["district"], Value::Null);
        assert_eq!(records[1]["state"], Value::Null);
    }
}
