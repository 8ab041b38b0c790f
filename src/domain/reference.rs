use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

/// One row of the postcode reference data
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceRow {
    pub postcode: String,
    pub city: String,
    pub state: String,
}

/// District and state a postcode belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostcodeArea {
    pub district: String,
    pub state: String,
}

/// Read-only postcode lookup, keyed by trimmed postcode text.
///
/// Keys are compared as strings, so `"01000"` and `"1000"` are different postcodes.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    areas: HashMap<String, PostcodeArea>,
}

impl ReferenceTable {
    /// Build the table, keeping the first row for a repeated postcode
    pub fn from_rows(rows: impl IntoIterator<Item = ReferenceRow>) -> Self {
        let mut areas = HashMap::new();
        for row in rows {
            let key = normalize_postcode(&row.postcode);
            if areas.contains_key(&key) {
                warn!(postcode = %key, "Duplicate postcode in reference data, keeping first row");
                continue;
            }
            areas.insert(
                key,
                PostcodeArea {
                    district: row.city.trim().to_string(),
                    state: row.state.trim().to_string(),
                },
            );
        }
        Self { areas }
    }

    pub fn lookup(&self, postcode: &str) -> Option<&PostcodeArea> {
        self.areas.get(&normalize_postcode(postcode))
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

pub fn normalize_postcode(postcode: &str) -> String {
    postcode.trim().to_string()
}
