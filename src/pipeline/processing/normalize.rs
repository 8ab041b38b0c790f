use serde_json::Value;
use tracing::debug;

use crate::constants::{PROGRAM_NAMES, UNWANTED_FIELDS};
use crate::domain::schema::{canonical_order, rename_map};
use crate::domain::{CanonicalField, Record};

/// Remove every field named in `deny_list`. Missing fields are ignored.
pub fn drop_unwanted(records: &mut [Record], deny_list: &[&str]) {
    for record in records.iter_mut() {
        record.retain(|key, _| !deny_list.contains(&key.as_str()));
    }
}

/// Rename fields per `name_map` (`raw → canonical`), keeping each field's position.
///
/// When a renamed field lands on a name that is already present, the later value wins
/// and the earlier position is kept.
pub fn rename(records: &mut [Record], name_map: &[(&str, &str)]) {
    for record in records.iter_mut() {
        let original = std::mem::take(record);
        for (key, value) in original {
            let target = name_map
                .iter()
                .find(|(raw, _)| *raw == key)
                .map(|(_, canonical)| (*canonical).to_string())
                .unwrap_or(key);
            record.insert(target, value);
        }
    }
}

/// Replace `field` values found in `value_map`; anything else is kept as-is.
pub fn remap_categorical(records: &mut [Record], field: &str, value_map: &[(&str, &str)]) {
    for record in records.iter_mut() {
        let Some(Value::String(current)) = record.get_mut(field) else {
            continue;
        };
        if let Some((_, mapped)) = value_map.iter().find(|(from, _)| *from == current.as_str()) {
            *current = (*mapped).to_string();
        }
    }
}

/// Lay out each record with the `canonical_order` fields it has first, then its remaining
/// fields in their original relative order. Reordering an ordered record is a no-op.
pub fn reorder(records: &mut [Record], canonical_order: &[&str]) {
    let position = |key: &str| canonical_order.iter().position(|name| *name == key);
    for record in records.iter_mut() {
        let (mut canonical, extras): (Vec<_>, Vec<_>) = std::mem::take(record)
            .into_iter()
            .partition(|(key, _)| position(key.as_str()).is_some());
        canonical.sort_by_key(|(key, _)| position(key.as_str()));
        record.extend(canonical);
        record.extend(extras);
    }
}

/// Drops, renames and remaps upstream records into canonical field names
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    pub deny_list: Vec<&'static str>,
    pub name_map: Vec<(&'static str, &'static str)>,
    pub program_values: Vec<(&'static str, &'static str)>,
    pub canonical_order: Vec<&'static str>,
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self {
            deny_list: UNWANTED_FIELDS.to_vec(),
            name_map: rename_map(),
            program_values: PROGRAM_NAMES.to_vec(),
            canonical_order: canonical_order(),
        }
    }
}

impl SchemaNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop unwanted fields, rename to canonical names and remap program values
    pub fn normalize(&self, records: &mut [Record]) {
        drop_unwanted(records, &self.deny_list);
        rename(records, &self.name_map);
        remap_categorical(records, CanonicalField::Program.name(), &self.program_values);
        debug!(records = records.len(), "Normalized records to canonical field names");
    }

    pub fn reorder(&self, records: &mut [Record]) {
        reorder(records, &self.canonical_order);
    }
}
