//! Record shapes shared by every pipeline stage

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod reference;
pub mod result;
pub mod schema;

pub use reference::{PostcodeArea, ReferenceRow, ReferenceTable};
pub use result::{FailedAddress, FinalTable, PipelineResult, RunSummary};
pub use schema::{CanonicalField, FieldDescriptor, FieldRule, CANONICAL_SCHEMA};

/// One record as a column-ordered map of field name to scalar value.
///
/// Raw records arrive with upstream field names; after the rename stage the same type
/// carries canonical names.
pub type Record = Map<String, Value>;

/// Text form of a scalar cell. `null` reads as absent.
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Text form of a record's field, or `None` when the field is missing or `null`
pub fn field_text(record: &Record, field: &str) -> Option<String> {
    record.get(field).and_then(text_value)
}

/// Outcome of a single address lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeStatus {
    Success,
    NoResult,
    ApiError,
    Error,
}

impl GeocodeStatus {
    pub const ALL: [GeocodeStatus; 4] = [
        GeocodeStatus::Success,
        GeocodeStatus::NoResult,
        GeocodeStatus::ApiError,
        GeocodeStatus::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GeocodeStatus::Success => "success",
            GeocodeStatus::NoResult => "no_result",
            GeocodeStatus::ApiError => "api_error",
            GeocodeStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

impl std::fmt::Display for GeocodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of looking up one address. Coordinates exist only on success.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeocodeResult {
    status: GeocodeStatus,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl GeocodeResult {
    pub fn success(lat: f64, lon: f64) -> Self {
        Self {
            status: GeocodeStatus::Success,
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    pub fn no_result() -> Self {
        Self::failed(GeocodeStatus::NoResult)
    }

    pub fn api_error() -> Self {
        Self::failed(GeocodeStatus::ApiError)
    }

    pub fn error() -> Self {
        Self::failed(GeocodeStatus::Error)
    }

    fn failed(status: GeocodeStatus) -> Self {
        Self {
            status,
            lat: None,
            lon: None,
        }
    }

    pub fn status(&self) -> GeocodeStatus {
        self.status
    }

    pub fn lat(&self) -> Option<f64> {
        self.lat
    }

    pub fn lon(&self) -> Option<f64> {
        self.lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_value_forms() {
        assert_eq!(text_value(&json!("abc")), Some("abc".to_string()));
        assert_eq!(text_value(&json!(1500)), Some("1500".to_string()));
        assert_eq!(text_value(&json!(12.5)), Some("12.5".to_string()));
        assert_eq!(text_value(&Value::Null), None);
    }

    #[test]
    fn test_geocode_result_coordinates_only_on_success() {
        let ok = GeocodeResult::success(3.1, 101.7);
        assert_eq!(ok.status(), GeocodeStatus::Success);
        assert_eq!((ok.lat(), ok.lon()), (Some(3.1), Some(101.7)));

        let failures = [
            GeocodeResult::no_result(),
            GeocodeResult::api_error(),
            GeocodeResult::error(),
        ];
        for failed in failures {
            assert_ne!(failed.status(), GeocodeStatus::Success);
            assert!(failed.lat().is_none() && failed.lon().is_none());
        }
    }

    #[test]
    fn test_status_names_round_trip() {
        for status in GeocodeStatus::ALL {
            assert_eq!(GeocodeStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(GeocodeStatus::parse("OK"), None);
    }
}
