use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::app::ports::GeocodeClient;
use crate::constants::ADDRESS_COUNTRY_SUFFIX;
use crate::domain::{field_text, CanonicalField, GeocodeResult, GeocodeStatus, Record};
use crate::observability::metrics;
use crate::pipeline::rate_limiter::RateLimiter;

static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\r\n]*(?:\r\n|\r|\n)\s*").expect("valid line break pattern"));
static REPEATED_COMMAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(?:\s*,)+").expect("valid comma pattern"));

/// Canonicalize an address for lookup.
///
/// Line breaks become single spaces, runs of commas collapse into one, trailing commas
/// and outer whitespace are stripped, and `, MALAYSIA` is appended unless already there.
pub fn clean_address(text: &str) -> String {
    let joined = LINE_BREAKS.replace_all(text, " ");
    let collapsed = REPEATED_COMMAS.replace_all(&joined, ",");
    let mut address = collapsed
        .trim()
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string();
    if !address.ends_with(ADDRESS_COUNTRY_SUFFIX) {
        address.push_str(ADDRESS_COUNTRY_SUFFIX);
    }
    address
}

/// Write a lookup outcome into the record's status and coordinate columns
pub fn apply_geocode(record: &mut Record, result: &GeocodeResult) {
    record.insert(
        CanonicalField::GeocodeStatus.name().to_string(),
        Value::String(result.status().as_str().to_string()),
    );
    record.insert(CanonicalField::Lat.name().to_string(), coordinate(result.lat()));
    record.insert(CanonicalField::Lon.name().to_string(), coordinate(result.lon()));
}

fn coordinate(value: Option<f64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

/// Cleans addresses and geocodes every record through an injected client
pub struct AddressEnricher<'a> {
    client: &'a dyn GeocodeClient,
    limiter: RateLimiter,
}

impl<'a> AddressEnricher<'a> {
    pub fn new(client: &'a dyn GeocodeClient, limiter: RateLimiter) -> Self {
        Self { client, limiter }
    }

    /// Geocode all records, at most `limiter.concurrency()` lookups at a time.
    ///
    /// Results are written back to the record they came from, so row order never changes.
    /// Records without an address are not sent to the service and get `no_result`.
    #[instrument(
        skip_all,
        fields(records = records.len(), concurrency = self.limiter.concurrency())
    )]
    pub async fn enrich(&self, records: &mut [Record]) {
        let address_field = CanonicalField::Address.name();
        let mut lookups = Vec::new();
        for (row, record) in records.iter_mut().enumerate() {
            match field_text(record, address_field) {
                Some(raw) => {
                    let cleaned = clean_address(&raw);
                    record.insert(address_field.to_string(), Value::String(cleaned.clone()));
                    lookups.push((row, cleaned));
                }
                None => {
                    debug!(row, "No address to geocode");
                    apply_geocode(record, &GeocodeResult::no_result());
                    metrics::geocode::lookup_completed(GeocodeStatus::NoResult);
                }
            }
        }

        let results: Vec<(usize, GeocodeResult)> = stream::iter(lookups)
            .map(|(row, address)| async move {
                self.limiter.acquire().await;
                let result = self.client.lookup(&address).await;
                if result.status() != GeocodeStatus::Success {
                    warn!(row, %address, status = %result.status(), "Address did not geocode");
                }
                (row, result)
            })
            .buffered(self.limiter.concurrency())
            .collect()
            .await;

        for (row, result) in results {
            metrics::geocode::lookup_completed(result.status());
            if let Some(record) = records.get_mut(row) {
                apply_geocode(record, &result);
            }
        }
    }
}
