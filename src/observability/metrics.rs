//! Counters and histograms emitted by the pipeline.
//!
//! Nothing here installs a recorder; without one every call is a no-op.

use crate::domain::GeocodeStatus;

pub const GEOCODE_LOOKUPS_TOTAL: &str = "weekly_geocode_lookups_total";
pub const RECORDS_PROCESSED_TOTAL: &str = "weekly_records_processed_total";
pub const REFERENCE_MATCHES_TOTAL: &str = "weekly_reference_matches_total";
pub const IC_ERRORS_TOTAL: &str = "weekly_ic_errors_total";
pub const RUN_DURATION_SECONDS: &str = "weekly_run_duration_seconds";
pub const RUNS_FAILED_TOTAL: &str = "weekly_runs_failed_total";

// ============================================================================
// Geocoding Metrics
// ============================================================================

pub mod geocode {
    use super::*;

    /// Record the outcome of one address lookup
    pub fn lookup_completed(status: GeocodeStatus) {
        ::metrics::counter!(GEOCODE_LOOKUPS_TOTAL, "status" => status.as_str()).increment(1);
    }
}

// ============================================================================
// Pipeline Metrics
// ============================================================================

pub mod pipeline {
    use super::*;

    /// Record a finished run
    pub fn run_completed(
        records: usize,
        reference_matches: usize,
        ic_errors: usize,
        duration_secs: f64,
    ) {
        ::metrics::counter!(RECORDS_PROCESSED_TOTAL).increment(records as u64);
        ::metrics::counter!(REFERENCE_MATCHES_TOTAL).increment(reference_matches as u64);
        ::metrics::counter!(IC_ERRORS_TOTAL).increment(ic_errors as u64);
        ::metrics::histogram!(RUN_DURATION_SECONDS).record(duration_secs);
    }

    /// Record a run rejected before any stage ran
    pub fn run_rejected(reason: &'static str) {
        ::metrics::counter!(RUNS_FAILED_TOTAL, "reason" => reason).increment(1);
    }
}
