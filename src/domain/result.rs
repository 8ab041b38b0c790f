use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{GeocodeStatus, Record};

/// The finalized table handed to an output sink
#[derive(Debug, Clone, Serialize)]
pub struct FinalTable {
    pub sheet_name: String,
    /// Column names in output order: canonical columns first, then extras
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl FinalTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// An address that did not geocode, kept for manual review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedAddress {
    /// Zero-based row index in the final table
    pub row: usize,
    pub address: Option<String>,
    pub status: GeocodeStatus,
}

/// Aggregate numbers for one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_records: usize,
    /// Every status is present, zero counts included
    pub status_counts: BTreeMap<GeocodeStatus, usize>,
    pub failed_addresses: Vec<FailedAddress>,
    /// Records whose identity number could not yield an age
    pub ic_errors: usize,
    pub reference_matches: usize,
}

impl RunSummary {
    pub fn count(&self, status: GeocodeStatus) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    /// Share of records that geocoded successfully, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.count(GeocodeStatus::Success) as f64 / self.total_records as f64 * 100.0
    }
}

/// Everything a run produces. Built once at the end of the run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub table: FinalTable,
    pub summary: RunSummary,
}
