use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::app::ports::GeocodeClient;
use crate::constants::{CLEANED_SHEET_NAME, IC_ERROR};
use crate::domain::schema::{canonical_order, fields_with_rule, FieldRule};
use crate::domain::{
    field_text, CanonicalField, FailedAddress, FinalTable, GeocodeStatus, PipelineResult,
    Record, ReferenceTable, RunSummary,
};
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::enrich::AddressEnricher;
use crate::pipeline::processing::format::FieldFormatter;
use crate::pipeline::processing::join::join;
use crate::pipeline::processing::normalize::SchemaNormalizer;
use crate::pipeline::rate_limiter::RateLimiter;

/// Runs one batch through every stage and builds the [`PipelineResult`].
///
/// The geocoder and the reference table are supplied by the caller; nothing is kept
/// between runs.
pub struct PipelineOrchestrator {
    geocoder: Arc<dyn GeocodeClient>,
    limiter: RateLimiter,
    normalizer: SchemaNormalizer,
    formatter: FieldFormatter,
}

impl PipelineOrchestrator {
    pub fn new(
        geocoder: Arc<dyn GeocodeClient>,
        limiter: RateLimiter,
        reference_year: i32,
    ) -> Self {
        Self {
            geocoder,
            limiter,
            normalizer: SchemaNormalizer::new(),
            formatter: FieldFormatter::new(reference_year),
        }
    }

    pub fn reference_year(&self) -> i32 {
        self.formatter.reference_year
    }

    /// Process one batch of raw records.
    ///
    /// Fails before any stage runs when there are no records or no reference data.
    /// Everything that goes wrong for a single record ends up as a value in the table.
    pub async fn run(
        &self,
        mut records: Vec<Record>,
        reference: Option<&ReferenceTable>,
    ) -> Result<PipelineResult> {
        if records.is_empty() {
            metrics::pipeline::run_rejected("empty_input");
            return Err(PipelineError::Input("No records to process".to_string()));
        }
        let reference = match reference {
            Some(table) if !table.is_empty() => table,
            _ => {
                metrics::pipeline::run_rejected("reference_unavailable");
                return Err(PipelineError::ReferenceData(
                    "Postcode reference table is missing or empty".to_string(),
                ));
            }
        };

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let span = info_span!("pipeline_run", %run_id, records = records.len());

        async move {
            info!(reference_year = self.reference_year(), "Starting pipeline run");

            self.normalizer.normalize(&mut records);
            self.formatter.format_batch(&mut records);

            let enricher = AddressEnricher::new(self.geocoder.as_ref(), self.limiter.clone());
            enricher.enrich(&mut records).await;

            self.normalizer.reorder(&mut records);
            let reference_matches = join(&mut records, reference);
            attach_default_flags(&mut records);

            let table = finalize_table(records);
            let summary = summarize(&table, run_id, started_at, reference_matches);

            metrics::pipeline::run_completed(
                summary.total_records,
                summary.reference_matches,
                summary.ic_errors,
                clock.elapsed().as_secs_f64(),
            );
            if !summary.failed_addresses.is_empty() {
                warn!(failed = summary.failed_addresses.len(), "Some addresses did not geocode");
            }
            info!(
                total = summary.total_records,
                success = summary.count(GeocodeStatus::Success),
                reference_matches,
                ic_errors = summary.ic_errors,
                "Pipeline run finished"
            );

            Ok(PipelineResult { table, summary })
        }
        .instrument(span)
        .await
    }
}

/// Give every review flag column an empty value unless upstream supplied one
pub fn attach_default_flags(records: &mut [Record]) {
    let flags = fields_with_rule(FieldRule::DefaultEmpty);
    for record in records.iter_mut() {
        for flag in &flags {
            if field_text(record, flag).is_none() {
                record.insert((*flag).to_string(), Value::String(String::new()));
            }
        }
    }
}

/// Lay records out as a table: every canonical column in order, then extra fields in
/// the order they were first seen. Missing cells are `null`.
pub fn finalize_table(records: Vec<Record>) -> FinalTable {
    let mut columns: Vec<String> = canonical_order().into_iter().map(str::to_string).collect();
    for record in &records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .into_iter()
        .map(|mut record| {
            columns
                .iter()
                .map(|column| {
                    let value = record.remove(column).unwrap_or(Value::Null);
                    (column.clone(), value)
                })
                .collect::<Record>()
        })
        .collect();

    FinalTable {
        sheet_name: CLEANED_SHEET_NAME.to_string(),
        columns,
        rows,
    }
}

fn summarize(
    table: &FinalTable,
    run_id: Uuid,
    started_at: chrono::DateTime<Utc>,
    reference_matches: usize,
) -> RunSummary {
    let mut status_counts: BTreeMap<GeocodeStatus, usize> =
        GeocodeStatus::ALL.into_iter().map(|status| (status, 0)).collect();
    let mut failed_addresses = Vec::new();
    let mut ic_errors = 0;

    for (row, record) in table.rows.iter().enumerate() {
        let status = field_text(record, CanonicalField::GeocodeStatus.name())
            .and_then(|s| GeocodeStatus::parse(&s));
        if let Some(status) = status {
            *status_counts.entry(status).or_default() += 1;
            if status != GeocodeStatus::Success {
                failed_addresses.push(FailedAddress {
                    row,
                    address: field_text(record, CanonicalField::Address.name()),
                    status,
                });
            }
        }
        if field_text(record, CanonicalField::Age.name()).as_deref() == Some(IC_ERROR) {
            ic_errors += 1;
        }
    }

    RunSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        total_records: table.rows.len(),
        status_counts,
        failed_addresses,
        ic_errors,
        reference_matches,
    }
}
