use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::tempdir;

use weekly_processor::app::ports::{GeocodeClient, TableSink};
use weekly_processor::domain::{GeocodeResult, GeocodeStatus, ReferenceTable};
use weekly_processor::infra::{load_reference_csv, CsvTableSink};
use weekly_processor::pipeline::{parse_raw_records, Limits, PipelineOrchestrator, RateLimiter};
use weekly_processor::PipelineError;

/// Answers by keyword so each status can be provoked from the input
struct KeywordGeocoder;

#[async_trait]
impl GeocodeClient for KeywordGeocoder {
    async fn lookup(&self, address: &str) -> GeocodeResult {
        if address.contains("NOWHERE") {
            GeocodeResult::no_result()
        } else if address.contains("DENIED") {
            GeocodeResult::api_error()
        } else if address.contains("TIMEOUT") {
            GeocodeResult::error()
        } else {
            GeocodeResult::success(2.9927, 101.7909)
        }
    }
}

const EXPORT: &str = r#"[
  {
    "form_id": 11,
    "user_id": 7,
    "createdAt": "2024-03-05T10:22:41.000Z",
    "form_category": "food",
    "ic_number": "850312105566",
    "name": "siti aminah",
    "race": "Melayu",
    "gender": "P",
    "state": null,
    "postcode": 43000,
    "address": "No 5, Jalan Reko,\nTaman Reko,,",
    "mobile_number": "123456789",
    "email": "siti@example.com",
    "monthly_income": "1500.5",
    "proof_of_income": "slip.pdf"
  },
  {
    "form_id": 12,
    "createdAt": "2024-03-06T08:00:00.000Z",
    "form_category": "agriculture",
    "ic_number": "0503",
    "name": "ahmad",
    "state": "Perak",
    "postcode": " 99999 ",
    "address": "Kampung Nowhere",
    "mobile_number": "0123",
    "monthly_income": "RM900",
    "referrer": "mosque"
  },
  {
    "form_category": "maintenance",
    "ic_number": "101010101010",
    "name": "lee",
    "postcode": "01000",
    "address": "Denied Street"
  },
  {
    "form_category": "housing",
    "name": "raj",
    "address": "Timeout Road"
  },
  {
    "form_category": "food",
    "name": "no address"
  }
]"#;

fn reference(dir: &std::path::Path) -> Result<ReferenceTable> {
    let path = dir.join("postcodes.csv");
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "postcode,city,state")?;
    writeln!(file, "43000,Kajang,Selangor")?;
    writeln!(file, "01000,Kangar,Perlis")?;
    Ok(load_reference_csv(&path)?)
}

fn orchestrator() -> PipelineOrchestrator {
    let limiter = RateLimiter::new(Limits {
        requests_per_min: None,
        concurrency: 3,
    });
    PipelineOrchestrator::new(Arc::new(KeywordGeocoder), limiter, 2024)
}

#[tokio::test]
async fn test_full_run_cleans_enriches_and_joins() -> Result<()> {
    let dir = tempdir()?;
    let reference = reference(dir.path())?;
    let records = parse_raw_records(EXPORT)?;

    let result = orchestrator().run(records, Some(&reference)).await?;
    let rows = &result.table.rows;
    assert_eq!(rows.len(), 5);

    let first = &rows[0];
    assert_eq!(first["program"], json!("INSAN"));
    assert_eq!(first["date"], json!("2024-03-05"));
    assert_eq!(first["ic"], json!("850312105566"));
    assert_eq!(first["age"], json!(39));
    assert_eq!(first["name"], json!("SITI AMINAH"));
    assert_eq!(first["ethnicity"], json!("Melayu"));
    assert_eq!(first["sex"], json!("P"));
    assert_eq!(first["address"], json!("NO 5, JALAN REKO, TAMAN REKO, MALAYSIA"));
    assert_eq!(first["phone"], json!("+60123456789"));
    assert_eq!(first["salary_monthly"], json!("1500.50"));
    assert_eq!(first["postcode"], json!("43000"));
    assert_eq!(first["district"], json!("Kajang"));
    // The applicant's own null state is kept over the reference state
    assert_eq!(first["state"], Value::Null);
    assert_eq!(first["geocode_status"], json!("success"));
    assert_eq!(first["lat"], json!(2.9927));
    assert_eq!(first["lon"], json!(101.7909));
    for dropped in ["form_id", "user_id", "proof_of_income"] {
        assert!(!first.contains_key(dropped), "{dropped} should be dropped");
    }

    let second = &rows[1];
    assert_eq!(second["program"], json!("INTAN"));
    assert_eq!(second["age"], json!("IC ERROR"));
    assert_eq!(second["ic"], json!("0503"));
    assert_eq!(second["phone"], json!("+6010123"));
    assert_eq!(second["salary_monthly"], json!("RM900"));
    assert_eq!(second["postcode"], json!("99999"));
    assert_eq!(second["district"], Value::Null);
    assert_eq!(second["state"], json!("Perak"));
    assert_eq!(second["geocode_status"], json!("no_result"));
    assert_eq!(second["lat"], Value::Null);
    assert_eq!(second["referrer"], json!("mosque"));

    assert_eq!(rows[2]["program"], json!("IKHSAN"));
    assert_eq!(rows[2]["age"], json!(14));
    assert_eq!(rows[2]["district"], json!("Kangar"));
    assert_eq!(rows[2]["state"], json!("Perlis"));
    assert_eq!(rows[2]["geocode_status"], json!("api_error"));

    assert_eq!(rows[3]["program"], json!("housing"));
    assert_eq!(rows[3]["geocode_status"], json!("error"));
    assert_eq!(rows[4]["geocode_status"], json!("no_result"));
    assert_eq!(rows[4]["address"], Value::Null);

    for row in rows {
        for flag in ["miskin", "miskin_tegar", "str_mof", "belum_disemak"] {
            assert_eq!(row[flag], json!(""));
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_summary_accounts_for_every_record() -> Result<()> {
    let dir = tempdir()?;
    let reference = reference(dir.path())?;
    let result = orchestrator().run(parse_raw_records(EXPORT)?, Some(&reference)).await?;
    let summary = &result.summary;

    let counted: usize = summary.status_counts.values().sum();
    assert_eq!(counted, summary.total_records);
    assert_eq!(summary.count(GeocodeStatus::Success), 1);
    assert_eq!(summary.count(GeocodeStatus::NoResult), 2);
    assert_eq!(summary.count(GeocodeStatus::ApiError), 1);
    assert_eq!(summary.count(GeocodeStatus::Error), 1);
    assert_eq!(summary.failed_addresses.len(), 4);
    assert_eq!(summary.ic_errors, 1);
    assert_eq!(summary.reference_matches, 2);

    // Coordinates are present exactly when the lookup succeeded
    for row in &result.table.rows {
        let success = row["geocode_status"] == json!("success");
        assert_eq!(!row["lat"].is_null(), success);
        assert_eq!(!row["lon"].is_null(), success);
    }
    Ok(())
}

#[tokio::test]
async fn test_table_keeps_canonical_columns_first() -> Result<()> {
    let dir = tempdir()?;
    let reference = reference(dir.path())?;
    let result = orchestrator().run(parse_raw_records(EXPORT)?, Some(&reference)).await?;

    let columns: Vec<&str> = result.table.columns.iter().map(String::as_str).collect();
    assert_eq!(
        columns,
        vec![
            "program", "date", "ic", "name", "age", "ethnicity", "sex", "state", "district",
            "postcode", "lat", "lon", "address", "phone", "email", "salary_monthly",
            "geocode_status", "miskin", "miskin_tegar", "str_mof", "belum_disemak", "referrer",
        ]
    );
    for row in &result.table.rows {
        assert_eq!(row.keys().map(String::as_str).collect::<Vec<_>>(), columns);
    }
    Ok(())
}

#[tokio::test]
async fn test_result_writes_through_csv_sink() -> Result<()> {
    let dir = tempdir()?;
    let reference = reference(dir.path())?;
    let result = orchestrator().run(parse_raw_records(EXPORT)?, Some(&reference)).await?;

    let sink = CsvTableSink::new(dir.path().join("out").join("cleaned.csv"));
    sink.write_table(&result.table).await?;

    let mut reader = csv::Reader::from_path(sink.path())?;
    let headers = reader.headers()?.clone();
    assert_eq!(headers.get(0), Some("program"));
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 5);
    let address = headers.iter().position(|h| h == "address").unwrap();
    assert_eq!(&rows[0][address], "NO 5, JALAN REKO, TAMAN REKO, MALAYSIA");
    Ok(())
}

#[tokio::test]
async fn test_run_rejects_missing_inputs() -> Result<()> {
    let dir = tempdir()?;
    let reference = reference(dir.path())?;

    let err = orchestrator().run(Vec::new(), Some(&reference)).await.unwrap_err();
    assert!(matches!(err, PipelineError::Input(_)));

    let records = parse_raw_records(EXPORT)?;
    let err = orchestrator().run(records, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::ReferenceData(_)));

    assert!(matches!(parse_raw_records("[]"), Err(PipelineError::Input(_))));
    Ok(())
}
