use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::app::ports::TableSink;
use crate::domain::{text_value, FinalTable};

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    Ok(())
}

/// Spreadsheet cell text: `null` is an empty cell, everything else its text form
fn cell(value: Option<&Value>) -> String {
    value.and_then(text_value).unwrap_or_default()
}

/// Writes the table as CSV with a header row of column names
pub struct CsvTableSink {
    path: PathBuf,
}

impl CsvTableSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TableSink for CsvTableSink {
    async fn write_table(&self, table: &FinalTable) -> anyhow::Result<()> {
        ensure_parent_dir(&self.path)?;
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(table.columns.iter().map(|column| cell(row.get(column))))?;
        }
        writer.flush()?;
        info!(
            path = %self.path.display(),
            sheet = %table.sheet_name,
            rows = table.len(),
            "Wrote CSV table"
        );
        Ok(())
    }
}

/// Writes the table as one JSON document: `{"sheet", "columns", "rows"}`
pub struct JsonTableSink {
    path: PathBuf,
}

impl JsonTableSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TableSink for JsonTableSink {
    async fn write_table(&self, table: &FinalTable) -> anyhow::Result<()> {
        ensure_parent_dir(&self.path)?;
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        let document = serde_json::json!({
            "sheet": table.sheet_name,
            "columns": table.columns,
            "rows": table.rows,
        });
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        info!(
            path = %self.path.display(),
            sheet = %table.sheet_name,
            rows = table.len(),
            "Wrote JSON table"
        );
        Ok(())
    }
}
