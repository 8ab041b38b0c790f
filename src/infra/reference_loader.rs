use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::info;

use crate::domain::{ReferenceRow, ReferenceTable};
use crate::error::{PipelineError, Result};

/// Load the postcode reference table from a CSV file with `postcode,city,state` columns.
///
/// Any failure to open or read the file is a [`PipelineError::ReferenceData`].
pub fn load_reference_csv<P: AsRef<Path>>(path: P) -> Result<ReferenceTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        PipelineError::ReferenceData(format!("Cannot open '{}': {}", path.display(), e))
    })?;
    let table = read_reference_csv(file)?;
    info!(path = %path.display(), postcodes = table.len(), "Loaded postcode reference table");
    Ok(table)
}

/// Read reference rows from any CSV source. Extra columns are ignored.
pub fn read_reference_csv<R: Read>(reader: R) -> Result<ReferenceTable> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let rows = rdr
        .deserialize::<ReferenceRow>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| PipelineError::ReferenceData(format!("Malformed reference row: {e}")))?;
    if rows.is_empty() {
        return Err(PipelineError::ReferenceData("Reference table has no rows".to_string()));
    }
    Ok(ReferenceTable::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_rows_as_text_and_ignores_extra_columns() {
        let csv = "postcode,city,state,country\n\
                   01000,Kangar,Perlis,MY\n\
                   43000 , Kajang , Selangor,MY\n";
        let table = read_reference_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("01000").map(|a| a.district.as_str()), Some("Kangar"));
        assert_eq!(table.lookup("43000").map(|a| a.district.as_str()), Some("Kajang"));
    }

    #[test]
    fn test_missing_column_is_reference_error() {
        let err = read_reference_csv("postcode,state\n43000,Selangor\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::ReferenceData(_)));
    }

    #[test]
    fn test_header_only_is_reference_error() {
        let err = read_reference_csv("postcode,city,state\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::ReferenceData(_)));
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postcodes.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "postcode,city,state").unwrap();
        writeln!(file, "43000,Kajang,Selangor").unwrap();
        drop(file);

        assert_eq!(load_reference_csv(&path).unwrap().len(), 1);
        let err = load_reference_csv(dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::ReferenceData(_)));
    }
}
