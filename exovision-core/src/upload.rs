//! CSV upload parsing for file-based batch prediction.

use crate::error::{ExovisionError, Result};
use crate::features::{FeatureRecord, RecordSchema};

/// Whether an uploaded file name looks like a CSV file.
pub fn is_csv_filename(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".csv")
}

/// Parse an uploaded CSV into feature records, one per data row, in order.
///
/// The first non-comment line is the header. Lines starting with `#` are
/// skipped, as in NASA Exoplanet Archive exports. More than `max_rows` data
/// rows is `BatchTooLarge`.
pub fn parse_csv(bytes: &[u8], max_rows: usize) -> Result<Vec<FeatureRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ExovisionError::invalid_upload(format!("cannot read CSV header: {}", e)))?
        .clone();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ExovisionError::invalid_upload("CSV file has no header row"));
    }

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ExovisionError::invalid_upload(format!("malformed CSV: {}", e)))?;

    if rows.len() > max_rows {
        return Err(ExovisionError::BatchTooLarge {
            size: rows.len(),
            max: max_rows,
        });
    }

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            FeatureRecord::from_csv_row(headers.iter(), row.iter(), RecordSchema::Open)
                .map_err(|e| e.in_row(idx + 1))
        })
        .collect()
}
