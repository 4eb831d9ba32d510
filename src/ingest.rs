//! Loading an uploaded file into a [`Dataset`].
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read with
//! `calamine`; anything else is treated as delimited text. Every failure to
//! produce a table is reported as [`InsightError::Ingestion`].

use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Reader, open_workbook_auto};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    data::{CellValue, Dataset, infer_cell},
    error::InsightError,
    io_utils,
};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Worksheet to read; the first sheet when absent.
    pub sheet: Option<String>,
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            delimiter: None,
            encoding: encoding_rs::UTF_8,
        }
    }
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

pub fn load_dataset(path: &Path, options: &IngestOptions) -> Result<Dataset, InsightError> {
    let dataset = if is_workbook(path) {
        load_workbook(path, options.sheet.as_deref())?
    } else {
        load_delimited(path, options)?
    };
    if dataset.headers().is_empty() {
        return Err(InsightError::ingestion(path, "no header row found"));
    }
    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        dataset.row_count(),
        dataset.headers().len(),
        path
    );
    Ok(dataset)
}

fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<Dataset, InsightError> {
    let mut workbook = open_workbook_auto(path).map_err(|err| InsightError::ingestion(path, err))?;
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| InsightError::ingestion(path, "workbook contains no worksheets"))?,
    };
    debug!("Reading worksheet '{sheet_name}' from {path:?}");
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| InsightError::ingestion(path, format!("worksheet '{sheet_name}': {err}")))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Dataset::default());
    };
    let headers = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_name(cell, idx))
        .collect::<Vec<_>>();
    let records = rows
        .map(|row| row.iter().map(workbook_cell).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();
    Ok(Dataset::new(headers, records))
}

fn header_name(cell: &Data, idx: usize) -> String {
    let name = workbook_cell(cell).as_display();
    if name.trim().is_empty() {
        format!("column_{}", idx + 1)
    } else {
        name
    }
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Text(cell.to_string()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn load_delimited(path: &Path, options: &IngestOptions) -> Result<Dataset, InsightError> {
    let to_error = |err: anyhow::Error| InsightError::ingestion(PathBuf::from(path), format!("{err:#}"));
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    debug!(
        "Reading delimited text from {path:?} with delimiter '{}'",
        io_utils::printable_delimiter(delimiter)
    );
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter).map_err(to_error)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding).map_err(to_error)?;
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|err| {
            InsightError::ingestion(path, format!("row {}: {err}", row_idx + 2))
        })?;
        let decoded = io_utils::decode_record(&record, options.encoding).map_err(to_error)?;
        if decoded.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(decoded.iter().map(|field| infer_cell(field)).collect());
    }
    Ok(Dataset::new(headers, rows))
}
