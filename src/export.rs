//! Delimited export of the derived table.
//!
//! Values are written undecorated (no currency symbols or grouping) so that
//! re-reading the file reproduces the derived numbers.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use log::info;

use crate::{data::format_plain_number, io_utils, metrics::DerivedTable};

pub fn derived_records(table: &DerivedTable) -> impl Iterator<Item = Vec<String>> + '_ {
    table.rows.iter().map(|row| {
        let mut record = row
            .cells
            .iter()
            .map(|cell| cell.as_display())
            .collect::<Vec<_>>();
        record.push(row.revenue().map(format_plain_number).unwrap_or_default());
        record
    })
}

pub fn write_derived<W: Write>(writer: &mut csv::Writer<W>, table: &DerivedTable) -> Result<usize> {
    writer
        .write_record(&table.headers)
        .context("Writing export header")?;
    let mut written = 0usize;
    for record in derived_records(table) {
        writer
            .write_record(&record)
            .with_context(|| format!("Writing export row {}", written + 1))?;
        written += 1;
    }
    writer.flush().context("Flushing export")?;
    Ok(written)
}

pub fn export_to_path(path: &Path, delimiter: u8, table: &DerivedTable) -> Result<usize> {
    let mut writer = io_utils::open_csv_writer(Some(path), delimiter)?;
    let written = write_derived(&mut writer, table)?;
    info!(
        "Exported {written} derived row(s) to {:?} using delimiter '{}'",
        path,
        io_utils::printable_delimiter(delimiter)
    );
    Ok(written)
}
