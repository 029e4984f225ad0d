// CSV export of the readings sheet.
//
// The spreadsheet itself is read by the upload layer; this loader exists so
// the command-line tool can analyze a sheet saved as CSV. Every cell comes
// through as text and is typed later by the normalizer.
use crate::ingest::table::{RawCell, RawTable};
use std::io::Read;
use std::path::Path;

/// Reads a CSV document (header row first) into a `RawTable`.
///
/// Ragged rows are accepted; the normalizer pads them.
pub fn read_raw_table<R: Read>(reader: R) -> Result<RawTable, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    let mut rows: Vec<Vec<RawCell>> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(RawCell::from).collect());
    }
    Ok(RawTable { headers, rows })
}

pub fn load_raw_table(path: impl AsRef<Path>) -> Result<RawTable, csv::Error> {
    let file = std::fs::File::open(path)?;
    read_raw_table(file)
}
