//! School tally: number of schools per ZIP code, written as CSV.

use crate::error::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

/// Top-level layout of the schools export: `{"results": [...]}`.
#[derive(Debug, Deserialize)]
pub struct SchoolsFile {
    pub results: Vec<SchoolRecord>,
}

/// A single school; only its ZIP code matters here.
#[derive(Debug, Deserialize)]
pub struct SchoolRecord {
    pub zip_location: ZipCode,
}

/// ZIP codes arrive as strings or bare numbers depending on the export.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ZipCode {
    Text(String),
    Number(serde_json::Number),
}

impl ZipCode {
    pub fn as_key(&self) -> String {
        match self {
            ZipCode::Text(s) => s.clone(),
            ZipCode::Number(n) => n.to_string(),
        }
    }
}

/// Load the schools export from disk.
pub fn load_schools(path: &Path) -> Result<Vec<SchoolRecord>> {
    let content = std::fs::read_to_string(path)?;
    let file: SchoolsFile = serde_json::from_str(&content)?;
    Ok(file.results)
}

/// Count schools per ZIP code, ordered by ZIP.
pub fn count_by_zip(schools: &[SchoolRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for school in schools {
        *counts.entry(school.zip_location.as_key()).or_insert(0) += 1;
    }
    counts
}

/// Write `Zipcode,SchoolCount` rows to any writer.
pub fn write_counts<W: Write>(counts: &BTreeMap<String, usize>, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Zipcode", "SchoolCount"])?;
    for (zip, count) in counts {
        let count = count.to_string();
        wtr.write_record([zip.as_str(), count.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CountRow {
    #[serde(rename = "Zipcode")]
    zipcode: String,
    #[serde(rename = "SchoolCount")]
    school_count: usize,
}

/// Read `Zipcode,SchoolCount` rows back, as written by [`write_counts`].
pub fn read_counts<R: Read>(reader: R) -> Result<BTreeMap<String, usize>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut counts = BTreeMap::new();
    for row in rdr.deserialize() {
        let row: CountRow = row?;
        counts.insert(row.zipcode, row.school_count);
    }
    Ok(counts)
}

/// Load the per-ZIP school counts CSV from disk.
pub fn load_counts(path: &Path) -> Result<BTreeMap<String, usize>> {
    let file = std::fs::File::open(path)?;
    read_counts(file)
}

/// Tally `input` and write the CSV to `output`. Returns the number of distinct ZIP codes.
pub fn tally_schools(input: &Path, output: &Path) -> Result<usize> {
    let schools = load_schools(input)?;
    let counts = count_by_zip(&schools);
    log::info!(
        "Counted {} schools across {} ZIP codes",
        schools.len(),
        counts.len()
    );
    let file = std::fs::File::create(output)?;
    write_counts(&counts, file)?;
    Ok(counts.len())
}
