//! Listing data steps: merging property/rent/sale exports, extracting
//! addresses for description generation, and attaching generated descriptions.
//!
//! Listings are heterogeneous JSON objects keyed by `formattedAddress`; fields
//! other than the join key are carried through untouched.

pub mod descriptions;
pub mod merge;

use crate::error::{PropevalError, Result};
use crate::eval::records::Record;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

pub use descriptions::{attach_descriptions, load_descriptions};
pub use merge::{extract_addresses, load_addresses, merge_listings, AddressEntry};

/// Join key shared by every listing export.
pub const ADDRESS_FIELD: &str = "formattedAddress";

/// Read a JSON array of listing objects.
pub fn load_listings(path: &Path) -> Result<Vec<Record>> {
    crate::eval::records::load_records(path)
}

/// Write any serializable value as pretty-printed JSON.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    std::fs::write(path, json)?;
    Ok(())
}

/// The listing's `formattedAddress`, if it is a string.
pub fn address_of(record: &Record) -> Option<&str> {
    record.get(ADDRESS_FIELD).and_then(Value::as_str)
}

fn require_address<'a>(record: &'a Record, source: &str, idx: usize) -> Result<&'a str> {
    address_of(record).ok_or_else(|| {
        PropevalError::Parse(format!(
            "{} record {} has no string {}",
            source, idx, ADDRESS_FIELD
        ))
    })
}
