//! Attach generated descriptions to merged listings.

use super::address_of;
use crate::error::Result;
use crate::eval::records::Record;
use crate::generate::journal::{read_journal, DescriptionRecord};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load descriptions from either the JSON-lines generation log or a legacy
/// JSON array of `{address, description}` objects.
pub fn load_descriptions(path: &Path) -> Result<Vec<DescriptionRecord>> {
    let content = std::fs::read_to_string(path)?;
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(&content)?);
    }
    read_journal(path)
}

/// Set `description` on every listing: the generated text matched by address,
/// or null when no successful description exists. Returns the number matched.
pub fn attach_descriptions(listings: &mut [Record], descriptions: &[DescriptionRecord]) -> usize {
    let lookup: HashMap<&str, &str> = descriptions
        .iter()
        .filter(|d| d.is_success())
        .map(|d| (d.address.as_str(), d.description.as_str()))
        .collect();

    let mut matched = 0;
    for listing in listings.iter_mut() {
        let description = address_of(listing).and_then(|addr| lookup.get(addr).copied());
        let value = match description {
            Some(text) => {
                matched += 1;
                Value::String(text.to_string())
            }
            None => Value::Null,
        };
        listing.insert("description".to_string(), value);
    }

    log::info!(
        "Attached descriptions to {}/{} listings",
        matched,
        listings.len()
    );
    matched
}
