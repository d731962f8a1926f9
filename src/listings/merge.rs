//! Merge property, rent and sale exports into one record per address.

use super::{require_address, ADDRESS_FIELD};
use crate::error::Result;
use crate::eval::records::{is_truthy, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// One entry of the address list fed to description generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressEntry {
    pub formatted_address: String,
}

/// Merge listings by `formattedAddress`.
///
/// Addresses are visited in first-seen order across properties, then rents,
/// then sales. The first property with an address wins; for rents and sales the
/// last record per address wins. Each output carries `id`, `formattedAddress`,
/// the property's own fields, `rentInfo` and `saleInfo` (null when absent).
pub fn merge_listings(
    properties: &[Record],
    rents: &[Record],
    sales: &[Record],
) -> Result<Vec<Record>> {
    let mut property_by_address: HashMap<&str, &Record> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (idx, prop) in properties.iter().enumerate() {
        let addr = require_address(prop, "property", idx)?;
        property_by_address.entry(addr).or_insert(prop);
        if seen.insert(addr) {
            order.push(addr);
        }
    }

    let mut rent_by_address: HashMap<&str, &Record> = HashMap::new();
    for (idx, rent) in rents.iter().enumerate() {
        let addr = require_address(rent, "rent", idx)?;
        rent_by_address.insert(addr, rent);
        if seen.insert(addr) {
            order.push(addr);
        }
    }

    let mut sale_by_address: HashMap<&str, &Record> = HashMap::new();
    for (idx, sale) in sales.iter().enumerate() {
        let addr = require_address(sale, "sale", idx)?;
        sale_by_address.insert(addr, sale);
        if seen.insert(addr) {
            order.push(addr);
        }
    }

    let merged: Vec<Record> = order
        .into_iter()
        .map(|addr| {
            let prop = property_by_address.get(addr).copied();
            let rent = rent_by_address.get(addr).copied();
            let sale = sale_by_address.get(addr).copied();

            let id = [prop, sale, rent]
                .into_iter()
                .flatten()
                .filter_map(|r| r.get("id"))
                .find(|id| is_truthy(id))
                .cloned()
                .unwrap_or_else(|| Value::String(addr.to_string()));

            let mut out = Record::new();
            out.insert("id".to_string(), id);
            out.insert(ADDRESS_FIELD.to_string(), Value::String(addr.to_string()));
            if let Some(prop) = prop {
                for (key, value) in prop {
                    out.insert(key.clone(), value.clone());
                }
            }
            out.insert(
                "rentInfo".to_string(),
                rent.map(|r| Value::Object(r.clone())).unwrap_or(Value::Null),
            );
            out.insert(
                "saleInfo".to_string(),
                sale.map(|s| Value::Object(s.clone())).unwrap_or(Value::Null),
            );
            out
        })
        .collect();

    log::info!(
        "Merged {} properties, {} rents, {} sales into {} listings",
        properties.len(),
        rents.len(),
        sales.len(),
        merged.len()
    );
    Ok(merged)
}

/// Address list for description generation, in listing order.
pub fn extract_addresses(merged: &[Record]) -> Result<Vec<AddressEntry>> {
    merged
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            Ok(AddressEntry {
                formatted_address: require_address(record, "listing", idx)?.to_string(),
            })
        })
        .collect()
}

/// Read an address list written by [`extract_addresses`].
pub fn load_addresses(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let entries: Vec<AddressEntry> = serde_json::from_str(&content)?;
    Ok(entries.into_iter().map(|e| e.formatted_address).collect())
}
