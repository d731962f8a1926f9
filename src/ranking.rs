//! Weighted property ranking from per-ZIP neighborhood data.
//!
//! Every property gets eight factor scores in [0, 1] (schools, crime, hospitals,
//! price, size, investment score, rental yield, days on market). The ranking
//! score is their weighted sum, and properties are sorted by it, highest first.

use crate::error::Result;
use crate::eval::records::Record;
use crate::schools::{load_counts, ZipCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Field added to every ranked listing.
pub const SCORE_FIELD: &str = "rankingScore";

/// Scale `value` from [min, max] into [0, 1], clamping outside values.
///
/// NaN scores 0. A degenerate range scores 1 (or 0 when inverted).
pub fn normalize(value: f64, min: f64, max: f64, inverse: bool) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    if min == max {
        return if inverse { 0.0 } else { 1.0 };
    }
    let normalized = ((value - min) / (max - min)).clamp(0.0, 1.0);
    if inverse {
        1.0 - normalized
    } else {
        normalized
    }
}

/// Letter grade to number: A=1 through F=5. Missing or unknown grades are 0.
pub fn grade_to_score(grade: Option<&str>) -> f64 {
    match grade.map(str::to_uppercase).as_deref() {
        Some("A") => 1.0,
        Some("B") => 2.0,
        Some("C") => 3.0,
        Some("D") => 4.0,
        Some("F") => 5.0,
        _ => 0.0,
    }
}

/// One row of the crime export.
#[derive(Debug, Clone, Deserialize)]
pub struct CrimeStats {
    #[serde(rename = "Zipcode")]
    pub zipcode: ZipCode,
    #[serde(rename = "Property Crime Grade", default)]
    pub property_grade: Option<String>,
    #[serde(rename = "Total Property Crime", default)]
    pub property_total: Option<f64>,
    #[serde(rename = "Violent Crime Grade", default)]
    pub violent_grade: Option<String>,
    #[serde(rename = "Total Violent Crime", default)]
    pub violent_total: Option<f64>,
}

/// One row of the hospital export.
#[derive(Debug, Clone, Deserialize)]
pub struct HospitalCount {
    #[serde(rename = "Zipcode")]
    pub zipcode: ZipCode,
    #[serde(rename = "HospitalCount")]
    pub count: f64,
}

/// Neighborhood lookups keyed by ZIP code.
#[derive(Debug, Default)]
pub struct NeighborhoodData {
    crime: HashMap<String, CrimeStats>,
    hospitals: HashMap<String, f64>,
    schools: HashMap<String, f64>,
}

impl NeighborhoodData {
    /// Build the lookups. A ZIP listed twice keeps its last row.
    pub fn new(
        crime: Vec<CrimeStats>,
        hospitals: Vec<HospitalCount>,
        schools: &BTreeMap<String, usize>,
    ) -> Self {
        Self {
            crime: crime
                .into_iter()
                .map(|c| (zip_key(&c.zipcode.as_key()), c))
                .collect(),
            hospitals: hospitals
                .into_iter()
                .map(|h| (zip_key(&h.zipcode.as_key()), h.count))
                .collect(),
            schools: schools
                .iter()
                .map(|(zip, count)| (zip_key(zip), *count as f64))
                .collect(),
        }
    }

    /// Load the crime and hospital JSON arrays and the school counts CSV.
    pub fn load(crime_path: &Path, hospital_path: &Path, school_counts_path: &Path) -> Result<Self> {
        let crime: Vec<CrimeStats> = serde_json::from_str(&std::fs::read_to_string(crime_path)?)?;
        let hospitals: Vec<HospitalCount> =
            serde_json::from_str(&std::fs::read_to_string(hospital_path)?)?;
        let schools = load_counts(school_counts_path)?;
        log::info!(
            "Loaded neighborhood data: {} crime, {} hospital, {} school ZIP codes",
            crime.len(),
            hospitals.len(),
            schools.len()
        );
        Ok(Self::new(crime, hospitals, &schools))
    }
}

/// Numeric ZIP codes compare by value, so "02139" and 2139 are the same key.
fn zip_key(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .parse::<u64>()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| trimmed.to_string())
}

/// Per-factor weights. Factors missing from a weights object count 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankingWeights {
    pub school: f64,
    pub crime_rate: f64,
    pub hospital: f64,
    pub price: f64,
    pub size: f64,
    pub investment_score: f64,
    pub rental_yield: f64,
    pub days_on_market: f64,
}

impl RankingWeights {
    /// The general-purpose weighting used when a query brings none.
    pub fn standard() -> Self {
        Self {
            school: 0.15,
            crime_rate: 0.15,
            hospital: 0.1,
            price: 0.15,
            size: 0.1,
            investment_score: 0.15,
            rental_yield: 0.15,
            days_on_market: 0.05,
        }
    }
}

/// Factor scores of one property, each in [0, 1].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorScores {
    pub school: f64,
    pub crime_rate: f64,
    pub hospital: f64,
    pub price: f64,
    pub size: f64,
    pub investment_score: f64,
    pub rental_yield: f64,
    pub days_on_market: f64,
}

impl FactorScores {
    pub fn weighted(&self, weights: &RankingWeights) -> f64 {
        self.school * weights.school
            + self.crime_rate * weights.crime_rate
            + self.hospital * weights.hospital
            + self.price * weights.price
            + self.size * weights.size
            + self.investment_score * weights.investment_score
            + self.rental_yield * weights.rental_yield
            + self.days_on_market * weights.days_on_market
    }
}

/// Score every factor of `property` against the neighborhood data.
pub fn factor_scores(property: &Record, data: &NeighborhoodData) -> FactorScores {
    let zip = property.get("zipCode").map(|v| match v {
        Value::String(s) => zip_key(s),
        other => zip_key(&other.to_string()),
    });
    let crime = zip.as_ref().and_then(|z| data.crime.get(z));
    let hospitals = zip.as_ref().and_then(|z| data.hospitals.get(z)).copied();
    let schools = zip.as_ref().and_then(|z| data.schools.get(z)).copied();

    let best = grade_to_score(Some("A"));
    let worst = grade_to_score(Some("F"));
    let (property_grade, violent_grade, property_total, violent_total) = match crime {
        Some(c) => (
            grade_to_score(c.property_grade.as_deref()),
            grade_to_score(c.violent_grade.as_deref()),
            c.property_total.unwrap_or(f64::NAN),
            c.violent_total.unwrap_or(f64::NAN),
        ),
        None => (0.0, 0.0, 0.0, 0.0),
    };
    let crime_rate = normalize(
        (best - property_grade)
            + (best - violent_grade)
            + normalize(property_total, 0.0, 500.0, true)
            + normalize(violent_total, 0.0, 100.0, true),
        0.0,
        (worst - best) * 2.0 + 2.0,
        false,
    );

    let price = match numeric_field(property, "price") {
        Some(p) if p != 0.0 && !p.is_nan() => p,
        _ => 1_000_000.0,
    };

    FactorScores {
        school: normalize(schools.unwrap_or(0.0), 0.0, 15.0, false),
        crime_rate,
        hospital: normalize(hospitals.unwrap_or(0.0), 0.0, 5.0, false),
        price: normalize(price, 0.0, 2_000_000.0, true),
        size: normalize(numeric_field(property, "squareFootage").unwrap_or(0.0), 0.0, 3000.0, false),
        investment_score: normalize(
            numeric_field(property, "investmentScore").unwrap_or(0.0),
            0.0,
            10.0,
            false,
        ),
        rental_yield: normalize(
            numeric_field(property, "rentalYield").unwrap_or(0.0),
            0.0,
            10.0,
            false,
        ),
        days_on_market: normalize(
            numeric_field(property, "daysOnMarket").unwrap_or(365.0),
            0.0,
            365.0,
            true,
        ),
    }
}

/// A numeric listing field. `None` when absent or null; NaN when not a number.
fn numeric_field(record: &Record, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::Null => None,
        Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => Some(s.trim().parse().unwrap_or(f64::NAN)),
        Value::Array(_) | Value::Object(_) => Some(f64::NAN),
    }
}

/// A listing with its ranking score.
#[derive(Debug, Clone)]
pub struct RankedProperty {
    pub score: f64,
    /// The input listing with [`SCORE_FIELD`] added.
    pub record: Record,
}

impl RankedProperty {
    pub fn id(&self) -> Option<&str> {
        self.record.get("id").and_then(Value::as_str)
    }
}

/// Score and sort `properties`, highest score first. Ties keep input order.
pub fn rank_properties(
    properties: &[Record],
    weights: &RankingWeights,
    data: &NeighborhoodData,
) -> Vec<RankedProperty> {
    let mut ranked: Vec<RankedProperty> = properties
        .iter()
        .map(|property| {
            let score = factor_scores(property, data).weighted(weights);
            let mut record = property.clone();
            record.insert(SCORE_FIELD.to_string(), Value::from(score));
            RankedProperty { score, record }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}
