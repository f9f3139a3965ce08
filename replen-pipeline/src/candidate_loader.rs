//! CSV candidate loader.
//!
//! Parses the wide per-product CSV the planning team exports. Only `name`,
//! `department`, `price`, and `pack_size` are genuinely required; every
//! other column is optional with a tolerant default so partial exports
//! still load. Expected columns:
//!   name, department, supplier, price, margin_pct, pack_size, stock,
//!   avg_daily_sales, demand_cv, trend, trend_pct, days_since_delivery,
//!   days_since_order, lead_time_days, historical_avg_order_qty,
//!   lookalike_daily_sales, expiry_returns, moq_floor, units_sold_last_90d,
//!   is_staple, is_fresh, is_key_sku, is_consignment, is_sunset, is_promo,
//!   anchor_override, abc_rank, xyz_rank

use std::io::Read;

use serde::{Deserialize, Deserializer};

use replen_policy::{AbcRank, SkuSnapshot, Trend, XyzRank};

use crate::error::{LoadError, LoadResult};
use crate::reference::ReferenceData;
use crate::types::ProductCandidate;

/// Unknown order recency must read as "long ago", not "just now", or the
/// in-transit gate would suppress every order in a partial export.
const UNKNOWN_DAYS_SINCE_ORDER: f64 = 999.0;

fn default_days_since_order() -> f64 {
    UNKNOWN_DAYS_SINCE_ORDER
}

/// One row of the candidate CSV, field names matching the column headers.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub margin_pct: f64,
    #[serde(default)]
    pub pack_size: u32,
    #[serde(default)]
    pub stock: f64,
    #[serde(default)]
    pub avg_daily_sales: f64,
    #[serde(default)]
    pub demand_cv: f64,
    #[serde(default, deserialize_with = "deserialize_trend")]
    pub trend: Trend,
    #[serde(default)]
    pub trend_pct: f64,
    #[serde(default)]
    pub days_since_delivery: f64,
    #[serde(default = "default_days_since_order")]
    pub days_since_order: f64,
    #[serde(default)]
    pub lead_time_days: f64,
    #[serde(default)]
    pub historical_avg_order_qty: f64,
    #[serde(default)]
    pub lookalike_daily_sales: f64,
    #[serde(default)]
    pub expiry_returns: u32,
    #[serde(default)]
    pub moq_floor: u32,
    #[serde(default)]
    pub units_sold_last_90d: f64,
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub is_staple: bool,
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub is_fresh: bool,
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub is_key_sku: bool,
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub is_consignment: bool,
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub is_sunset: bool,
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub is_promo: bool,
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub anchor_override: bool,
    #[serde(default, deserialize_with = "deserialize_abc")]
    pub abc_rank: AbcRank,
    #[serde(default, deserialize_with = "deserialize_xyz")]
    pub xyz_rank: XyzRank,
}

impl CandidateRecord {
    /// Build the pipeline candidate, merging in reference-table knowledge:
    /// the curated staple list and the no-capital supplier set.
    pub fn to_candidate(&self, reference: &ReferenceData) -> ProductCandidate {
        ProductCandidate {
            name: self.name.clone(),
            department: self.department.clone(),
            supplier: self.supplier.clone(),
            price: self.price,
            margin_pct: self.margin_pct,
            is_consignment: self.is_consignment || reference.is_no_capital(&self.supplier),
            anchor_override: self.anchor_override,
            sku: SkuSnapshot {
                price: self.price,
                pack_size: self.pack_size,
                current_stock: self.stock,
                avg_daily_sales: self.avg_daily_sales,
                demand_cv: self.demand_cv,
                trend: self.trend,
                trend_pct: self.trend_pct,
                days_since_delivery: self.days_since_delivery,
                days_since_order: self.days_since_order,
                lead_time_days: self.lead_time_days,
                historical_avg_order_qty: self.historical_avg_order_qty,
                lookalike_daily_sales: self.lookalike_daily_sales,
                expiry_returns: self.expiry_returns,
                moq_floor: self.moq_floor,
                units_sold_last_90d: self.units_sold_last_90d,
                is_staple: self.is_staple || reference.is_staple(&self.name),
                is_fresh: self.is_fresh,
                is_key_sku: self.is_key_sku,
                is_sunset: self.is_sunset,
                is_promo: self.is_promo,
                abc: self.abc_rank,
                xyz: self.xyz_rank,
            },
            planned_qty: 0,
            decision_tags: Vec::new(),
            rounding: None,
            desirability: None,
        }
    }
}

/// Load candidate records from a CSV reader.
pub fn load_candidates<R: Read>(reader: R) -> LoadResult<Vec<CandidateRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: CandidateRecord = result.map_err(|source| LoadError::Csv {
            line: line_num + 2,
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Load candidate records from a CSV file path.
pub fn load_candidates_file(path: &str) -> LoadResult<Vec<CandidateRecord>> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_string(),
        source,
    })?;
    load_candidates(file)
}

/// Group records by department, sorted by department name.
pub fn group_by_department(records: &[CandidateRecord]) -> Vec<(String, Vec<CandidateRecord>)> {
    let mut groups: std::collections::HashMap<String, Vec<CandidateRecord>> =
        std::collections::HashMap::new();
    for record in records {
        groups
            .entry(record.department.clone())
            .or_default()
            .push(record.clone());
    }
    let mut result: Vec<_> = groups.into_iter().collect();
    result.sort_by(|a, b| a.0.cmp(&b.0));
    result
}

/// Flexible bool deserializer: handles "true"/"false", "1"/"0", "yes"/"no".
fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_lowercase().trim() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected bool value, got '{}'",
            other
        ))),
    }
}

fn deserialize_trend<'de, D>(deserializer: D) -> Result<Trend, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_lowercase().trim() {
        "growing" | "up" | "rising" => Ok(Trend::Growing),
        "declining" | "down" | "falling" => Ok(Trend::Declining),
        "stable" | "flat" | "" => Ok(Trend::Stable),
        other => Err(serde::de::Error::custom(format!(
            "expected trend value, got '{}'",
            other
        ))),
    }
}

fn deserialize_abc<'de, D>(deserializer: D) -> Result<AbcRank, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_uppercase().trim() {
        "A" => Ok(AbcRank::A),
        "B" | "" => Ok(AbcRank::B),
        "C" => Ok(AbcRank::C),
        other => Err(serde::de::Error::custom(format!(
            "expected ABC rank, got '{}'",
            other
        ))),
    }
}

fn deserialize_xyz<'de, D>(deserializer: D) -> Result<XyzRank, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_uppercase().trim() {
        "X" => Ok(XyzRank::X),
        "Y" | "" => Ok(XyzRank::Y),
        "Z" => Ok(XyzRank::Z),
        other => Err(serde::de::Error::custom(format!(
            "expected XYZ rank, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
name,department,supplier,price,margin_pct,pack_size,stock,avg_daily_sales,demand_cv,trend,trend_pct,days_since_delivery,days_since_order,lead_time_days,historical_avg_order_qty,lookalike_daily_sales,expiry_returns,moq_floor,units_sold_last_90d,is_staple,is_fresh,is_key_sku,is_consignment,is_sunset,is_promo,anchor_override,abc_rank,xyz_rank
Milk 1L,DAIRY,NordFood,1.20,22,12,8,14,0.2,stable,0,2,10,2,0,0,0,0,1260,1,1,1,0,0,0,0,A,X
Craft Candle,HOME,Lumo,24.00,45,6,0,0,0,growing,18,0,999,7,0,1.5,0,0,0,0,0,0,0,0,0,0,C,Z
Legacy Sauce,GROCERY,OldCo,3.10,30,12,40,0,0,stable,0,250,999,7,0,0,0,0,0,0,0,0,0,0,0,0,B,Y
";

    #[test]
    fn load_sample_csv() {
        let records = load_candidates(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "Milk 1L");
        assert_eq!(records[0].department, "DAIRY");
        assert!((records[0].price - 1.20).abs() < 1e-9);
        assert_eq!(records[0].pack_size, 12);
        assert!(records[0].is_staple);
        assert!(records[0].is_key_sku);
        assert_eq!(records[0].abc_rank, AbcRank::A);
        assert_eq!(records[1].trend, Trend::Growing);
        assert_eq!(records[1].xyz_rank, XyzRank::Z);
        assert!((records[2].days_since_delivery - 250.0).abs() < 1e-9);
    }

    #[test]
    fn missing_optional_columns_take_defaults() {
        let csv_data = "\
name,department,price,pack_size
Water 5L,GROCERY,2.50,6
";
        let records = load_candidates(csv_data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.supplier, "");
        assert_eq!(r.stock, 0.0);
        assert_eq!(r.trend, Trend::Stable);
        assert_eq!(r.abc_rank, AbcRank::B);
        assert_eq!(r.xyz_rank, XyzRank::Y);
        assert!(!r.is_staple);
        // unknown recency must not look like a just-placed order
        assert!((r.days_since_order - UNKNOWN_DAYS_SINCE_ORDER).abs() < 1e-9);
    }

    #[test]
    fn bool_parsing_handles_variants() {
        let csv_data = "\
name,department,price,pack_size,is_staple,is_fresh,is_key_sku
A,D1,1.0,1,1,yes,true
B,D1,1.0,1,0,no,false
C,D1,1.0,1,,,
";
        let records = load_candidates(csv_data.as_bytes()).unwrap();
        assert!(records[0].is_staple && records[0].is_fresh && records[0].is_key_sku);
        assert!(!records[1].is_staple && !records[1].is_fresh && !records[1].is_key_sku);
        assert!(!records[2].is_staple && !records[2].is_fresh && !records[2].is_key_sku);
    }

    #[test]
    fn malformed_row_reports_line_number() {
        let csv_data = "\
name,department,price,pack_size
Good,D1,1.0,1
Bad,D1,not-a-number,1
";
        let err = load_candidates(csv_data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"), "got: {err}");
    }

    #[test]
    fn group_records_by_department() {
        let records = load_candidates(SAMPLE_CSV.as_bytes()).unwrap();
        let groups = group_by_department(&records);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0, "DAIRY");
        assert_eq!(groups[0].1.len(), 1);
    }

    #[test]
    fn to_candidate_merges_reference_knowledge() {
        let reference = ReferenceData::with_tables(
            Default::default(),
            ["Legacy Sauce".to_string()].into_iter().collect(),
            ["Lumo".to_string()].into_iter().collect(),
        );
        let records = load_candidates(SAMPLE_CSV.as_bytes()).unwrap();
        let sauce = records[2].to_candidate(&reference);
        assert!(sauce.sku.is_staple, "staple list should apply by name");
        let candle = records[1].to_candidate(&reference);
        assert!(candle.is_consignment, "no-capital supplier forces consignment");
    }
}
