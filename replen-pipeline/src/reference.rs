//! Reference tables that steer an allocation run.
//!
//! Three small curated files, all optional:
//! - department capital weights (CSV: `department,weight`)
//! - staple product list (JSON array of product names)
//! - no-capital supplier list (JSON array of supplier names) — goods from
//!   these suppliers arrive on consignment and never draw cash
//!
//! Missing files degrade to empty tables with a logged warning, never an
//! error: a run without reference data is still a valid (if blunt) run.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use log::warn;

use crate::error::{LoadError, LoadResult};

/// Department weights are expected to sum to 1.0 within this tolerance.
const WEIGHT_SUM_TOLERANCE: f64 = 0.02;

#[derive(Clone, Debug, Default)]
pub struct ReferenceData {
    /// Department name (uppercase) -> fraction of the budget.
    weights: HashMap<String, f64>,
    /// Uppercase product names that count as staples.
    staples: HashSet<String>,
    /// Uppercase supplier names whose goods are consignment.
    no_capital_suppliers: HashSet<String>,
}

impl ReferenceData {
    /// Build directly from in-memory tables (keys are normalized here).
    pub fn with_tables(
        weights: HashMap<String, f64>,
        staples: HashSet<String>,
        no_capital_suppliers: HashSet<String>,
    ) -> Self {
        ReferenceData {
            weights: weights
                .into_iter()
                .map(|(k, v)| (normalize(&k), v))
                .collect(),
            staples: staples.iter().map(|s| normalize(s)).collect(),
            no_capital_suppliers: no_capital_suppliers.iter().map(|s| normalize(s)).collect(),
        }
    }

    /// Load from optional file paths. Absent paths (or `None`) yield empty
    /// tables; present-but-unreadable files are real errors.
    pub fn from_files(
        weights_csv: Option<&str>,
        staples_json: Option<&str>,
        no_capital_json: Option<&str>,
    ) -> LoadResult<Self> {
        let weights = match open_optional(weights_csv)? {
            Some(file) => parse_department_weights(file)?,
            None => {
                if weights_csv.is_some() {
                    warn!("department weights file missing; all spend routes to GENERAL");
                }
                HashMap::new()
            }
        };
        let staples = match open_optional(staples_json)? {
            Some(file) => parse_name_list(file)?,
            None => HashSet::new(),
        };
        let no_capital = match open_optional(no_capital_json)? {
            Some(file) => parse_name_list(file)?,
            None => HashSet::new(),
        };
        Ok(ReferenceData::with_tables(weights, staples, no_capital))
    }

    pub fn department_weights(&self) -> &HashMap<String, f64> {
        &self.weights
    }

    pub fn is_staple(&self, product_name: &str) -> bool {
        self.staples.contains(&normalize(product_name))
    }

    pub fn is_no_capital(&self, supplier: &str) -> bool {
        !supplier.is_empty() && self.no_capital_suppliers.contains(&normalize(supplier))
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_uppercase()
}

fn open_optional(path: Option<&str>) -> LoadResult<Option<std::fs::File>> {
    let Some(path) = path else { return Ok(None) };
    if !Path::new(path).exists() {
        warn!("reference file '{}' not found; using empty table", path);
        return Ok(None);
    }
    std::fs::File::open(path)
        .map(Some)
        .map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })
}

/// Parse the `department,weight` CSV. Weights that do not sum to ~1.0 are
/// accepted but logged; the wallet layer works with whatever it gets.
pub fn parse_department_weights<R: Read>(reader: R) -> LoadResult<HashMap<String, f64>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut weights = HashMap::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let (department, weight): (String, f64) = result.map_err(|source| LoadError::Csv {
            line: line_num + 2,
            source,
        })?;
        weights.insert(normalize(&department), weight);
    }

    let sum: f64 = weights.values().sum();
    if !weights.is_empty() && (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        warn!("department weights sum to {:.3}, expected ~1.0", sum);
    }
    Ok(weights)
}

/// Parse a JSON array of names into a normalized set.
pub fn parse_name_list<R: Read>(reader: R) -> LoadResult<HashSet<String>> {
    let names: Vec<String> = serde_json::from_reader(reader)?;
    Ok(names.iter().map(|n| normalize(n)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_parse_and_normalize() {
        let csv_data = "department,weight\nDairy,0.4\nGROCERY,0.35\nhome,0.25\n";
        let weights = parse_department_weights(csv_data.as_bytes()).unwrap();
        assert_eq!(weights.len(), 3);
        assert!((weights["DAIRY"] - 0.4).abs() < 1e-9);
        assert!((weights["HOME"] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn name_lists_are_case_insensitive() {
        let json = r#"["Milk 1L", "rye bread"]"#;
        let staples = parse_name_list(json.as_bytes()).unwrap();
        let reference = ReferenceData::with_tables(HashMap::new(), staples, HashSet::new());
        assert!(reference.is_staple("MILK 1l"));
        assert!(reference.is_staple("Rye Bread"));
        assert!(!reference.is_staple("Craft Candle"));
    }

    #[test]
    fn empty_supplier_is_never_no_capital() {
        let reference = ReferenceData::with_tables(
            HashMap::new(),
            HashSet::new(),
            ["Lumo".to_string()].into_iter().collect(),
        );
        assert!(reference.is_no_capital("lumo"));
        assert!(!reference.is_no_capital(""));
    }

    #[test]
    fn missing_files_yield_empty_tables() {
        let reference =
            ReferenceData::from_files(Some("/nonexistent/w.csv"), None, None).unwrap();
        assert!(reference.department_weights().is_empty());
        assert!(!reference.is_staple("anything"));
    }

    #[test]
    fn bad_json_is_an_error() {
        let err = parse_name_list("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }
}
