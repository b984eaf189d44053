//! Emission factor tables
//!
//! Footprint categories and the kilograms of CO2e emitted per unit of activity.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level footprint category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Transportation,
    Energy,
    Food,
    Lifestyle,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Transportation,
        Category::Energy,
        Category::Food,
        Category::Lifestyle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Transportation => "transportation",
            Category::Energy => "energy",
            Category::Food => "food",
            Category::Lifestyle => "lifestyle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "transportation" | "transport" => Some(Category::Transportation),
            "energy" | "home" => Some(Category::Energy),
            "food" | "diet" => Some(Category::Food),
            "lifestyle" | "goods" => Some(Category::Lifestyle),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Transportation => "Transportation",
            Category::Energy => "Home Energy",
            Category::Food => "Food",
            Category::Lifestyle => "Lifestyle",
        }
    }

    /// Unit of activity the default factors for this category are expressed in
    pub fn activity_unit(&self) -> &'static str {
        match self {
            Category::Transportation => "km",
            Category::Energy => "kWh",
            Category::Food => "kg",
            Category::Lifestyle => "item",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Default Emission Factors (kg CO2e per unit)
// ============================================================================

/// Transportation, per km
pub const CAR_KG_PER_KM: f64 = 0.12;
pub const BUS_KG_PER_KM: f64 = 0.05;
pub const TRAIN_KG_PER_KM: f64 = 0.03;
pub const PLANE_KG_PER_KM: f64 = 0.25;

/// Home energy, per kWh
pub const ELECTRICITY_KG_PER_KWH: f64 = 0.5;
pub const NATURAL_GAS_KG_PER_KWH: f64 = 0.2;
pub const HEATING_KG_PER_KWH: f64 = 0.3;

/// Food, per kg consumed
pub const MEAT_KG_PER_KG: f64 = 5.0;
pub const DAIRY_KG_PER_KG: f64 = 2.5;
pub const VEGETABLES_KG_PER_KG: f64 = 0.5;
pub const FRUITS_KG_PER_KG: f64 = 0.7;

/// Lifestyle, per item purchased
pub const CLOTHING_KG_PER_ITEM: f64 = 10.0;
pub const ELECTRONICS_KG_PER_ITEM: f64 = 100.0;
pub const FURNITURE_KG_PER_ITEM: f64 = 50.0;

const DEFAULT_FACTORS: &[(Category, &str, f64)] = &[
    (Category::Transportation, "car", CAR_KG_PER_KM),
    (Category::Transportation, "bus", BUS_KG_PER_KM),
    (Category::Transportation, "train", TRAIN_KG_PER_KM),
    (Category::Transportation, "plane", PLANE_KG_PER_KM),
    (Category::Energy, "electricity", ELECTRICITY_KG_PER_KWH),
    (Category::Energy, "naturalGas", NATURAL_GAS_KG_PER_KWH),
    (Category::Energy, "heating", HEATING_KG_PER_KWH),
    (Category::Food, "meat", MEAT_KG_PER_KG),
    (Category::Food, "dairy", DAIRY_KG_PER_KG),
    (Category::Food, "vegetables", VEGETABLES_KG_PER_KG),
    (Category::Food, "fruits", FRUITS_KG_PER_KG),
    (Category::Lifestyle, "clothing", CLOTHING_KG_PER_ITEM),
    (Category::Lifestyle, "electronics", ELECTRONICS_KG_PER_ITEM),
    (Category::Lifestyle, "furniture", FURNITURE_KG_PER_ITEM),
];

// ============================================================================
// Factor Table
// ============================================================================

/// Nested (category -> subcategory -> factor) map, the JSON shape of a table
pub type FactorMap = BTreeMap<Category, BTreeMap<String, f64>>;

/// Errors building or loading an emission factor table
#[derive(Debug, Error)]
pub enum FactorError {
    #[error("Failed to read factor file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid factor JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid emission factor for {category}.{subcategory}: {value}")]
    InvalidFactor {
        category: Category,
        subcategory: String,
        value: f64,
    },

    #[error("Empty subcategory name in category {0}")]
    EmptySubcategory(Category),
}

/// Immutable mapping from (category, subcategory) to kg CO2e per unit
///
/// Every factor is finite and non-negative. Tables are built once and passed
/// to the estimator explicitly, so alternate regional or updated factor sets
/// can be swapped in without touching the calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FactorMap", into = "FactorMap")]
pub struct EmissionFactorTable {
    factors: FactorMap,
}

impl EmissionFactorTable {
    /// Build a table from a raw map, validating every factor
    pub fn new(factors: FactorMap) -> Result<Self, FactorError> {
        for (category, subcategories) in &factors {
            for (subcategory, value) in subcategories {
                validate_factor(*category, subcategory, *value)?;
            }
        }
        Ok(Self { factors })
    }

    /// Factor for a (category, subcategory) pair, if the table defines one
    pub fn factor(&self, category: Category, subcategory: &str) -> Option<f64> {
        self.factors
            .get(&category)
            .and_then(|subs| subs.get(subcategory))
            .copied()
    }

    /// Categories present in the table, in stable order
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.factors.keys().copied()
    }

    /// Subcategories and factors for one category
    pub fn subcategories(&self, category: Category) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.factors
            .get(&category)
            .into_iter()
            .flat_map(|subs| subs.iter().map(|(name, factor)| (name.as_str(), *factor)))
    }

    /// Number of (category, subcategory) entries
    pub fn len(&self) -> usize {
        self.factors.values().map(|subs| subs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return a copy of this table with the given factors replaced or added
    pub fn with_overrides(&self, overrides: &FactorMap) -> Result<Self, FactorError> {
        let mut factors = self.factors.clone();
        for (category, subcategories) in overrides {
            for (subcategory, value) in subcategories {
                validate_factor(*category, subcategory, *value)?;
                factors
                    .entry(*category)
                    .or_default()
                    .insert(subcategory.clone(), *value);
            }
        }
        Ok(Self { factors })
    }

    /// Apply overrides given as nested JSON, e.g. `{"energy": {"electricity": 0.233}}`
    pub fn with_json_overrides(&self, json: &str) -> Result<Self, FactorError> {
        let overrides: FactorMap = serde_json::from_str(json)?;
        self.with_overrides(&overrides)
    }

    /// Load the active table: defaults, plus the override file when one is given
    pub fn load(overrides_path: Option<&Path>) -> Result<Self, FactorError> {
        let defaults = Self::default();
        let Some(path) = overrides_path else {
            return Ok(defaults);
        };

        let json = std::fs::read_to_string(path).map_err(|source| FactorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = defaults.with_json_overrides(&json)?;

        tracing::info!(
            "Loaded emission factor overrides from {} ({} factors active)",
            path.display(),
            table.len()
        );
        Ok(table)
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &FactorMap {
        &self.factors
    }
}

impl Default for EmissionFactorTable {
    fn default() -> Self {
        let mut factors = FactorMap::new();
        for (category, subcategory, value) in DEFAULT_FACTORS {
            factors
                .entry(*category)
                .or_default()
                .insert((*subcategory).to_string(), *value);
        }
        Self { factors }
    }
}

impl TryFrom<FactorMap> for EmissionFactorTable {
    type Error = FactorError;

    fn try_from(factors: FactorMap) -> Result<Self, Self::Error> {
        Self::new(factors)
    }
}

impl From<EmissionFactorTable> for FactorMap {
    fn from(table: EmissionFactorTable) -> Self {
        table.factors
    }
}

fn validate_factor(category: Category, subcategory: &str, value: f64) -> Result<(), FactorError> {
    if subcategory.trim().is_empty() {
        return Err(FactorError::EmptySubcategory(category));
    }
    if !value.is_finite() || value < 0.0 {
        return Err(FactorError::InvalidFactor {
            category,
            subcategory: subcategory.to_string(),
            value,
        });
    }
    Ok(())
}
