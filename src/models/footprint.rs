//! Footprint result model
//!
//! Output of a single footprint estimate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::footprint::Category;

/// Emissions attributed to one category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub emissions: f64,    // tCO2e
    pub emissions_kg: f64, // kg CO2e
    pub percentage: f64,   // share of total, 0-100
    /// kg CO2e per subcategory of the factor table
    #[serde(default)]
    pub subcategories: BTreeMap<String, f64>,
}

impl CategoryBreakdown {
    fn is_finite(&self) -> bool {
        self.emissions.is_finite()
            && self.emissions_kg.is_finite()
            && self.percentage.is_finite()
            && self.subcategories.values().all(|kg| kg.is_finite())
    }
}

/// Total footprint with per-category breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FootprintResult {
    pub total_emissions: f64,    // tCO2e
    pub total_emissions_kg: f64, // kg CO2e
    pub breakdown: BTreeMap<Category, CategoryBreakdown>,
}

impl FootprintResult {
    pub fn category(&self, category: Category) -> Option<&CategoryBreakdown> {
        self.breakdown.get(&category)
    }

    /// Category with the largest emissions, if anything was emitted at all
    pub fn largest_category(&self) -> Option<Category> {
        self.breakdown
            .iter()
            .filter(|(_, b)| b.emissions_kg > 0.0)
            .max_by(|(_, a), (_, b)| a.emissions_kg.total_cmp(&b.emissions_kg))
            .map(|(category, _)| *category)
    }

    pub fn is_zero(&self) -> bool {
        self.total_emissions_kg == 0.0
    }

    /// Whether every number in the result is finite
    pub fn is_finite(&self) -> bool {
        self.total_emissions.is_finite()
            && self.total_emissions_kg.is_finite()
            && self.breakdown.values().all(CategoryBreakdown::is_finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_finite() {
        let mut result = FootprintResult::default();
        assert!(result.is_finite());

        let mut breakdown = CategoryBreakdown::default();
        breakdown.subcategories.insert("car".to_string(), f64::INFINITY);
        result.breakdown.insert(Category::Transportation, breakdown);
        assert!(!result.is_finite());

        result.breakdown.clear();
        result.total_emissions_kg = f64::NAN;
        assert!(!result.is_finite());
    }

    #[test]
    fn test_breakdown_without_subcategories_deserializes() {
        let b: CategoryBreakdown =
            serde_json::from_str(r#"{"emissions": 0.1, "emissions_kg": 100.0, "percentage": 50.0}"#)
                .unwrap();
        assert!(b.subcategories.is_empty());
    }
}
