//! Footprint estimation
//!
//! Weighted sum of activity quantities against an emission factor table.

use std::collections::BTreeMap;

use super::factors::{Category, EmissionFactorTable};
use crate::models::{CategoryBreakdown, ConsumptionInput, FootprintResult};

/// Kilograms per tonne
pub const KG_PER_TONNE: f64 = 1000.0;

/// Sum that stops at `f64::MAX` instead of overflowing to infinity
fn saturating_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0, |acc, v| (acc + v).min(f64::MAX))
}

/// Emissions per subcategory of one category in kg CO2e
///
/// One entry for every subcategory the table defines. Input subcategories
/// without a factor contribute nothing.
pub fn subcategory_emissions_kg(
    input: &ConsumptionInput,
    factors: &EmissionFactorTable,
    category: Category,
) -> BTreeMap<String, f64> {
    for (subcategory, qty) in input.category(category) {
        if qty > 0.0 && factors.factor(category, subcategory).is_none() {
            tracing::debug!(
                "No emission factor for {}.{}; quantity {} ignored",
                category,
                subcategory,
                qty
            );
        }
    }

    factors
        .subcategories(category)
        .map(|(subcategory, factor)| {
            let kg = (input.quantity(category, subcategory) * factor).min(f64::MAX);
            (subcategory.to_string(), kg)
        })
        .collect()
}

/// Emissions for one category in kg CO2e
pub fn category_emissions_kg(
    input: &ConsumptionInput,
    factors: &EmissionFactorTable,
    category: Category,
) -> f64 {
    saturating_sum(subcategory_emissions_kg(input, factors, category).into_values())
}

/// Share of `part` in `total` as a percentage; 0 when the total is 0
pub fn percentage_of(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Estimate a carbon footprint
///
/// Every category of the factor table appears in the breakdown. With an
/// all-zero input every percentage is 0.
pub fn estimate(input: &ConsumptionInput, factors: &EmissionFactorTable) -> FootprintResult {
    let per_category: Vec<(Category, BTreeMap<String, f64>, f64)> = factors
        .categories()
        .map(|category| {
            let subcategories = subcategory_emissions_kg(input, factors, category);
            let kg = saturating_sum(subcategories.values().copied());
            (category, subcategories, kg)
        })
        .collect();

    let total_kg = saturating_sum(per_category.iter().map(|(_, _, kg)| *kg));

    let breakdown: BTreeMap<Category, CategoryBreakdown> = per_category
        .into_iter()
        .map(|(category, subcategories, kg)| {
            (
                category,
                CategoryBreakdown {
                    emissions: kg / KG_PER_TONNE,
                    emissions_kg: kg,
                    percentage: percentage_of(kg, total_kg),
                    subcategories,
                },
            )
        })
        .collect();

    FootprintResult {
        total_emissions: total_kg / KG_PER_TONNE,
        total_emissions_kg: total_kg,
        breakdown,
    }
}
