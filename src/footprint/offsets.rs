//! Offset recommendations
//!
//! Turns a footprint into credit costs, impact equivalents, and reduction tips.

use serde::{Deserialize, Serialize};

/// Average carbon credit prices, USD per tonne
pub const VCU_PRICE_PER_TONNE: f64 = 15.0;
pub const CST_PRICE_PER_TONNE: f64 = 20.0;

/// Approximate trees needed to absorb one tonne of CO2
pub const TREES_PER_TONNE: f64 = 50.0;
/// Renewable energy that avoids one tonne of CO2
pub const RENEWABLE_KWH_PER_TONNE: f64 = 2500.0;

/// Average per-person footprint, tCO2e per year
pub const AVERAGE_FOOTPRINT_TONNES: f64 = 4.0;

pub const REDUCTION_TIPS: &[&str] = &[
    "Reduce meat consumption, especially beef and lamb",
    "Use public transportation or carpool when possible",
    "Switch to renewable energy sources for your home",
    "Reduce air travel or offset your flights",
    "Buy fewer new products and choose items with less packaging",
    "Improve home energy efficiency with better insulation",
    "Reduce water usage with efficient appliances and shorter showers",
];

/// Real-world equivalents of offsetting a footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEquivalents {
    pub trees_planted: f64,
    pub renewable_energy_kwh: f64,
}

/// What it takes to offset a footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetRecommendation {
    pub offset_tons: f64,
    pub vcu_cost: f64,
    pub cst_cost: f64,
    pub impact_equivalents: ImpactEquivalents,
    pub reduction_tips: Vec<String>,
}

/// Footprint relative to the per-person average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AverageComparison {
    Below,
    Above,
}

/// Offset costs and equivalents for a footprint in tonnes
pub fn offset_recommendations(total_tonnes: f64) -> OffsetRecommendation {
    let tonnes = if total_tonnes.is_finite() && total_tonnes > 0.0 {
        total_tonnes
    } else {
        0.0
    };

    // Capped so a saturated total can't overflow
    let per_tonne = |rate: f64| (tonnes * rate).min(f64::MAX);

    OffsetRecommendation {
        offset_tons: tonnes,
        vcu_cost: per_tonne(VCU_PRICE_PER_TONNE),
        cst_cost: per_tonne(CST_PRICE_PER_TONNE),
        impact_equivalents: ImpactEquivalents {
            trees_planted: per_tonne(TREES_PER_TONNE),
            renewable_energy_kwh: per_tonne(RENEWABLE_KWH_PER_TONNE),
        },
        reduction_tips: REDUCTION_TIPS.iter().map(|tip| tip.to_string()).collect(),
    }
}

pub fn compare_to_average(total_tonnes: f64) -> AverageComparison {
    if total_tonnes < AVERAGE_FOOTPRINT_TONNES {
        AverageComparison::Below
    } else {
        AverageComparison::Above
    }
}

/// Format a number with thousands separators, e.g. `1,234.57`
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    let mut out = String::new();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format tonnes of CO2e for display, e.g. `4.25 tCO₂e`
pub fn format_carbon_amount(tonnes: f64, decimals: usize) -> String {
    format!("{} tCO₂e", format_number(tonnes, decimals))
}
