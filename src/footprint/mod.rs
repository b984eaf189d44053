//! Carbon footprint module
//!
//! Emission factor tables, the footprint estimator, and offset planning.

pub mod estimator;
pub mod factors;
pub mod offsets;

pub use estimator::{
    category_emissions_kg, estimate, percentage_of, subcategory_emissions_kg, KG_PER_TONNE,
};
pub use factors::{Category, EmissionFactorTable, FactorError, FactorMap};
pub use offsets::{
    compare_to_average, format_carbon_amount, format_number, offset_recommendations,
    AverageComparison, ImpactEquivalents, OffsetRecommendation,
};
