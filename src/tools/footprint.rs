//! Footprint MCP Tools
//!
//! Calculating, saving, and browsing carbon footprint estimates.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::Database;
use crate::footprint::{
    compare_to_average, estimate, format_carbon_amount, offset_recommendations,
    AverageComparison, Category, EmissionFactorTable, OffsetRecommendation,
};
use crate::models::{
    is_valid_wallet_address, CategoryBreakdown, ConsumptionInput, FootprintRecord,
    FootprintRecordCreate, FootprintResult,
};

/// Response for calculate_footprint
#[derive(Debug, Serialize)]
pub struct CalculateFootprintResponse {
    pub id: Option<i64>,  // None when save=false
    pub saved: bool,
    pub wallet_address: Option<String>,
    #[serde(flatten)]
    pub result: FootprintResult,
    pub formatted_total: String,
    pub largest_category: Option<Category>,
    pub compared_to_average: AverageComparison,
    pub offsets: OffsetRecommendation,
    pub input: ConsumptionInput,
}

/// Summary of a saved calculation for listing
#[derive(Debug, Serialize)]
pub struct CalculationSummary {
    pub id: i64,
    pub wallet_address: Option<String>,
    pub total_emissions: f64,
    pub formatted_total: String,
    pub largest_category: Option<Category>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<&FootprintRecord> for CalculationSummary {
    fn from(record: &FootprintRecord) -> Self {
        Self {
            id: record.id,
            wallet_address: record.wallet_address.clone(),
            total_emissions: record.result.total_emissions,
            formatted_total: format_carbon_amount(record.result.total_emissions, 2),
            largest_category: record.result.largest_category(),
            notes: record.notes.clone(),
            created_at: record.created_at.clone(),
        }
    }
}

/// Response for list_footprint_calculations
#[derive(Debug, Serialize)]
pub struct ListCalculationsResponse {
    pub calculations: Vec<CalculationSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for delete_footprint_calculation
#[derive(Debug, Serialize)]
pub struct DeleteCalculationResponse {
    pub success: bool,
    pub id: i64,
}

/// One factor row for get_emission_factors
#[derive(Debug, Serialize)]
pub struct FactorEntry {
    pub subcategory: String,
    pub kg_co2e_per_unit: f64,
}

/// Factors for one category
#[derive(Debug, Serialize)]
pub struct CategoryFactors {
    pub display_name: &'static str,
    pub unit: &'static str,
    pub factors: Vec<FactorEntry>,
}

/// Response for get_emission_factors
#[derive(Debug, Serialize)]
pub struct EmissionFactorsResponse {
    pub source: String,
    pub categories: BTreeMap<Category, CategoryFactors>,
}

/// Response for get_offset_recommendations
#[derive(Debug, Serialize)]
pub struct OffsetRecommendationsResponse {
    pub formatted_total: String,
    pub compared_to_average: AverageComparison,
    #[serde(flatten)]
    pub recommendation: OffsetRecommendation,
}

/// Response for a saved calculation with its offsets
#[derive(Debug, Serialize)]
pub struct CalculationDetail {
    #[serde(flatten)]
    pub record: FootprintRecord,
    pub formatted_total: String,
    pub breakdown_formatted: BTreeMap<Category, String>,
    pub offsets: OffsetRecommendation,
}

impl From<FootprintRecord> for CalculationDetail {
    fn from(record: FootprintRecord) -> Self {
        let breakdown_formatted = record
            .result
            .breakdown
            .iter()
            .map(|(category, b)| (*category, format_breakdown(b)))
            .collect();
        Self {
            formatted_total: format_carbon_amount(record.result.total_emissions, 2),
            offsets: offset_recommendations(record.result.total_emissions),
            breakdown_formatted,
            record,
        }
    }
}

fn format_breakdown(b: &CategoryBreakdown) -> String {
    format!("{} ({:.0}%)", format_carbon_amount(b.emissions, 2), b.percentage)
}

fn normalize_wallet(wallet_address: Option<&str>) -> Result<Option<String>, String> {
    match wallet_address.map(str::trim).filter(|w| !w.is_empty()) {
        Some(wallet) if is_valid_wallet_address(wallet) => Ok(Some(wallet.to_string())),
        Some(wallet) => Err(format!("Invalid wallet address: {}", wallet)),
        None => Ok(None),
    }
}

// ============================================================================
// Footprint Tools
// ============================================================================

/// Estimate a footprint, attach offsets, and save it unless told not to
pub fn calculate_footprint(
    db: &Database,
    factors: &EmissionFactorTable,
    input: ConsumptionInput,
    wallet_address: Option<&str>,
    notes: Option<String>,
    save: bool,
) -> Result<CalculateFootprintResponse, String> {
    let wallet_address = normalize_wallet(wallet_address)?;
    let result = estimate(&input, factors);

    tracing::info!(
        "Calculated footprint: {:.3} tCO2e (wallet: {})",
        result.total_emissions,
        wallet_address.as_deref().unwrap_or("none")
    );

    if save && input.is_empty() {
        tracing::info!("Nothing entered; calculation not saved");
    }

    let id = if save && !input.is_empty() {
        let data = FootprintRecordCreate {
            wallet_address: wallet_address.clone(),
            input: input.clone(),
            result: result.clone(),
            notes,
        };
        let record = db
            .with_conn_mut(|conn| FootprintRecord::create(conn, &data))
            .map_err(|e| format!("Failed to save calculation: {}", e))?;
        Some(record.id)
    } else {
        None
    };

    Ok(CalculateFootprintResponse {
        id,
        saved: id.is_some(),
        wallet_address,
        formatted_total: format_carbon_amount(result.total_emissions, 2),
        largest_category: result.largest_category(),
        compared_to_average: compare_to_average(result.total_emissions),
        offsets: offset_recommendations(result.total_emissions),
        result,
        input,
    })
}

/// Get a saved calculation by ID
pub fn get_calculation(db: &Database, id: i64) -> Result<Option<CalculationDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let record = FootprintRecord::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get calculation: {}", e))?;
    Ok(record.map(CalculationDetail::from))
}

/// Most recent saved calculation for a wallet
pub fn get_latest_footprint(
    db: &Database,
    wallet_address: &str,
) -> Result<Option<CalculationDetail>, String> {
    let wallet = normalize_wallet(Some(wallet_address))?
        .ok_or_else(|| "Wallet address is required".to_string())?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let record = FootprintRecord::latest_for_wallet(&conn, &wallet)
        .map_err(|e| format!("Failed to get latest calculation: {}", e))?;
    Ok(record.map(CalculationDetail::from))
}

/// List saved calculations, newest first
pub fn list_calculations(
    db: &Database,
    wallet_address: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListCalculationsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);
    let wallet = normalize_wallet(wallet_address)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let records = FootprintRecord::list(&conn, wallet.as_deref(), limit, offset)
        .map_err(|e| format!("Failed to list calculations: {}", e))?;
    let total = FootprintRecord::count(&conn, wallet.as_deref())
        .map_err(|e| format!("Failed to count calculations: {}", e))?;

    Ok(ListCalculationsResponse {
        calculations: records.iter().map(CalculationSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Delete a saved calculation
pub fn delete_calculation(db: &Database, id: i64) -> Result<DeleteCalculationResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = FootprintRecord::delete(&conn, id)
        .map_err(|e| format!("Failed to delete calculation: {}", e))?;

    if deleted {
        tracing::info!("Deleted footprint calculation {}", id);
    }

    Ok(DeleteCalculationResponse {
        success: deleted,
        id,
    })
}

/// Describe the active emission factor table
pub fn get_emission_factors(factors: &EmissionFactorTable, source: &str) -> EmissionFactorsResponse {
    let categories = factors
        .categories()
        .map(|category| {
            let entries = factors
                .subcategories(category)
                .map(|(subcategory, factor)| FactorEntry {
                    subcategory: subcategory.to_string(),
                    kg_co2e_per_unit: factor,
                })
                .collect();
            (
                category,
                CategoryFactors {
                    display_name: category.display_name(),
                    unit: category.activity_unit(),
                    factors: entries,
                },
            )
        })
        .collect();

    EmissionFactorsResponse {
        source: source.to_string(),
        categories,
    }
}

/// Offset costs and equivalents for a footprint in tonnes
pub fn get_offset_recommendations(total_tonnes: f64) -> OffsetRecommendationsResponse {
    let recommendation = offset_recommendations(total_tonnes);
    OffsetRecommendationsResponse {
        formatted_total: format_carbon_amount(recommendation.offset_tons, 2),
        compared_to_average: compare_to_average(recommendation.offset_tons),
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();
        db
    }

    fn scenario_three() -> ConsumptionInput {
        ConsumptionInput::new()
            .with(Category::Energy, "electricity", 300.0)
            .with(Category::Food, "meat", 10.0)
    }

    #[test]
    fn test_calculate_and_save() {
        let db = setup();
        let factors = EmissionFactorTable::default();

        let resp = calculate_footprint(&db, &factors, scenario_three(), Some(WALLET), None, true)
            .unwrap();
        assert!(resp.saved);
        assert!((resp.result.total_emissions - 0.2).abs() < 1e-9);
        assert_eq!(resp.formatted_total, "0.20 tCO₂e");
        assert_eq!(resp.largest_category, Some(Category::Energy));
        assert_eq!(resp.compared_to_average, AverageComparison::Below);
        assert!((resp.offsets.vcu_cost - 3.0).abs() < 1e-9);

        let detail = get_calculation(&db, resp.id.unwrap()).unwrap().unwrap();
        assert_eq!(detail.record.wallet_address.as_deref(), Some(WALLET));
        assert_eq!(detail.breakdown_formatted[&Category::Energy], "0.15 tCO₂e (75%)");
    }

    #[test]
    fn test_calculate_without_saving() {
        let db = setup();
        let resp = calculate_footprint(
            &db,
            &EmissionFactorTable::default(),
            ConsumptionInput::new(),
            None,
            None,
            false,
        )
        .unwrap();

        assert!(!resp.saved);
        assert_eq!(resp.id, None);
        assert_eq!(resp.result.total_emissions, 0.0);
        assert_eq!(resp.largest_category, None);
        assert_eq!(list_calculations(&db, None, 50, 0).unwrap().total, 0);
    }

    #[test]
    fn test_empty_input_not_saved() {
        let db = setup();
        let resp = calculate_footprint(
            &db,
            &EmissionFactorTable::default(),
            ConsumptionInput::new().with(Category::Food, "meat", -2.0),
            Some(WALLET),
            None,
            true,
        )
        .unwrap();

        assert!(!resp.saved);
        assert_eq!(resp.id, None);
        assert!(get_latest_footprint(&db, WALLET).unwrap().is_none());
    }

    #[test]
    fn test_huge_quantity_keeps_history_readable() {
        let db = setup();
        let factors = EmissionFactorTable::default();
        calculate_footprint(&db, &factors, scenario_three(), None, None, true).unwrap();

        let huge: ConsumptionInput = serde_json::from_value(serde_json::json!({
            "lifestyle": {"electronics": 1e307},
            "food": {"meat": 1}
        }))
        .unwrap();
        let resp = calculate_footprint(&db, &factors, huge, Some(WALLET), None, true).unwrap();
        assert!(resp.saved);
        assert!(resp.result.is_finite());
        assert!(resp.offsets.vcu_cost.is_finite());

        let list = list_calculations(&db, None, 50, 0).unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.calculations.len(), 2);

        let latest = get_latest_footprint(&db, WALLET).unwrap().unwrap();
        assert_eq!(latest.record.id, resp.id.unwrap());
    }

    #[test]
    fn test_calculate_rejects_bad_wallet() {
        let db = setup();
        let err = calculate_footprint(
            &db,
            &EmissionFactorTable::default(),
            scenario_three(),
            Some("not-a-wallet"),
            None,
            true,
        )
        .unwrap_err();
        assert!(err.contains("Invalid wallet address"));
    }

    #[test]
    fn test_blank_wallet_is_none() {
        let db = setup();
        let resp = calculate_footprint(
            &db,
            &EmissionFactorTable::default(),
            scenario_three(),
            Some("   "),
            None,
            true,
        )
        .unwrap();
        assert_eq!(resp.wallet_address, None);
    }

    #[test]
    fn test_list_latest_delete() {
        let db = setup();
        let factors = EmissionFactorTable::default();
        calculate_footprint(&db, &factors, scenario_three(), Some(WALLET), None, true).unwrap();
        let second = calculate_footprint(
            &db,
            &factors,
            ConsumptionInput::new().with(Category::Transportation, "car", 1000.0),
            Some(WALLET),
            Some("commute".to_string()),
            true,
        )
        .unwrap();

        let list = list_calculations(&db, Some(WALLET), 500, -4).unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.limit, 200);
        assert_eq!(list.offset, 0);
        assert_eq!(list.calculations[0].id, second.id.unwrap());
        assert_eq!(list.calculations[0].notes.as_deref(), Some("commute"));

        let latest = get_latest_footprint(&db, WALLET).unwrap().unwrap();
        assert_eq!(latest.record.id, second.id.unwrap());

        let deleted = delete_calculation(&db, second.id.unwrap()).unwrap();
        assert!(deleted.success);
        assert!(get_calculation(&db, second.id.unwrap()).unwrap().is_none());
        assert_eq!(list_calculations(&db, None, 50, 0).unwrap().total, 1);
    }

    #[test]
    fn test_emission_factors_response() {
        let resp = get_emission_factors(&EmissionFactorTable::default(), "built-in defaults");
        assert_eq!(resp.categories.len(), 4);
        let transport = &resp.categories[&Category::Transportation];
        assert_eq!(transport.unit, "km");
        assert_eq!(transport.factors.len(), 4);
    }

    #[test]
    fn test_offset_recommendations_response() {
        let resp = get_offset_recommendations(5.0);
        assert_eq!(resp.compared_to_average, AverageComparison::Above);
        assert_eq!(resp.recommendation.cst_cost, 100.0);
        assert_eq!(resp.formatted_total, "5.00 tCO₂e");
    }
}
