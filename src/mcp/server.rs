//! CarbonSol MCP Server Implementation
//!
//! Implements the MCP server with all footprint tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::footprint::EmissionFactorTable;
use crate::models::{ConsumptionInput, RawConsumption};
use crate::tools::footprint;
use crate::tools::status::StatusTracker;

/// CarbonSol MCP Service
#[derive(Clone)]
pub struct CarbonSolService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    factors: Arc<EmissionFactorTable>,
    factor_source: String,
    tool_router: ToolRouter<CarbonSolService>,
}

impl CarbonSolService {
    pub fn new(
        database_path: PathBuf,
        database: Database,
        factors: EmissionFactorTable,
        factor_source: String,
    ) -> Self {
        let tracker = StatusTracker::new(database_path, factor_source.clone(), factors.len());
        Self {
            status_tracker: Arc::new(Mutex::new(tracker)),
            database,
            factors: Arc::new(factors),
            factor_source,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(what: &str, id: i64) -> Result<CallToolResult, McpError> {
    to_json(&serde_json::json!({ "error": format!("{} not found", what), "id": id }))
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateFootprintParams {
    /// Activity quantities, nested ({"transportation": {"car": 1000}}) or dotted ({"transportation.car": 1000}).
    /// Units: transportation km, energy kWh, food kg, lifestyle items.
    #[serde(default)]
    pub quantities: RawConsumption,
    /// Solana wallet address to associate with the calculation (optional)
    pub wallet_address: Option<String>,
    /// Optional notes, e.g. the period the quantities cover
    pub notes: Option<String>,
    /// Save the calculation to history (default true)
    #[serde(default = "default_true")]
    pub save: bool,
}

fn default_true() -> bool { true }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCalculationParams {
    /// Calculation ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetLatestFootprintParams {
    /// Solana wallet address
    pub wallet_address: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListCalculationsParams {
    /// Only show calculations for this wallet (optional)
    pub wallet_address: Option<String>,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Offset for pagination (default 0)
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteCalculationParams {
    /// Calculation ID to delete
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OffsetRecommendationsParams {
    /// Footprint to offset, in tonnes of CO2e
    pub total_emissions: f64,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl CarbonSolService {
    // --- Status ---

    #[tool(description = "Get the current status of the CarbonSol service including build info, database status, active emission factors, and process information")]
    async fn carbonsol_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        to_json(&tracker.get_status())
    }

    #[tool(description = "Get instructions for estimating carbon footprints. Call this when starting a footprint session or when unsure how to enter quantities.")]
    fn footprint_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::FOOTPRINT_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(FOOTPRINT_INSTRUCTIONS)]))
    }

    // --- Factors ---

    #[tool(description = "List the emission factors in effect (kg CO2e per km, kWh, kg, or item) grouped by category")]
    fn get_emission_factors(&self) -> Result<CallToolResult, McpError> {
        to_json(&footprint::get_emission_factors(&self.factors, &self.factor_source))
    }

    // --- Footprints ---

    #[tool(description = "Calculate a carbon footprint from activity quantities. Returns total tCO2e, per-category emissions and percentages, offset costs, and reduction tips. Saves to history unless save=false.")]
    fn calculate_footprint(&self, Parameters(p): Parameters<CalculateFootprintParams>) -> Result<CallToolResult, McpError> {
        let input = ConsumptionInput::from(p.quantities);
        let result = footprint::calculate_footprint(
            &self.database, &self.factors, input, p.wallet_address.as_deref(), p.notes, p.save,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a saved footprint calculation by ID with its input, breakdown, and offsets")]
    fn get_footprint_calculation(&self, Parameters(p): Parameters<GetCalculationParams>) -> Result<CallToolResult, McpError> {
        match footprint::get_calculation(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))? {
            Some(detail) => to_json(&detail),
            None => not_found("Calculation", p.id),
        }
    }

    #[tool(description = "Get the most recent saved footprint calculation for a wallet")]
    fn get_latest_footprint(&self, Parameters(p): Parameters<GetLatestFootprintParams>) -> Result<CallToolResult, McpError> {
        match footprint::get_latest_footprint(&self.database, &p.wallet_address).map_err(|e| McpError::internal_error(e, None))? {
            Some(detail) => to_json(&detail),
            None => to_json(&serde_json::json!({
                "error": "No calculations for wallet",
                "wallet_address": p.wallet_address,
            })),
        }
    }

    #[tool(description = "List saved footprint calculations, newest first, with optional wallet filter and pagination")]
    fn list_footprint_calculations(&self, Parameters(p): Parameters<ListCalculationsParams>) -> Result<CallToolResult, McpError> {
        let result = footprint::list_calculations(&self.database, p.wallet_address.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a saved footprint calculation")]
    fn delete_footprint_calculation(&self, Parameters(p): Parameters<DeleteCalculationParams>) -> Result<CallToolResult, McpError> {
        let result = footprint::delete_calculation(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Offsets ---

    #[tool(description = "Get offset costs (VCU and CST), impact equivalents, and reduction tips for a footprint given in tonnes of CO2e")]
    fn get_offset_recommendations(&self, Parameters(p): Parameters<OffsetRecommendationsParams>) -> Result<CallToolResult, McpError> {
        to_json(&footprint::get_offset_recommendations(p.total_emissions))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for CarbonSolService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "carbonsol".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("CarbonSol Footprint".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "CarbonSol Footprint - carbon footprint estimation and offset planning. \
                 Call footprint_instructions first if unsure how to enter quantities. \
                 Factors: get_emission_factors. \
                 Footprints: calculate_footprint, get_footprint_calculation, get_latest_footprint, \
                 list_footprint_calculations, delete_footprint_calculation. \
                 Offsets: get_offset_recommendations. \
                 Status: carbonsol_status."
                    .into(),
            ),
        }
    }
}
