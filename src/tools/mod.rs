//! CarbonSol Tools module
//!
//! MCP tool implementations for the footprint service.

pub mod footprint;
pub mod status;
