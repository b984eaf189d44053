//! CarbonSol Footprint Library
//!
//! Carbon footprint estimation, offset planning, and calculation history.

pub mod build_info;
pub mod config;
pub mod db;
pub mod footprint;
pub mod mcp;
pub mod models;
pub mod tools;
