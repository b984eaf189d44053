//! Environment configuration
//!
//! `CARBONSOL_DATABASE_PATH` - SQLite file (default `<project>/data/carbonsol.db`)
//! `CARBONSOL_FACTORS_PATH` - optional JSON file of emission factor overrides

use std::path::PathBuf;

use crate::footprint::{EmissionFactorTable, FactorError};

pub const DATABASE_PATH_VAR: &str = "CARBONSOL_DATABASE_PATH";
pub const FACTORS_PATH_VAR: &str = "CARBONSOL_FACTORS_PATH";

/// Get the database path from environment or use default
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            path.push("carbonsol.db");
            path
        })
}

/// Override file path, if one is configured
pub fn factors_path() -> Option<PathBuf> {
    std::env::var(FACTORS_PATH_VAR)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

/// Load the active factor table and describe where it came from
pub fn load_factor_table() -> Result<(EmissionFactorTable, String), FactorError> {
    match factors_path() {
        Some(path) => {
            let table = EmissionFactorTable::load(Some(&path))?;
            Ok((table, format!("defaults with overrides from {}", path.display())))
        }
        None => Ok((EmissionFactorTable::default(), "built-in defaults".to_string())),
    }
}
