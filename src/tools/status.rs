//! CarbonSol Status Tool
//!
//! Runtime status information and usage instructions.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Footprint workflow instructions for AI assistants
pub const FOOTPRINT_INSTRUCTIONS: &str = r#"
# CarbonSol Footprint Instructions

This guide explains how to estimate a carbon footprint with the CarbonSol tools.

## Overview

A footprint is a weighted sum: each activity quantity is multiplied by its
emission factor (kg CO₂e per unit), summed per category, and converted to
tonnes (tCO₂e). Every result includes a percentage breakdown by category,
with the kg CO₂e of each subcategory. Quantities above 1e12 are capped.

## Categories and Units

| Category | Subcategories | Unit |
|----------|---------------|------|
| transportation | car, bus, train, plane | km |
| energy | electricity, naturalGas, heating | kWh |
| food | meat, dairy, vegetables, fruits | kg |
| lifestyle | clothing, electronics, furniture | item |

Call `get_emission_factors` to see the factors currently in effect. The
operator may have loaded a regional factor set.

## Entering Quantities

Pass `quantities` to `calculate_footprint` either nested:

```
{"transportation": {"car": 1000}, "energy": {"electricity": 300}}
```

or with dotted keys:

```
{"transportation.car": 1000, "energy.electricity": 300}
```

- Missing subcategories count as 0
- Negative numbers, blank values, and text that isn't a number count as 0
- Numeric strings such as "12.5" are accepted
- Unknown categories are ignored

Use the same period for every quantity (usually one year) so the total is
comparable to the 4 tCO₂e per-person average.

## Saving and History

- `calculate_footprint` saves the result by default; pass `save: false` for a
  what-if estimate. All-zero inputs are never saved
- Pass `wallet_address` (base58 Solana address) to tie the calculation to a
  wallet, then use `get_latest_footprint` to fetch the newest one
- `list_footprint_calculations` pages through history, newest first
- `delete_footprint_calculation` removes a saved calculation

## Offsetting

Every calculation includes offset recommendations:
- VCU cost at 15 USD per tonne, CST cost at 20 USD per tonne
- Trees planted (50 per tonne) and renewable energy (2,500 kWh per tonne)
- Reduction tips

`get_offset_recommendations` computes the same figures for any tonnage.

## Quick Reference

| Task | Tool |
|------|------|
| Estimate a footprint | `calculate_footprint` |
| Show the factor table | `get_emission_factors` |
| Fetch a saved calculation | `get_footprint_calculation` |
| Newest calculation for a wallet | `get_latest_footprint` |
| Browse history | `list_footprint_calculations` |
| Delete a calculation | `delete_footprint_calculation` |
| Offsets for a tonnage | `get_offset_recommendations` |
| Service health | `carbonsol_status` |
"#;

/// Runtime status of the CarbonSol service
#[derive(Debug, Clone, Serialize)]
pub struct CarbonSolStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    pub factor_source: String,
    pub factor_count: usize,

    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    factor_source: String,
    factor_count: usize,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf, factor_source: String, factor_count: usize) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            factor_source,
            factor_count,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> CarbonSolStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        CarbonSolStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            factor_source: self.factor_source.clone(),
            factor_count: self.factor_count,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
