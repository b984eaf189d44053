//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Highest applied schema version, 0 for a fresh database
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: calculation history
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- FOOTPRINT CALCULATIONS
        -- One row per saved estimate
        -- ============================================
        CREATE TABLE footprint_calculations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            wallet_address TEXT,                 -- nullable, base58 Solana address
            input_json TEXT NOT NULL,            -- sanitized ConsumptionInput
            result_json TEXT NOT NULL,           -- FootprintResult

            -- Denormalized totals for sorting/filtering
            total_emissions_kg REAL NOT NULL DEFAULT 0,
            total_emissions_tonnes REAL NOT NULL DEFAULT 0,

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_footprint_calculations_wallet
            ON footprint_calculations(wallet_address);
        CREATE INDEX idx_footprint_calculations_created
            ON footprint_calculations(created_at);
        "#,
    )?;
    Ok(())
}
