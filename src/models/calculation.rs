//! Footprint calculation model
//!
//! A saved footprint estimate, optionally tied to a wallet address.

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{ConsumptionInput, FootprintResult};
use crate::db::{DbError, DbResult};

/// A stored footprint calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintRecord {
    pub id: i64,
    pub wallet_address: Option<String>,
    pub input: ConsumptionInput,
    pub result: FootprintResult,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Data for saving a calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintRecordCreate {
    pub wallet_address: Option<String>,
    pub input: ConsumptionInput,
    pub result: FootprintResult,
    pub notes: Option<String>,
}

// Column positions in footprint_calculations
const INPUT_JSON_COLUMN: usize = 2;
const RESULT_JSON_COLUMN: usize = 3;

/// Basic check for a Solana address: base58, 32-44 characters
pub fn is_valid_wallet_address(address: &str) -> bool {
    (32..=44).contains(&address.len())
        && address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'))
}

/// Decode a JSON text column
fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl FootprintRecord {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            wallet_address: row.get("wallet_address")?,
            input: json_column(row, INPUT_JSON_COLUMN)?,
            result: json_column(row, RESULT_JSON_COLUMN)?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Save a calculation
    ///
    /// The insert and the read-back run in one transaction, so a failure
    /// leaves nothing behind. Results with non-finite numbers are refused.
    pub fn create(conn: &mut Connection, data: &FootprintRecordCreate) -> DbResult<Self> {
        if !data.result.is_finite() {
            return Err(DbError::InvalidRecord(
                "footprint result contains non-finite values".to_string(),
            ));
        }

        let input_json = serde_json::to_string(&data.input)?;
        let result_json = serde_json::to_string(&data.result)?;
        let created_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO footprint_calculations (
                wallet_address, input_json, result_json,
                total_emissions_kg, total_emissions_tonnes, notes, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                data.wallet_address,
                input_json,
                result_json,
                data.result.total_emissions_kg,
                data.result.total_emissions,
                data.notes,
                created_at,
            ],
        )?;

        let id = tx.last_insert_rowid();
        let record = Self::get_by_id(&tx, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
        tx.commit()?;
        Ok(record)
    }

    /// Get a calculation by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM footprint_calculations WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List calculations newest first, optionally for one wallet
    pub fn list(
        conn: &Connection,
        wallet_address: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM footprint_calculations
            WHERE (?1 IS NULL OR wallet_address = ?1)
            ORDER BY created_at DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let records = stmt
            .query_map(params![wallet_address, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Count calculations, optionally for one wallet
    pub fn count(conn: &Connection, wallet_address: Option<&str>) -> DbResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM footprint_calculations WHERE (?1 IS NULL OR wallet_address = ?1)",
            params![wallet_address],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Most recent calculation saved for a wallet
    pub fn latest_for_wallet(conn: &Connection, wallet_address: &str) -> DbResult<Option<Self>> {
        Ok(Self::list(conn, Some(wallet_address), 1, 0)?.into_iter().next())
    }

    /// Delete a calculation. Returns false if it didn't exist.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM footprint_calculations WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::footprint::{estimate, Category, EmissionFactorTable};

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn sample(wallet: Option<&str>, car_km: f64) -> FootprintRecordCreate {
        let input = ConsumptionInput::new().with(Category::Transportation, "car", car_km);
        let result = estimate(&input, &EmissionFactorTable::default());
        FootprintRecordCreate {
            wallet_address: wallet.map(str::to_string),
            input,
            result,
            notes: None,
        }
    }

    #[test]
    fn test_create_and_get() {
        let mut conn = setup();
        let created = FootprintRecord::create(&mut conn, &sample(Some(WALLET), 1000.0)).unwrap();

        let fetched = FootprintRecord::get_by_id(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.wallet_address.as_deref(), Some(WALLET));
        assert!((fetched.result.total_emissions - 0.12).abs() < 1e-9);
        assert_eq!(fetched.input.quantity(Category::Transportation, "car"), 1000.0);
    }

    #[test]
    fn test_get_missing() {
        let conn = setup();
        assert!(FootprintRecord::get_by_id(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_list_filters_by_wallet() {
        let mut conn = setup();
        FootprintRecord::create(&mut conn, &sample(Some(WALLET), 100.0)).unwrap();
        FootprintRecord::create(&mut conn, &sample(None, 200.0)).unwrap();
        let latest = FootprintRecord::create(&mut conn, &sample(Some(WALLET), 300.0)).unwrap();

        assert_eq!(FootprintRecord::count(&conn, None).unwrap(), 3);
        assert_eq!(FootprintRecord::count(&conn, Some(WALLET)).unwrap(), 2);

        let mine = FootprintRecord::list(&conn, Some(WALLET), 10, 0).unwrap();
        assert_eq!(mine.len(), 2);
        // Newest first
        assert_eq!(mine[0].id, latest.id);

        let page = FootprintRecord::list(&conn, None, 1, 1).unwrap();
        assert_eq!(page.len(), 1);

        let found = FootprintRecord::latest_for_wallet(&conn, WALLET).unwrap().unwrap();
        assert_eq!(found.id, latest.id);
    }

    #[test]
    fn test_delete() {
        let mut conn = setup();
        let record = FootprintRecord::create(&mut conn, &sample(None, 10.0)).unwrap();
        assert!(FootprintRecord::delete(&conn, record.id).unwrap());
        assert!(!FootprintRecord::delete(&conn, record.id).unwrap());
        assert_eq!(FootprintRecord::count(&conn, None).unwrap(), 0);
    }

    #[test]
    fn test_non_finite_result_not_saved() {
        let mut conn = setup();
        let mut data = sample(Some(WALLET), 100.0);
        data.result.total_emissions_kg = f64::INFINITY;

        let err = FootprintRecord::create(&mut conn, &data).unwrap_err();
        assert!(matches!(err, DbError::InvalidRecord(_)));
        assert_eq!(FootprintRecord::count(&conn, None).unwrap(), 0);
    }

    #[test]
    fn test_failed_read_back_rolls_back() {
        let mut conn = setup();
        // A trigger that corrupts the stored result makes the read-back fail
        conn.execute_batch(
            "CREATE TRIGGER corrupt_result AFTER INSERT ON footprint_calculations
             BEGIN
                 UPDATE footprint_calculations SET result_json = 'null' WHERE id = NEW.id;
             END;",
        )
        .unwrap();

        assert!(FootprintRecord::create(&mut conn, &sample(None, 100.0)).is_err());
        assert_eq!(FootprintRecord::count(&conn, None).unwrap(), 0);
    }

    #[test]
    fn test_huge_input_saves_and_lists() {
        let mut conn = setup();
        FootprintRecord::create(&mut conn, &sample(None, 10.0)).unwrap();

        let input = ConsumptionInput::new()
            .with(Category::Lifestyle, "electronics", 1e307)
            .with(Category::Food, "meat", 1.0);
        let result = estimate(&input, &EmissionFactorTable::default());
        let data = FootprintRecordCreate {
            wallet_address: Some(WALLET.to_string()),
            input,
            result,
            notes: None,
        };
        let saved = FootprintRecord::create(&mut conn, &data).unwrap();
        assert!(saved.result.is_finite());

        assert_eq!(FootprintRecord::list(&conn, None, 50, 0).unwrap().len(), 2);
        let latest = FootprintRecord::latest_for_wallet(&conn, WALLET).unwrap().unwrap();
        assert_eq!(latest.id, saved.id);
    }

    #[test]
    fn test_wallet_address_validation() {
        assert!(is_valid_wallet_address(WALLET));
        assert!(!is_valid_wallet_address("short"));
        assert!(!is_valid_wallet_address("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl"));
        assert!(!is_valid_wallet_address("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJos-AsU"));
    }
}
