//! SQLite implementation of `ResponderStore`

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use bigdecimal::BigDecimal;
use responder_core::errors::{CoreError, CoreErrorKind};
use responder_core::{
    NewResponder, Responder, ResponderFilter, ResponderId, ResponderPatch, ResponderQuery,
    ResponderStats, ResponderStore, StoreResult, StoredResponder,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db;
use crate::errors::{from_rusqlite, lock_poisoned};
use crate::migrations::apply_migrations;

const SELECT_COLUMNS: &str = "SELECT id, name, phone_number, latitude, longitude, boat_capacity,
        medical_kit, available, person, enrolled, version FROM responders";

/// Durable responder store over a single SQLite connection
///
/// The connection sits behind a mutex so listener workers can share the
/// store; every operation holds the lock for its whole statement sequence.
pub struct SqliteResponderStore {
    conn: Mutex<Connection>,
}

impl SqliteResponderStore {
    /// Open (or create) a database file and bring its schema up to date
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the file cannot be opened or a
    /// migration fails.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let mut conn = db::open(path)?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database with the schema applied
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when a migration fails.
    pub fn open_in_memory() -> StoreResult<Self> {
        let mut conn = db::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(from_rusqlite)?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self, op: &str) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| lock_poisoned(op))
    }

    fn find_where<P: rusqlite::ToSql>(
        &self,
        op: &str,
        clause: &str,
        param: P,
    ) -> StoreResult<Option<StoredResponder>> {
        let conn = self.lock(op)?;
        conn.query_row(
            &format!("{} WHERE {} ORDER BY id LIMIT 1", SELECT_COLUMNS, clause),
            [param],
            stored_from_row,
        )
        .optional()
        .map_err(|e| from_rusqlite(e).with_op(op.to_string()))
    }
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<BigDecimal> {
    let raw: String = row.get(idx)?;
    BigDecimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredResponder> {
    let version: i64 = row.get(10)?;
    Ok(StoredResponder {
        responder: Responder {
            id: ResponderId::new(row.get(0)?),
            name: row.get(1)?,
            phone_number: row.get(2)?,
            latitude: decimal_column(row, 3)?,
            longitude: decimal_column(row, 4)?,
            boat_capacity: row.get(5)?,
            medical_kit: row.get(6)?,
            available: row.get(7)?,
            person: row.get(8)?,
            enrolled: row.get(9)?,
        },
        version: version.max(0) as u64,
    })
}

fn filter_clause(filter: ResponderFilter) -> &'static str {
    match filter {
        ResponderFilter::All => "",
        ResponderFilter::Available => " WHERE available = 1 AND enrolled = 1",
        ResponderFilter::Person => " WHERE person = 1",
    }
}

impl ResponderStore for SqliteResponderStore {
    fn find_by_id(&self, id: ResponderId) -> StoreResult<Option<StoredResponder>> {
        self.find_where("find_by_id", "id = ?1", id.get())
    }

    fn find_by_name(&self, name: &str) -> StoreResult<Option<StoredResponder>> {
        self.find_where("find_by_name", "name = ?1", name)
    }

    fn list(&self, query: &ResponderQuery) -> StoreResult<Vec<Responder>> {
        let conn = self.lock("list")?;
        let sql = format!(
            "{}{} ORDER BY id LIMIT ?1 OFFSET ?2",
            SELECT_COLUMNS,
            filter_clause(query.filter)
        );
        // SQLite treats a negative limit as "no limit"
        let limit = query.limit.map_or(-1, |l| l as i64);
        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(params![limit, query.offset as i64], stored_from_row)
            .map_err(from_rusqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(from_rusqlite)?;
        Ok(rows.into_iter().map(|stored| stored.responder).collect())
    }

    fn create(&self, responder: &NewResponder) -> StoreResult<StoredResponder> {
        let mut conn = self.lock("create")?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        tx.execute(
            "INSERT INTO responders (name, phone_number, latitude, longitude, boat_capacity,
                medical_kit, available, person, enrolled, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)",
            params![
                responder.name,
                responder.phone_number,
                responder.latitude.to_string(),
                responder.longitude.to_string(),
                responder.boat_capacity,
                responder.medical_kit,
                responder.available,
                responder.person,
                responder.enrolled,
            ],
        )
        .map_err(|e| from_rusqlite(e).with_op("create"))?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO responder_baseline (id, name, phone_number, latitude, longitude,
                boat_capacity, medical_kit, available, person, enrolled)
             SELECT id, name, phone_number, latitude, longitude, boat_capacity,
                medical_kit, available, person, enrolled
             FROM responders WHERE id = ?1",
            [id],
        )
        .map_err(|e| from_rusqlite(e).with_op("create"))?;
        tx.commit().map_err(from_rusqlite)?;

        Ok(StoredResponder {
            responder: responder.clone().into_responder(ResponderId::new(id)),
            version: 0,
        })
    }

    fn merge(&self, candidate: &Responder, expected_version: u64) -> StoreResult<StoredResponder> {
        let conn = self.lock("merge")?;
        let updated = conn
            .execute(
                "UPDATE responders SET name = ?1, phone_number = ?2, latitude = ?3,
                    longitude = ?4, boat_capacity = ?5, medical_kit = ?6, available = ?7,
                    person = ?8, enrolled = ?9, version = version + 1
                 WHERE id = ?10 AND version = ?11",
                params![
                    candidate.name,
                    candidate.phone_number,
                    candidate.latitude.to_string(),
                    candidate.longitude.to_string(),
                    candidate.boat_capacity,
                    candidate.medical_kit,
                    candidate.available,
                    candidate.person,
                    candidate.enrolled,
                    candidate.id.get(),
                    expected_version as i64,
                ],
            )
            .map_err(|e| from_rusqlite(e).with_op("merge"))?;

        if updated == 1 {
            return Ok(StoredResponder {
                responder: candidate.clone(),
                version: expected_version + 1,
            });
        }

        let actual: Option<i64> = conn
            .query_row(
                "SELECT version FROM responders WHERE id = ?1",
                [candidate.id.get()],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        Err(match actual {
            None => CoreError::new(CoreErrorKind::NotFound)
                .with_op("merge")
                .with_entity_id(candidate.id.to_string()),
            Some(actual) => CoreError::new(CoreErrorKind::VersionConflict)
                .with_op("merge")
                .with_entity_id(candidate.id.to_string())
                .with_message(format!(
                    "Expected version {} but store holds {}",
                    expected_version, actual
                )),
        })
    }

    fn update_location(&self, patch: &ResponderPatch) -> StoreResult<bool> {
        let conn = self.lock("update_location")?;
        let updated = conn
            .execute(
                "UPDATE responders SET latitude = COALESCE(?2, latitude),
                    longitude = COALESCE(?3, longitude)
                 WHERE id = ?1",
                params![
                    patch.id.get(),
                    patch.latitude.as_ref().map(ToString::to_string),
                    patch.longitude.as_ref().map(ToString::to_string),
                ],
            )
            .map_err(|e| from_rusqlite(e).with_op("update_location"))?;
        Ok(updated > 0)
    }

    fn stats(&self) -> StoreResult<ResponderStats> {
        let conn = self.lock("stats")?;
        let (total, active): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(CASE WHEN available = 0 THEN 1 ELSE 0 END), 0)
                 FROM responders WHERE enrolled = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| from_rusqlite(e).with_op("stats"))?;
        Ok(ResponderStats {
            total: total.max(0) as u64,
            active: active.max(0) as u64,
        })
    }

    fn reset(&self) -> StoreResult<()> {
        let conn = self.lock("reset")?;
        conn.execute(
            "UPDATE responders SET name = b.name, phone_number = b.phone_number,
                latitude = b.latitude, longitude = b.longitude,
                boat_capacity = b.boat_capacity, medical_kit = b.medical_kit,
                available = b.available, person = b.person, enrolled = b.enrolled
             FROM responder_baseline AS b
             WHERE responders.id = b.id",
            [],
        )
        .map_err(|e| from_rusqlite(e).with_op("reset"))?;
        Ok(())
    }

    fn clear(&self) -> StoreResult<Vec<ResponderId>> {
        let mut conn = self.lock("clear")?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let ids: Vec<i64> = {
            let mut stmt = tx
                .prepare("SELECT id FROM responders WHERE person = 0 ORDER BY id")
                .map_err(from_rusqlite)?;
            let rows = stmt
                .query_map([], |row| row.get(0))
                .map_err(from_rusqlite)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(from_rusqlite)?
        };
        tx.execute(
            "DELETE FROM responder_baseline \
             WHERE id IN (SELECT id FROM responders WHERE person = 0)",
            [],
        )
        .map_err(|e| from_rusqlite(e).with_op("clear"))?;
        tx.execute("DELETE FROM responders WHERE person = 0", [])
            .map_err(|e| from_rusqlite(e).with_op("clear"))?;
        tx.commit().map_err(from_rusqlite)?;

        Ok(ids.into_iter().map(ResponderId::new).collect())
    }
}

impl std::fmt::Debug for SqliteResponderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteResponderStore").finish_non_exhaustive()
    }
}
