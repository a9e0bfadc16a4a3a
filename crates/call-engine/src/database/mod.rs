//! # Database store (sqlx + SQLite)
//!
//! Durable implementation of the operator registry and call ledger contracts.
//! All operations are naturally async and Send-safe; the reservation
//! compare-and-set is a conditional `UPDATE` whose `rows_affected` decides
//! the race inside a transaction, so at most one concurrent caller wins an
//! operator.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{CallCenterError, Result};
use crate::ledger::{CallId, CallLedger, CallRecord, CallStatus};
use crate::operator::{Availability, OperatorId, OperatorRegistry, RegistryStats};

/// SQLite-backed store for operators and calls
///
/// Selection among ONLINE operators is always lowest-id
/// (`ORDER BY operator_id ASC`), the deterministic counterpart of the
/// configurable in-memory strategies.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl DatabaseManager {
    /// Connect and run migrations.
    pub async fn new(database_url: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        info!("Initializing database store: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        // An in-memory SQLite database exists per connection; a larger pool
        // would hand each task a different empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| CallCenterError::database(format!("Migration failed: {}", e)))?;

        info!("Database store ready (WAL mode)");
        Ok(Self { pool, clock })
    }

    /// In-memory database for tests.
    pub async fn new_in_memory(clock: Arc<dyn Clock>) -> Result<Self> {
        Self::new("sqlite::memory:", clock).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn call_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<CallRecord> {
        let status: String = row.try_get("status")?;
        let status = CallStatus::from_str(&status).map_err(CallCenterError::internal)?;
        let operator_id: Option<String> = row.try_get("operator_id")?;
        let duration: Option<i64> = row.try_get("duration_seconds")?;

        Ok(CallRecord {
            id: CallId(row.try_get("call_id")?),
            caller_number: row.try_get("caller_number")?,
            operator_id: operator_id.map(OperatorId),
            status,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            duration_seconds: duration.map(|d| d.max(0) as u64),
            notes: row.try_get("notes")?,
        })
    }
}

#[async_trait]
impl OperatorRegistry for DatabaseManager {
    async fn upsert_operator(&self, id: &OperatorId) -> Result<()> {
        sqlx::query(
            "INSERT INTO operators (operator_id, availability) VALUES (?, 'OFFLINE')
             ON CONFLICT(operator_id) DO NOTHING",
        )
        .bind(id.as_ref())
        .execute(&self.pool)
        .await?;

        debug!("Operator {} upserted", id);
        Ok(())
    }

    async fn set_presence(&self, id: &OperatorId, online: bool) -> Result<()> {
        let result = if online {
            sqlx::query(
                "UPDATE operators SET availability = 'ONLINE'
                 WHERE operator_id = ? AND availability = 'OFFLINE'",
            )
            .bind(id.as_ref())
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE operators SET availability = 'OFFLINE'
                 WHERE operator_id = ? AND availability IN ('ONLINE', 'BUSY')",
            )
            .bind(id.as_ref())
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM operators WHERE operator_id = ?")
                .bind(id.as_ref())
                .fetch_optional(&self.pool)
                .await?;
            if exists.is_none() {
                return Err(CallCenterError::not_found(format!(
                    "Operator not found: {}",
                    id
                )));
            }
        }
        Ok(())
    }

    async fn find_available(&self) -> Result<Option<OperatorId>> {
        let row = sqlx::query(
            "SELECT operator_id FROM operators
             WHERE availability = 'ONLINE'
             ORDER BY operator_id ASC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| OperatorId(row.get("operator_id"))))
    }

    async fn reserve(&self, id: &OperatorId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE operators SET availability = 'BUSY'
             WHERE operator_id = ? AND availability = 'ONLINE'",
        )
        .bind(id.as_ref())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            tx.commit().await?;
            debug!("Operator {} reserved", id);
            Ok(())
        } else {
            tx.rollback().await?;
            Err(CallCenterError::conflict(format!(
                "Operator {} is not online",
                id
            )))
        }
    }

    async fn release(&self, id: &OperatorId) -> Result<()> {
        let result = sqlx::query(
            "UPDATE operators SET availability = 'ONLINE'
             WHERE operator_id = ? AND availability = 'BUSY'",
        )
        .bind(id.as_ref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish the idempotent no-op from an unknown operator.
            let exists = sqlx::query("SELECT 1 FROM operators WHERE operator_id = ?")
                .bind(id.as_ref())
                .fetch_optional(&self.pool)
                .await?;
            if exists.is_none() {
                return Err(CallCenterError::not_found(format!(
                    "Operator not found: {}",
                    id
                )));
            }
        } else {
            debug!("Operator {} released", id);
        }
        Ok(())
    }

    async fn availability_of(&self, id: &OperatorId) -> Result<Availability> {
        let row = sqlx::query("SELECT availability FROM operators WHERE operator_id = ?")
            .bind(id.as_ref())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CallCenterError::not_found(format!("Operator not found: {}", id)))?;

        let availability: String = row.try_get("availability")?;
        Availability::from_str(&availability).map_err(CallCenterError::internal)
    }

    async fn stats(&self) -> Result<RegistryStats> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) as total,
                SUM(CASE WHEN availability = 'ONLINE' THEN 1 ELSE 0 END) as online,
                SUM(CASE WHEN availability = 'BUSY' THEN 1 ELSE 0 END) as busy,
                SUM(CASE WHEN availability = 'OFFLINE' THEN 1 ELSE 0 END) as offline
             FROM operators",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(RegistryStats {
            total: row.try_get::<i64, _>("total")? as usize,
            online: row.try_get::<i64, _>("online").unwrap_or(0) as usize,
            busy: row.try_get::<i64, _>("busy").unwrap_or(0) as usize,
            offline: row.try_get::<i64, _>("offline").unwrap_or(0) as usize,
        })
    }
}

#[async_trait]
impl CallLedger for DatabaseManager {
    async fn create(&self, caller_number: &str, operator: Option<OperatorId>) -> Result<CallId> {
        let call_id = CallId::new();
        let status = if operator.is_some() {
            CallStatus::Active
        } else {
            CallStatus::Queued
        };
        let now = self.clock.now();

        sqlx::query(
            "INSERT INTO calls (call_id, caller_number, operator_id, status, started_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(call_id.as_ref())
        .bind(caller_number)
        .bind(operator.as_ref().map(|op| op.as_ref()))
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!("Call {} created ({})", call_id, status);
        Ok(call_id)
    }

    async fn complete(
        &self,
        call_id: &CallId,
        duration_seconds: u64,
        notes: &str,
    ) -> Result<Option<OperatorId>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT operator_id FROM calls WHERE call_id = ?")
            .bind(call_id.as_ref())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CallCenterError::not_found(format!("Call not found: {}", call_id)))?;
        let operator_id: Option<String> = row.try_get("operator_id")?;

        // Conditional UPDATE so a racing completion loses with NotFound, the
        // same rows_affected CAS as reserve and promote.
        let now = self.clock.now();
        let result = sqlx::query(
            "UPDATE calls SET status = 'COMPLETED', ended_at = ?, duration_seconds = ?, notes = ?
             WHERE call_id = ? AND status != 'COMPLETED'",
        )
        .bind(now)
        .bind(duration_seconds as i64)
        .bind(notes)
        .bind(call_id.as_ref())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CallCenterError::not_found(format!(
                "Call already completed: {}",
                call_id
            )));
        }

        tx.commit().await?;
        info!("Call {} completed after {}s", call_id, duration_seconds);
        Ok(operator_id.map(OperatorId))
    }

    async fn promote(&self, call_id: &CallId, operator: &OperatorId) -> Result<()> {
        let result = sqlx::query(
            "UPDATE calls SET status = 'ACTIVE', operator_id = ?
             WHERE call_id = ? AND status = 'QUEUED'",
        )
        .bind(operator.as_ref())
        .bind(call_id.as_ref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CallCenterError::not_found(format!(
                "Call {} is not queued",
                call_id
            )));
        }
        debug!("Call {} promoted to operator {}", call_id, operator);
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<CallRecord>> {
        let rows = sqlx::query(
            "SELECT call_id, caller_number, operator_id, status, started_at, ended_at,
                    duration_seconds, notes
             FROM calls
             ORDER BY started_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut calls = Vec::with_capacity(rows.len());
        for row in rows {
            calls.push(Self::call_from_row(&row)?);
        }
        Ok(calls)
    }

    async fn get(&self, call_id: &CallId) -> Result<Option<CallRecord>> {
        let row = sqlx::query(
            "SELECT call_id, caller_number, operator_id, status, started_at, ended_at,
                    duration_seconds, notes
             FROM calls WHERE call_id = ?",
        )
        .bind(call_id.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::call_from_row(&row)?)),
            None => Ok(None),
        }
    }
}
