//! Scoped unit-of-work over one SQLite connection.
//!
//! # Responsibility
//! - Own the forum connection explicitly (no process-wide engine state).
//! - Run caller closures inside a transaction that commits on `Ok`, rolls
//!   back on `Err`, and is always released before the call returns.
//!
//! # Invariants
//! - A transaction never outlives the `with_*transaction` call that opened it.
//! - Exactly one commit or one rollback is attempted per scope. A panic
//!   unwinding out of the closure drops the transaction, which rolls back.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use log::{debug, error, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Instant;

/// Transactional session factory for the forum store.
pub struct Gateway {
    conn: Connection,
}

impl Gateway {
    /// Opens (or creates) a database file and applies pending migrations.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens an isolated in-memory database with migrations applied.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already bootstrapped connection.
    ///
    /// The caller is responsible for having opened it via [`open_db`] or
    /// [`open_db_in_memory`] (pragmas + migrations).
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Read-only access to the underlying connection, outside any scope.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs `work` inside an IMMEDIATE (write-locking) transaction.
    ///
    /// Commits when `work` returns `Ok`; rolls back and returns the original
    /// error when it returns `Err`. A failing commit is reported as an error
    /// and the transaction is rolled back on drop.
    pub fn with_transaction<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        self.run_scope(TransactionBehavior::Immediate, "write", work)
    }

    /// Same contract as [`Gateway::with_transaction`] with a deferred
    /// transaction, for read-only work.
    pub fn with_read_transaction<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        self.run_scope(TransactionBehavior::Deferred, "read", work)
    }

    /// Closes the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> DbResult<()> {
        self.conn.close().map_err(|(_, err)| DbError::Sqlite(err))
    }

    fn run_scope<T, E, F>(
        &mut self,
        behavior: TransactionBehavior,
        mode: &'static str,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(behavior)
            .map_err(DbError::from)?;

        match work(&tx) {
            Ok(value) => {
                if let Err(err) = tx.commit() {
                    error!(
                        "event=tx_commit module=db status=error mode={mode} duration_ms={} error={}",
                        started_at.elapsed().as_millis(),
                        err
                    );
                    return Err(DbError::from(err).into());
                }
                debug!(
                    "event=tx_commit module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                match tx.rollback() {
                    Ok(()) => debug!(
                        "event=tx_rollback module=db status=ok mode={mode} duration_ms={}",
                        started_at.elapsed().as_millis()
                    ),
                    Err(rollback_err) => warn!(
                        "event=tx_rollback module=db status=error mode={mode} duration_ms={} error={}",
                        started_at.elapsed().as_millis(),
                        rollback_err
                    ),
                }
                Err(err)
            }
        }
    }
}
