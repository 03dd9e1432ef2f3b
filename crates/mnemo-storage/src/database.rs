// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use mnemo_core::MnemoError;
use tracing::debug;

/// Convert tokio-rusqlite errors to MnemoError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MnemoError {
    MnemoError::Storage {
        source: Box::new(e),
    }
}

/// A WAL-mode SQLite database handle.
///
/// Opening runs PRAGMA setup and all pending migrations. The handle is
/// cheap to share; every operation goes through the single background
/// connection, so read-then-write sequences inside one `call` closure
/// are atomic with respect to other callers.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, configure PRAGMAs, and
    /// run migrations.
    pub async fn open(path: &str) -> Result<Self, MnemoError> {
        // `open` surfaces the rusqlite error directly, unlike `call`.
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| MnemoError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| crate::migrations::run_migrations(conn))
            .await
            .map_err(|e| MnemoError::Storage {
                source: Box::new(e),
            })?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(&self) -> Result<(), MnemoError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
