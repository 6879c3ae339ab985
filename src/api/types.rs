//! Shared state for the API layer.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::db;

/// Shared context for all API routes.
///
/// Holds the database path rather than a pooled connection: the database
/// file can be atomically replaced at runtime (`POST /api/database`), so
/// every request opens its own short-lived connection against the current
/// file.
#[derive(Clone)]
pub struct ApiContext {
    pub db_path: Arc<PathBuf>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path: Arc::new(db_path),
        }
    }

    /// Open the database for a read path. The file must already exist;
    /// readers never create an empty database just to report zero rows.
    pub fn open_existing(&self) -> Result<Connection, ApiError> {
        if !self.db_path.exists() {
            return Err(ApiError::DatabaseUnavailable);
        }
        Ok(db::open_database_readonly_schema(&self.db_path)?)
    }

    /// Open the database for a write path, creating and migrating it on
    /// first use.
    pub fn open_or_create(&self) -> Result<Connection, ApiError> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(db::open_database(&self.db_path)?)
    }
}
