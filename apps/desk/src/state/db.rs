//! # Database State
//!
//! Wraps the `Database` connection for use in commands.
//!
//! The `SqlitePool` inside `Database` is thread-safe, so commands query it
//! concurrently without extra locking.

use medibill_db::Database;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let record = db_state.inner().purchases().record(&payload).await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
