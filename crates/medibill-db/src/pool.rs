//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DbConfig::new(path)          ← pool settings                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await  ← open pool, WAL, foreign keys, migrate   │
//! │       │                                                                 │
//! │       ├──► db.medicines()   MedicineRepository                          │
//! │       ├──► db.parties()     PartyRepository                             │
//! │       ├──► db.purchases()   PurchaseRepository                          │
//! │       ├──► db.sales()       SaleRepository                              │
//! │       ├──► db.reports()     ReportRepository                            │
//! │       └──► db.catalog_snapshot()  InMemoryCatalog for autocomplete      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use medibill_core::catalog::{Batch, InMemoryCatalog};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::medicine::MedicineRepository;
use crate::repository::party::{PartyRepository, PartyRole};
use crate::repository::purchase::PurchaseRepository;
use crate::repository::report::ReportRepository;
use crate::repository::sale::SaleRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/medibill.db").max_connections(5);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Default: 5
    pub max_connections: u32,

    /// Default: 1
    pub min_connections: u32,

    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for a database file, created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for tests).
    ///
    /// Every connection to `:memory:` is a separate database, so the pool is
    /// pinned to one connection that never idles out.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(3600),
            run_migrations: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        // SQLite ships with foreign keys off
        Ok(options.foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, applies migrations.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::new("./medibill.db")).await?;
    /// let found = db.medicines().search("para", 10).await?;
    /// ```
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Connection pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn medicines(&self) -> MedicineRepository {
        MedicineRepository::new(self.pool.clone())
    }

    pub fn parties(&self) -> PartyRepository {
        PartyRepository::new(self.pool.clone())
    }

    pub fn purchases(&self) -> PurchaseRepository {
        PurchaseRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Loads the whole catalog (medicines with batches, suppliers, customers)
    /// into memory for form autocomplete.
    pub async fn catalog_snapshot(&self) -> DbResult<InMemoryCatalog> {
        let mut medicines = self.medicines().list().await?;

        let batches: Vec<Batch> = sqlx::query_as(
            r#"
            SELECT id, medicine_id, batch_no, expiry, mrp, purchase_rate, quantity
            FROM batches
            ORDER BY expiry IS NULL, expiry, batch_no
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_medicine: HashMap<String, Vec<Batch>> = HashMap::new();
        for batch in batches {
            by_medicine
                .entry(batch.medicine_id.clone())
                .or_default()
                .push(batch);
        }
        for medicine in &mut medicines {
            medicine.batches = by_medicine.remove(&medicine.id).unwrap_or_default();
        }

        let suppliers = self.parties().list(PartyRole::Supplier).await?;
        let customers = self.parties().list(PartyRole::Customer).await?;

        info!(
            medicines = medicines.len(),
            suppliers = suppliers.len(),
            customers = customers.len(),
            "Catalog snapshot loaded"
        );

        Ok(InMemoryCatalog::new()
            .with_medicines(medicines)
            .with_suppliers(suppliers)
            .with_customers(customers))
    }

    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// True when the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
