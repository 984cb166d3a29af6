//! # medibill-db: Database Layer for MediBill
//!
//! SQLite storage for the medicine catalog, stock batches, suppliers,
//! customers, and recorded purchase and sale invoices.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MediBill Data Flow                               │
//! │                                                                         │
//! │  save_draft command                                                     │
//! │       │  validate_for_submission → build_payload                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     medibill-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ MedicineRepo   │    │  (embedded)  │  │   │
//! │  │   │ SqlitePool    │    │ PartyRepo      │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs      │    │ PurchaseRepo   │    │              │  │   │
//! │  │   │               │    │ SaleRepo       │    │ 002_search   │  │   │
//! │  │   │               │    │ ReportRepo     │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  medibill.db (platform data dir, or --db <path>)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medibill_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("medibill.db")).await?;
//! let record = db.purchases().record(&payload).await?;
//! let catalog = db.catalog_snapshot().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::medicine::MedicineRepository;
pub use repository::party::{PartyRepository, PartyRole};
pub use repository::purchase::{PurchaseItemRecord, PurchaseRecord, PurchaseRepository};
pub use repository::report::ReportRepository;
pub use repository::sale::{SaleRecord, SaleRepository};
