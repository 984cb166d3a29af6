//! # State Module
//!
//! Application state for the desk app, one type per concern.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │   DbState    │  │ CatalogState │  │  DraftState  │  │ AppConfig  │  │
//! │  │              │  │              │  │              │  │            │  │
//! │  │  Database    │  │ Arc<RwLock<  │  │ Arc<Mutex<   │  │ currency   │  │
//! │  │  (SQLite     │  │  InMemory-   │  │  Document-   │  │ tax mode   │  │
//! │  │   pool)      │  │  Catalog>>   │  │  Draft>>     │  │ tax rate   │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has an internal connection pool                   │
//! │  • CatalogState: many readers, replaced wholesale on refresh           │
//! │  • DraftState: one writer at a time                                    │
//! │  • FormState: cursor and open dropdown, one writer at a time           │
//! │  • AppConfig: read-only after startup                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod catalog;
mod config;
mod db;
mod draft;
mod form;

pub use catalog::CatalogState;
pub use config::{AppConfig, CONFIG_FILE_NAME, DATABASE_FILE_NAME};
pub use db::DbState;
pub use draft::DraftState;
pub use form::{FormFocus, FormState, MedicineDropdown};
