//! # MediBill Desk Library
//!
//! Application layer for purchase and sale entry: configuration, logging,
//! state and the commands the entry form calls.
//!
//! ## Module Organization
//! ```text
//! medibill_desk_lib/
//! ├── lib.rs          ◄─── You are here (startup, tracing)
//! ├── cli.rs          ◄─── Command-line entry point
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── config.rs   ◄─── AppConfig (toml + MEDIBILL_* env)
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── catalog.rs  ◄─── Autocomplete snapshot
//! │   ├── draft.rs    ◄─── The invoice being typed in
//! │   └── form.rs     ◄─── Grid cursor and medicine dropdown
//! ├── commands/
//! │   ├── draft.rs    ◄─── Cell edits, tax mode, header
//! │   ├── catalog.rs  ◄─── Searches and selections
//! │   ├── navigation.rs ◄─ Dropdown keys and cursor moves
//! │   ├── party.rs    ◄─── Supplier / customer maintenance
//! │   ├── stock.rs    ◄─── Medicines page and dashboard
//! │   └── submit.rs   ◄─── save_draft
//! └── error.rs        ◄─── ApiError for commands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing        RUST_LOG or "info,medibill=debug,sqlx=warn"    │
//! │  2. AppConfig::load     defaults → medibill.toml → MEDIBILL_* env      │
//! │  3. Database::new       platform data dir or --db, migrations applied  │
//! │  4. CatalogState::load  snapshot of medicines, batches and parties     │
//! │  5. DraftState          empty draft (purchase) from config             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use medibill_core::DocumentKind;
use medibill_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use error::ApiError;
use state::{AppConfig, CatalogState, DbState, DraftState, FormState};

pub use cli::run;

/// All application state, opened and ready for commands.
#[derive(Debug, Clone)]
pub struct App {
    pub config: AppConfig,
    pub db: DbState,
    pub catalog: CatalogState,
    pub draft: DraftState,
    pub form: FormState,
}

impl App {
    /// Opens the configured database and builds the state objects.
    pub async fn open(config: AppConfig) -> Result<Self, ApiError> {
        let db_path = config.resolve_database_path()?;
        info!(?db_path, "Database path determined");

        let db = Database::new(DbConfig::new(db_path)).await?;
        info!("Database connected and migrations applied");

        App::with_database(config, db).await
    }

    /// Builds the state objects around an already-open database.
    pub async fn with_database(config: AppConfig, db: Database) -> Result<Self, ApiError> {
        let catalog = CatalogState::load(&db).await?;
        let draft = DraftState::new(config.new_draft(DocumentKind::Purchase));

        info!("State initialized");
        Ok(App {
            config,
            db: DbState::new(db),
            catalog,
            draft,
            form: FormState::new(),
        })
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=medibill_db=trace` - Trace the database crate only
/// - Default: `info,medibill=debug,sqlx=warn`
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,medibill=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
