//! # MediBill Desk Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main.rs ────► init tracing, hand the arguments to the library          │
//! │  cli.rs ─────► totals / save / search                                   │
//! │  commands/ ──► draft editing, catalog lookups, save_draft               │
//! │  state/ ─────► DbState, CatalogState, DraftState, AppConfig             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    medibill_desk_lib::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match medibill_desk_lib::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::FAILURE
        }
    }
}
