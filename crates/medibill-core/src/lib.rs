//! # medibill-core: Pricing and Invoice Logic for MediBill
//!
//! This crate holds everything the purchase and sale forms compute, with no
//! I/O of its own.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MediBill Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Purchase / Sale entry forms                     │   │
//! │  │    Header ──► Line grid ──► Totals block ──► Submit            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ commands                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    medibill-desk (app)                          │   │
//! │  │    new_draft, edit_field, choose_medicine, save_draft, ...     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ medibill-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │ pricing │ │  draft  │ │ catalog │ │ payload │ │  input  │  │   │
//! │  │   │ lines   │ │  rows   │ │ search  │ │ submit  │ │ coerce  │  │   │
//! │  │   │ totals  │ │ header  │ │ parties │ │ checks  │ │ expiry  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 medibill-db (Database Layer)                    │   │
//! │  │       SQLite catalog, stock batches, purchase/sale records      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Document, LineItem and the small enums around them
//! - [`pricing`] - Line and document tax/total computation
//! - [`input`] - Form text to numbers
//! - [`draft`] - The editable invoice form
//! - [`catalog`] - Medicines, batches, suppliers, customers and search
//! - [`navigation`] - Autocomplete and grid keyboard movement
//! - [`payload`] - Submission checks and the rounded wire payload
//! - [`stock`] - Stock summaries, low-stock levels and dashboard figures
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use medibill_core::pricing::{compute_line, round_amount};
//! use medibill_core::{LineItem, TaxMode};
//!
//! // 10 strips at 110 each, price already contains 10% tax
//! let line = LineItem::new("Metformin 500", 10.0, 110.0).with_tax_rate(10.0);
//! let result = compute_line(&line, TaxMode::Inclusive);
//!
//! assert_eq!(round_amount(result.tax_amount), 100.0);
//! assert_eq!(round_amount(result.row_total), 1100.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod draft;
pub mod error;
pub mod input;
pub mod navigation;
pub mod payload;
pub mod pricing;
pub mod stock;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{Batch, CatalogSource, InMemoryCatalog, Medicine, Party};
pub use draft::{DocumentDraft, LineField};
pub use error::{CoreError, CoreResult, ValidationError};
pub use payload::{build_payload, validate_for_submission, SubmissionPayload};
pub use pricing::{compute_document_totals, compute_line, compute_line_for, LineResult, Totals};
pub use stock::{MedicineSummary, StockLevel, StockThresholds};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax rate a row starts with, and falls back to when its cell is blank.
pub const DEFAULT_TAX_RATE_PERCENT: f64 = 5.0;

/// Characters needed before medicine autocomplete runs.
pub const MIN_MEDICINE_QUERY_CHARS: usize = 2;

/// Characters needed before supplier/customer autocomplete runs.
pub const MIN_PARTY_QUERY_CHARS: usize = 1;

/// Decimal places used for display and payload amounts.
pub const DISPLAY_DECIMALS: usize = 2;

/// Rows a fresh draft starts with.
pub const DEFAULT_DRAFT_ROWS: usize = 2;
