//! # Repository Module
//!
//! Database repository implementations for MediBill.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  command ──► db.purchases().record(&payload)                            │
//! │                   │                                                     │
//! │                   ▼  one transaction                                    │
//! │              PurchaseRepository                                         │
//! │              ├── medicine::find_or_create   (medicines)                 │
//! │              ├── medicine::find_or_create_batch (batches)               │
//! │              ├── medicine::adjust_stock     (batches.quantity)          │
//! │              └── INSERT purchases / purchase_items                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`MedicineRepository`] - Medicines, batches and stock
//! - [`PartyRepository`] - Suppliers and customers
//! - [`PurchaseRepository`] - Recording purchase invoices
//! - [`SaleRepository`] - Recording sale invoices
//! - [`ReportRepository`] - Stock summaries and dashboard figures
//!
//! Repository methods take the pool; the `pub(crate)` helpers in each module
//! take a `&mut SqliteConnection` so the invoice repositories can run them
//! inside their own transaction.

pub mod medicine;
pub mod party;
pub mod purchase;
pub mod report;
pub mod sale;

pub use medicine::MedicineRepository;
pub use party::{PartyRepository, PartyRole};
pub use purchase::{PurchaseItemRecord, PurchaseRecord, PurchaseRepository};
pub use report::ReportRepository;
pub use sale::{SaleRecord, SaleRepository};

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern and wraps
/// the needle in wildcards.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Stock units moved by a line quantity. Fractional quantities round to the
/// nearest unit.
pub(crate) fn stock_units(quantity: f64) -> i64 {
    if quantity.is_finite() {
        quantity.round() as i64
    } else {
        0
    }
}
