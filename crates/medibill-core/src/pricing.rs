//! # Pricing Module
//!
//! The pricing/tax engine: derives per-line figures and document totals for
//! purchase and sale invoices.
//!
//! ## Tax Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  q = quantity   u = unit price   t = tax% / 100   d = discount% / 100   │
//! │                                                                         │
//! │  discounted_line = q × u × (1 − d)                                      │
//! │                                                                         │
//! │  EXCLUSIVE (price + tax)            INCLUSIVE (price contains tax)     │
//! │  ───────────────────────            ──────────────────────────────     │
//! │  unit_before_tax  = u               unit_before_tax  = u / (1 + t)     │
//! │  net_unit         = u × (1 + t)     net_unit         = u               │
//! │  pre_tax_total    = discounted      pre_tax_total    = ubt × q × (1−d) │
//! │  tax_amount       = discounted × t  tax_amount       = discounted − pre│
//! │  row_total        = pre + tax       row_total        = discounted      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Precision
//! Everything is `f64` at full precision. Rounding to two decimals happens
//! only in [`round_amount`] / [`format_amount`], i.e. when a figure is shown
//! or written into a payload. Accumulators are never rounded.
//!
//! ## Usage
//! ```rust
//! use medibill_core::pricing::compute_line;
//! use medibill_core::{LineItem, TaxMode};
//!
//! let line = LineItem::new("Amoxicillin 250", 100.0, 10.5);
//! let result = compute_line(&line, TaxMode::Exclusive);
//!
//! assert!((result.row_total - 1102.5).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::input::{clamp_percent, sanitize_amount};
use crate::types::{Document, DocumentKind, LineItem, TaxMode};
use crate::DISPLAY_DECIMALS;

// =============================================================================
// Line Result
// =============================================================================

/// Derived figures for one row, as shown in the "Net Unit Price" and
/// "Total Price" cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineResult {
    /// Quantity after coercion.
    pub quantity: f64,
    /// Entered unit price after coercion.
    pub unit_price: f64,
    pub unit_before_tax: f64,
    pub net_unit_incl_tax: f64,
    /// `quantity × unit_price × (1 − discount)`.
    pub discounted_line: f64,
    pub pre_tax_total: f64,
    pub tax_amount: f64,
    pub row_total: f64,
}

/// Prices one row.
///
/// The row's own `discount_percent` is applied; use [`compute_line_for`]
/// when the document kind decides whether discounts exist.
///
/// Never fails: bad numbers are treated as 0 and percentages are clamped to
/// `[0, 100]`, so the inclusive branch can always divide by `1 + t ≥ 1`.
pub fn compute_line(item: &LineItem, tax_mode: TaxMode) -> LineResult {
    price(
        sanitize_amount(item.quantity),
        sanitize_amount(item.unit_price),
        clamp_percent(item.tax_rate) / 100.0,
        clamp_percent(item.discount_percent) / 100.0,
        tax_mode,
    )
}

/// Prices one row within a document of the given kind.
/// Purchases carry no line discount.
pub fn compute_line_for(item: &LineItem, tax_mode: TaxMode, kind: DocumentKind) -> LineResult {
    let discount = if kind.allows_discount() {
        clamp_percent(item.discount_percent) / 100.0
    } else {
        0.0
    };

    price(
        sanitize_amount(item.quantity),
        sanitize_amount(item.unit_price),
        clamp_percent(item.tax_rate) / 100.0,
        discount,
        tax_mode,
    )
}

fn price(q: f64, u: f64, t: f64, d: f64, tax_mode: TaxMode) -> LineResult {
    let raw_line = q * u;
    let discounted_line = raw_line * (1.0 - d);

    match tax_mode {
        TaxMode::Exclusive => {
            let pre_tax_total = discounted_line;
            let tax_amount = discounted_line * t;
            LineResult {
                quantity: q,
                unit_price: u,
                unit_before_tax: u,
                net_unit_incl_tax: u * (1.0 + t),
                discounted_line,
                pre_tax_total,
                tax_amount,
                row_total: pre_tax_total + tax_amount,
            }
        }
        TaxMode::Inclusive => {
            let unit_before_tax = u / (1.0 + t);
            let pre_tax_total = (unit_before_tax * q) * (1.0 - d);
            LineResult {
                quantity: q,
                unit_price: u,
                unit_before_tax,
                net_unit_incl_tax: u,
                discounted_line,
                pre_tax_total,
                tax_amount: discounted_line - pre_tax_total,
                row_total: discounted_line,
            }
        }
    }
}

// =============================================================================
// Document Totals
// =============================================================================

/// The subtotal / tax / grand-total summary block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    /// Non-empty rows that contributed.
    pub line_count: usize,
    pub subtotal: f64,
    pub tax_total: f64,
    /// Sum of the rows' `row_total`, so it always agrees with the row cells.
    pub grand_total: f64,
}

impl Totals {
    /// Adds one priced row to the running totals.
    pub fn accumulate(&mut self, line: &LineResult) {
        self.line_count += 1;
        self.subtotal += line.pre_tax_total;
        self.tax_total += line.tax_amount;
        self.grand_total += line.row_total;
    }

    /// Copy with every amount rounded to two decimals, for payloads.
    pub fn rounded(&self) -> Totals {
        Totals {
            line_count: self.line_count,
            subtotal: round_amount(self.subtotal),
            tax_total: round_amount(self.tax_total),
            grand_total: round_amount(self.grand_total),
        }
    }
}

/// Prices every row of a document, empty rows included, in display order.
pub fn compute_lines(document: &Document) -> Vec<LineResult> {
    document
        .lines
        .iter()
        .map(|line| compute_line_for(line, document.tax_mode, document.kind))
        .collect()
}

/// Aggregates a document.
///
/// Empty rows (see [`LineItem::is_empty`]) are skipped but stay in the
/// document. The document is not modified.
///
/// ## Example
/// ```rust
/// use medibill_core::pricing::compute_document_totals;
/// use medibill_core::{Document, LineItem};
///
/// let doc = Document::purchase()
///     .with_line(LineItem::new("Cefixime 200", 100.0, 10.5))
///     .with_line(LineItem::default());
///
/// let totals = compute_document_totals(&doc);
/// assert_eq!(totals.line_count, 1);
/// assert!((totals.grand_total - 1102.5).abs() < 1e-9);
/// ```
pub fn compute_document_totals(document: &Document) -> Totals {
    document
        .non_empty_lines()
        .fold(Totals::default(), |mut totals, (_, line)| {
            totals.accumulate(&compute_line_for(line, document.tax_mode, document.kind));
            totals
        })
}

// =============================================================================
// Presentation Rounding
// =============================================================================

/// Rounds to two decimals, half away from zero.
///
/// Only call this at the edge (display, payload). 13.125 becomes 13.13.
#[inline]
pub fn round_amount(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats an amount for display with a currency symbol, e.g. `₹1102.50`.
pub fn format_amount(value: f64, symbol: &str) -> String {
    let rounded = round_amount(value);
    if rounded < 0.0 {
        format!("-{}{:.*}", symbol, DISPLAY_DECIMALS, rounded.abs())
    } else {
        format!("{}{:.*}", symbol, DISPLAY_DECIMALS, rounded.abs())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
