//! # Payload Module
//!
//! Pre-submission checks and the rounded JSON body sent to the backend.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Document ──► validate_for_submission ──► build_payload ──► JSON       │
//! │                  │                             │                        │
//! │                  ├── invoice number            ├── skip empty rows      │
//! │                  ├── supplier / customer       ├── price each row       │
//! │                  ├── at least one row          ├── round to 2 decimals  │
//! │                  └── every row has a medicine  └── totals from rows     │
//! │                                                                         │
//! │  POST /api/purchases  (PurchasePayload)                                 │
//! │  POST /api/sales      (SalePayload)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding happens here and nowhere earlier: each row is priced at full
//! precision, then every figure in the payload is rounded on its own.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::input::{clamp_percent, sanitize_amount};
use crate::pricing::{compute_line_for, round_amount, LineResult, Totals};
use crate::types::{Document, DocumentKind, LineItem, PaymentType, PurchaseType, TaxMode};

/// Result type for submission checks.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Payload Types
// =============================================================================

/// One submitted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PayloadLine {
    pub medicine_id: Option<String>,
    pub medicine_name: String,
    pub batch: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Unit price including tax.
    pub net_unit_price: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub row_total: f64,

    /// Sales only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,

    #[ts(as = "Option<String>")]
    pub expiry: Option<NaiveDate>,
    pub mrp: Option<f64>,

    /// Present only when the document uses actual prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_price: Option<f64>,
}

/// Body of `POST /api/purchases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchasePayload {
    pub invoice_number: String,
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    /// Supplier id.
    pub party_id: Option<String>,
    pub tax_mode: TaxMode,
    pub purchase_type: PurchaseType,
    pub payment_type: PaymentType,
    pub use_actual_price: bool,
    pub subtotal: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub lines: Vec<PayloadLine>,
}

/// Body of `POST /api/sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalePayload {
    /// Bill number.
    pub invoice_number: String,
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    /// Customer id.
    pub party_id: Option<String>,
    pub tax_mode: TaxMode,
    pub payment_type: PaymentType,
    pub use_actual_price: bool,
    pub subtotal: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub lines: Vec<PayloadLine>,
}

/// A purchase or sale body, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionPayload {
    Purchase(PurchasePayload),
    Sale(SalePayload),
}

impl SubmissionPayload {
    pub fn kind(&self) -> DocumentKind {
        match self {
            SubmissionPayload::Purchase(_) => DocumentKind::Purchase,
            SubmissionPayload::Sale(_) => DocumentKind::Sale,
        }
    }

    pub fn lines(&self) -> &[PayloadLine] {
        match self {
            SubmissionPayload::Purchase(p) => &p.lines,
            SubmissionPayload::Sale(s) => &s.lines,
        }
    }

    pub fn grand_total(&self) -> f64 {
        match self {
            SubmissionPayload::Purchase(p) => p.grand_total,
            SubmissionPayload::Sale(s) => s.grand_total,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Checks that a document can be submitted.
///
/// ## Rules
/// 1. Invoice (bill) number is not blank
/// 2. A supplier (purchase) or customer (sale) is selected
/// 3. At least one non-empty row
/// 4. Every non-empty row names a medicine; `row` in the error is 1-based
///
/// ## Example
/// ```rust
/// use medibill_core::payload::validate_for_submission;
/// use medibill_core::{Document, LineItem, ValidationError};
///
/// let mut doc = Document::purchase().with_line(LineItem::new("Dolo 650", 1.0, 30.0));
/// assert_eq!(
///     validate_for_submission(&doc),
///     Err(ValidationError::required("invoice_number"))
/// );
///
/// doc.invoice_number = "INV-1".into();
/// doc.party_id = Some("s1".into());
/// assert!(validate_for_submission(&doc).is_ok());
/// ```
pub fn validate_for_submission(document: &Document) -> ValidationResult<()> {
    if document.invoice_number.trim().is_empty() {
        return Err(ValidationError::required("invoice_number"));
    }

    let has_party = document
        .party_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    if !has_party {
        return Err(ValidationError::required(
            document.kind.party_role().to_lowercase(),
        ));
    }

    let mut lines = document.non_empty_lines().peekable();
    if lines.peek().is_none() {
        return Err(ValidationError::NoLines);
    }

    for (index, line) in lines {
        if !line.has_medicine() {
            return Err(ValidationError::MissingMedicine { row: index + 1 });
        }
    }

    Ok(())
}

// =============================================================================
// Payload Building
// =============================================================================

/// Builds the submission body for a document.
///
/// Does not validate; call [`validate_for_submission`] first. Empty rows are
/// left out and document totals are the sums of the rows' full-precision
/// figures, rounded once.
pub fn build_payload(document: &Document) -> SubmissionPayload {
    let mut totals = Totals::default();
    let lines: Vec<PayloadLine> = document
        .non_empty_lines()
        .map(|(_, line)| {
            let priced = compute_line_for(line, document.tax_mode, document.kind);
            totals.accumulate(&priced);
            payload_line(document, line, priced)
        })
        .collect();

    let totals = totals.rounded();

    match document.kind {
        DocumentKind::Purchase => SubmissionPayload::Purchase(PurchasePayload {
            invoice_number: document.invoice_number.trim().to_string(),
            date: document.date,
            party_id: document.party_id.clone(),
            tax_mode: document.tax_mode,
            purchase_type: document.purchase_type,
            payment_type: document.payment_type,
            use_actual_price: document.use_actual_price,
            subtotal: totals.subtotal,
            tax_total: totals.tax_total,
            grand_total: totals.grand_total,
            lines,
        }),
        DocumentKind::Sale => SubmissionPayload::Sale(SalePayload {
            invoice_number: document.invoice_number.trim().to_string(),
            date: document.date,
            party_id: document.party_id.clone(),
            tax_mode: document.tax_mode,
            payment_type: document.payment_type,
            use_actual_price: document.use_actual_price,
            subtotal: totals.subtotal,
            tax_total: totals.tax_total,
            grand_total: totals.grand_total,
            lines,
        }),
    }
}

fn payload_line(document: &Document, line: &LineItem, priced: LineResult) -> PayloadLine {
    let discount_percent = document
        .kind
        .allows_discount()
        .then(|| round_amount(clamp_percent(line.discount_percent)));

    let actual_price = if document.use_actual_price {
        line.actual_price.map(|p| round_amount(sanitize_amount(p)))
    } else {
        None
    };

    PayloadLine {
        medicine_id: line
            .medicine_id
            .clone()
            .filter(|id| !id.trim().is_empty()),
        medicine_name: line.medicine_name.trim().to_string(),
        batch: line.batch.trim().to_string(),
        quantity: round_amount(priced.quantity),
        unit_price: round_amount(priced.unit_price),
        net_unit_price: round_amount(priced.net_unit_incl_tax),
        tax_rate: round_amount(clamp_percent(line.tax_rate)),
        tax_amount: round_amount(priced.tax_amount),
        row_total: round_amount(priced.row_total),
        discount_percent,
        expiry: line.expiry,
        mrp: line.mrp.map(|m| round_amount(sanitize_amount(m))),
        actual_price,
    }
}
