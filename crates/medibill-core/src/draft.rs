//! # Draft Module
//!
//! The editable state behind a purchase or sale entry form.
//!
//! ## Row Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Draft Rows                                       │
//! │                                                                         │
//! │  new(Purchase, 2)          set_field(1, Quantity, "10")                │
//! │  ┌───┬──────────┐          ┌───┬──────────┐                            │
//! │  │ 0 │ (empty)  │          │ 0 │ (empty)  │                            │
//! │  │ 1 │ (empty)  │   ──►    │ 1 │ qty 10   │  ◄── last row edited      │
//! │  └───┴──────────┘          │ 2 │ (empty)  │  ◄── fresh row appended   │
//! │                            └───┴──────────┘                            │
//! │                                                                         │
//! │  Invariant: the last row is always empty, so there is always a row    │
//! │  to type into. Empty rows never count towards totals or payloads.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tax Lock
//! Picking a medicine from the catalog copies its tax rate into the row and
//! marks it locked (read-only in the form). Typing into the tax cell, or
//! retyping the medicine name, unlocks it again.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::catalog::{Batch, Medicine, Party};
use crate::error::{CoreError, CoreResult};
use crate::input::{
    clamp_percent, parse_amount, parse_discount, parse_expiry, parse_optional_amount,
    parse_percent, parse_quantity,
};
use crate::pricing::{compute_document_totals, compute_lines, LineResult, Totals};
use crate::types::{Document, DocumentKind, LineItem, PaymentType, PurchaseType, TaxMode};
use crate::DEFAULT_TAX_RATE_PERCENT;

// =============================================================================
// Line Field
// =============================================================================

/// An editable cell of a line row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineField {
    MedicineName,
    Batch,
    Expiry,
    Mrp,
    TaxRate,
    Quantity,
    UnitPrice,
    ActualPrice,
    Discount,
}

impl LineField {
    /// Parses the snake_case field names the forms and CLI use.
    pub fn parse(value: &str) -> Option<Self> {
        let field = match value.trim() {
            "medicine_name" => LineField::MedicineName,
            "batch" => LineField::Batch,
            "expiry" => LineField::Expiry,
            "mrp" => LineField::Mrp,
            "tax_rate" => LineField::TaxRate,
            "quantity" => LineField::Quantity,
            "unit_price" => LineField::UnitPrice,
            "actual_price" => LineField::ActualPrice,
            "discount" => LineField::Discount,
            _ => return None,
        };
        Some(field)
    }
}

// =============================================================================
// Document Draft
// =============================================================================

/// An invoice being typed in.
///
/// Wraps a [`Document`] and enforces the row rules of the entry grid.
///
/// ## Usage
/// ```rust
/// use medibill_core::{DocumentDraft, DocumentKind, LineField};
///
/// let mut draft = DocumentDraft::new(DocumentKind::Purchase, 2);
/// draft.set_field(0, LineField::MedicineName, "Dolo 650").unwrap();
/// draft.set_field(0, LineField::Quantity, "100").unwrap();
/// draft.set_field(0, LineField::UnitPrice, "10.5").unwrap();
///
/// assert!((draft.totals().grand_total - 1102.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentDraft {
    document: Document,

    /// Display name of the selected supplier or customer.
    party_name: String,

    /// Rate new rows start with and blank tax cells fall back to.
    default_tax_rate: f64,

    initial_rows: usize,
}

impl DocumentDraft {
    /// Creates a draft with `initial_rows` empty rows (at least one).
    pub fn new(kind: DocumentKind, initial_rows: usize) -> Self {
        let initial_rows = initial_rows.max(1);
        let mut document = Document::new(kind);
        document.lines = vec![LineItem::default(); initial_rows];

        DocumentDraft {
            document,
            party_name: String::new(),
            default_tax_rate: DEFAULT_TAX_RATE_PERCENT,
            initial_rows,
        }
    }

    /// Uses `rate` instead of 5% for new rows and blank tax cells.
    pub fn with_default_tax_rate(mut self, rate: f64) -> Self {
        self.default_tax_rate = clamp_percent(rate);
        for line in self.document.lines.iter_mut().filter(|l| l.is_empty()) {
            line.tax_rate = self.default_tax_rate;
        }
        self
    }

    pub fn with_tax_mode(mut self, tax_mode: TaxMode) -> Self {
        self.document.tax_mode = tax_mode;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn kind(&self) -> DocumentKind {
        self.document.kind
    }

    pub fn tax_mode(&self) -> TaxMode {
        self.document.tax_mode
    }

    pub fn rows(&self) -> &[LineItem] {
        &self.document.lines
    }

    pub fn row(&self, index: usize) -> CoreResult<&LineItem> {
        let len = self.document.lines.len();
        self.document
            .lines
            .get(index)
            .ok_or(CoreError::RowOutOfRange { index, len })
    }

    pub fn party_name(&self) -> &str {
        &self.party_name
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Owned copy of the underlying document, empty rows included.
    pub fn to_document(&self) -> Document {
        self.document.clone()
    }

    /// Priced figures for every row, in display order.
    pub fn line_results(&self) -> Vec<LineResult> {
        compute_lines(&self.document)
    }

    pub fn totals(&self) -> Totals {
        compute_document_totals(&self.document)
    }

    // -------------------------------------------------------------------------
    // Row Editing
    // -------------------------------------------------------------------------

    /// Writes typed text into one cell, coercing it for the field.
    ///
    /// ## Errors
    /// [`CoreError::RowOutOfRange`] when `row` does not exist.
    pub fn set_field(&mut self, row: usize, field: LineField, text: &str) -> CoreResult<()> {
        let default_tax_rate = self.default_tax_rate;
        let line = self.row_mut(row)?;

        match field {
            LineField::MedicineName => {
                line.medicine_name = text.to_string();
                line.medicine_id = None;
                line.tax_locked = false;
            }
            LineField::Batch => line.batch = text.trim().to_string(),
            LineField::Expiry => line.expiry = parse_expiry(text),
            LineField::Mrp => line.mrp = parse_optional_amount(text),
            LineField::TaxRate => {
                line.tax_rate = parse_percent(text, default_tax_rate);
                line.tax_locked = false;
            }
            LineField::Quantity => line.quantity = parse_quantity(text),
            LineField::UnitPrice => line.unit_price = parse_amount(text),
            LineField::ActualPrice => line.actual_price = parse_optional_amount(text),
            LineField::Discount => line.discount_percent = parse_discount(text),
        }

        debug!(row, ?field, "Draft cell edited");
        self.ensure_trailing_empty_row();
        Ok(())
    }

    /// Fills a row from a catalog medicine.
    ///
    /// Picking a different medicine clears the row's batch details.
    pub fn select_medicine(&mut self, row: usize, medicine: &Medicine) -> CoreResult<()> {
        let line = self.row_mut(row)?;

        if line.medicine_id.as_deref() != Some(medicine.id.as_str()) {
            line.batch.clear();
            line.expiry = None;
            line.mrp = None;
        }

        line.medicine_id = Some(medicine.id.clone());
        line.medicine_name = medicine.name.clone();
        line.tax_rate = medicine.effective_tax_rate();
        line.tax_locked = true;

        debug!(row, medicine_id = %medicine.id, "Medicine selected");
        self.ensure_trailing_empty_row();
        Ok(())
    }

    /// Fills a row's batch number, and expiry and MRP when the batch has them.
    pub fn select_batch(&mut self, row: usize, batch: &Batch) -> CoreResult<()> {
        let line = self.row_mut(row)?;

        line.batch = batch.batch_no.clone();
        if batch.expiry.is_some() {
            line.expiry = batch.expiry;
        }
        if batch.mrp.is_some() {
            line.mrp = batch.mrp;
        }

        debug!(row, batch_no = %batch.batch_no, "Batch selected");
        self.ensure_trailing_empty_row();
        Ok(())
    }

    /// Appends an empty row and returns its index.
    pub fn add_row(&mut self) -> usize {
        self.document.lines.push(self.empty_row());
        self.document.lines.len() - 1
    }

    /// Removes a row. Removing the only row leaves one empty row behind.
    pub fn remove_row(&mut self, row: usize) -> CoreResult<LineItem> {
        let len = self.document.lines.len();
        if row >= len {
            return Err(CoreError::RowOutOfRange { index: row, len });
        }

        let removed = self.document.lines.remove(row);
        if self.document.lines.is_empty() {
            self.document.lines.push(self.empty_row());
        }
        self.ensure_trailing_empty_row();
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Header
    // -------------------------------------------------------------------------

    /// Switches between tax-exclusive and tax-inclusive unit prices.
    /// Every row reprices on the next read; entered prices are kept.
    pub fn set_tax_mode(&mut self, tax_mode: TaxMode) {
        debug!(tax_mode = tax_mode.as_str(), "Draft tax mode changed");
        self.document.tax_mode = tax_mode;
    }

    pub fn set_use_actual_price(&mut self, use_actual_price: bool) {
        self.document.use_actual_price = use_actual_price;
    }

    pub fn set_invoice_number(&mut self, invoice_number: &str) {
        self.document.invoice_number = invoice_number.trim().to_string();
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.document.date = date;
    }

    pub fn set_party(&mut self, party: &Party) {
        self.document.party_id = Some(party.id.clone());
        self.party_name = party.name.clone();
    }

    pub fn clear_party(&mut self) {
        self.document.party_id = None;
        self.party_name.clear();
    }

    pub fn set_purchase_type(&mut self, purchase_type: PurchaseType) {
        self.document.purchase_type = purchase_type;
    }

    pub fn set_payment_type(&mut self, payment_type: PaymentType) {
        self.document.payment_type = payment_type;
    }

    /// Starts over with the same kind, tax mode and row count.
    pub fn reset(&mut self) {
        let fresh = DocumentDraft::new(self.document.kind, self.initial_rows)
            .with_default_tax_rate(self.default_tax_rate)
            .with_tax_mode(self.document.tax_mode);
        *self = fresh;
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn row_mut(&mut self, index: usize) -> CoreResult<&mut LineItem> {
        let len = self.document.lines.len();
        self.document
            .lines
            .get_mut(index)
            .ok_or(CoreError::RowOutOfRange { index, len })
    }

    fn empty_row(&self) -> LineItem {
        LineItem {
            tax_rate: self.default_tax_rate,
            ..LineItem::default()
        }
    }

    fn ensure_trailing_empty_row(&mut self) {
        let needs_row = self
            .document
            .lines
            .last()
            .map_or(true, |last| !last.is_empty());
        if needs_row {
            self.add_row();
        }
    }
}
