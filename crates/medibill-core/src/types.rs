//! # Domain Types
//!
//! Document and line types shared by the purchase and sale forms.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────┐                │
//! │  │      Document       │ 1    * │      LineItem       │                │
//! │  │  ─────────────────  │───────►│  ─────────────────  │                │
//! │  │  kind               │        │  medicine_id/name   │                │
//! │  │  tax_mode           │        │  batch, expiry, mrp │                │
//! │  │  invoice_number     │        │  quantity           │                │
//! │  │  party_id           │        │  unit_price         │                │
//! │  │  purchase/payment   │        │  tax_rate (5%)      │                │
//! │  │  use_actual_price   │        │  discount_percent   │                │
//! │  └─────────────────────┘        └─────────────────────┘                │
//! │                                                                         │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐  │
//! │  │  TaxMode    │  │ DocumentKind │  │ PurchaseType │  │ PaymentType │  │
//! │  │  Exclusive  │  │  Purchase    │  │  Purchase    │  │  Cash       │  │
//! │  │  Inclusive  │  │  Sale        │  │  StockUpdate │  │  Credit     │  │
//! │  └─────────────┘  └──────────────┘  └──────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::input::{
    deserialize_amount, deserialize_discount, deserialize_optional_amount, deserialize_tax_rate,
    sanitize_amount,
};
use crate::DEFAULT_TAX_RATE_PERCENT;

// =============================================================================
// Tax Mode
// =============================================================================

/// Whether entered unit prices already contain tax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TaxMode {
    /// Unit price excludes tax; tax is added on top.
    #[default]
    Exclusive,
    /// Unit price includes tax; tax is backed out.
    Inclusive,
}

impl TaxMode {
    /// Parses the values the forms send ("exclusive" / "inclusive").
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exclusive" => Some(TaxMode::Exclusive),
            "inclusive" => Some(TaxMode::Inclusive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxMode::Exclusive => "exclusive",
            TaxMode::Inclusive => "inclusive",
        }
    }
}

// =============================================================================
// Document Kind
// =============================================================================

/// Purchase (stock coming in from a supplier) or sale (going out to a customer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Purchase,
    Sale,
}

impl DocumentKind {
    /// Line discounts only exist on sale invoices.
    #[inline]
    pub const fn allows_discount(&self) -> bool {
        matches!(self, DocumentKind::Sale)
    }

    /// Label for the counterparty of this document.
    pub const fn party_role(&self) -> &'static str {
        match self {
            DocumentKind::Purchase => "Supplier",
            DocumentKind::Sale => "Customer",
        }
    }
}

// =============================================================================
// Purchase / Payment Options
// =============================================================================

/// What a purchase invoice represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    /// A regular supplier invoice.
    #[default]
    Purchase,
    /// Opening stock or a correction; adds stock like a purchase.
    StockUpdate,
}

/// How the document is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Cash,
    Credit,
}

// =============================================================================
// Line Item
// =============================================================================

/// One row of a purchase or sale document.
///
/// Numeric fields hold whatever the form coerced them to. The pricing engine
/// re-sanitizes them, so a hand-built item with a negative quantity still
/// prices as zero. Deserializing applies the cell coercion rules, so numeric
/// text is parsed and junk or null becomes 0 (5% for the tax rate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct LineItem {
    /// Catalog id when the medicine was picked from the catalog.
    pub medicine_id: Option<String>,

    /// Medicine name as typed or selected.
    pub medicine_name: String,

    /// Lot number; blank when none.
    pub batch: String,

    #[ts(as = "Option<String>")]
    pub expiry: Option<NaiveDate>,

    /// Maximum retail price, informational.
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub mrp: Option<f64>,

    #[serde(deserialize_with = "deserialize_amount")]
    pub quantity: f64,

    /// Meaning depends on the document's [`TaxMode`].
    #[serde(deserialize_with = "deserialize_amount")]
    pub unit_price: f64,

    /// Percentage, 0-100.
    #[serde(deserialize_with = "deserialize_tax_rate")]
    pub tax_rate: f64,

    /// True when the tax rate came from the catalog (read-only in the form).
    pub tax_locked: bool,

    /// Percentage, 0-100. Ignored on purchases.
    #[serde(deserialize_with = "deserialize_discount")]
    pub discount_percent: f64,

    /// Price actually paid, submitted only when the document uses actual prices.
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub actual_price: Option<f64>,
}

impl Default for LineItem {
    fn default() -> Self {
        LineItem {
            medicine_id: None,
            medicine_name: String::new(),
            batch: String::new(),
            expiry: None,
            mrp: None,
            quantity: 0.0,
            unit_price: 0.0,
            tax_rate: DEFAULT_TAX_RATE_PERCENT,
            tax_locked: false,
            discount_percent: 0.0,
            actual_price: None,
        }
    }
}

impl LineItem {
    /// Creates a line for a named medicine at the default tax rate.
    pub fn new(medicine_name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        LineItem {
            medicine_name: medicine_name.into(),
            quantity,
            unit_price,
            ..LineItem::default()
        }
    }

    pub fn with_tax_rate(mut self, tax_rate: f64) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    pub fn with_discount(mut self, discount_percent: f64) -> Self {
        self.discount_percent = discount_percent;
        self
    }

    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = batch.into();
        self
    }

    pub fn with_medicine_id(mut self, id: impl Into<String>) -> Self {
        self.medicine_id = Some(id.into());
        self
    }

    /// Whether the row has a medicine reference (catalog id or typed name).
    pub fn has_medicine(&self) -> bool {
        self.medicine_id.as_deref().is_some_and(|id| !id.trim().is_empty())
            || !self.medicine_name.trim().is_empty()
    }

    /// A row nobody has touched: no medicine, no batch, zero quantity and
    /// zero price. Empty rows stay in the document but are skipped by totals
    /// and payloads.
    pub fn is_empty(&self) -> bool {
        !self.has_medicine()
            && self.batch.trim().is_empty()
            && sanitize_amount(self.quantity) == 0.0
            && sanitize_amount(self.unit_price) == 0.0
    }
}

// =============================================================================
// Document
// =============================================================================

/// A purchase or sale invoice with its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Document {
    pub kind: DocumentKind,

    #[serde(default)]
    pub tax_mode: TaxMode,

    #[serde(default)]
    pub invoice_number: String,

    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub date: Option<NaiveDate>,

    /// Supplier id for purchases, customer id for sales.
    #[serde(default)]
    pub party_id: Option<String>,

    #[serde(default)]
    pub purchase_type: PurchaseType,

    #[serde(default)]
    pub payment_type: PaymentType,

    /// Rate-type flag: submit each line's actual price alongside the unit price.
    #[serde(default)]
    pub use_actual_price: bool,

    #[serde(default)]
    pub lines: Vec<LineItem>,
}

impl Document {
    /// Creates an empty document of the given kind.
    pub fn new(kind: DocumentKind) -> Self {
        Document {
            kind,
            tax_mode: TaxMode::default(),
            invoice_number: String::new(),
            date: None,
            party_id: None,
            purchase_type: PurchaseType::default(),
            payment_type: PaymentType::default(),
            use_actual_price: false,
            lines: Vec::new(),
        }
    }

    pub fn purchase() -> Self {
        Document::new(DocumentKind::Purchase)
    }

    pub fn sale() -> Self {
        Document::new(DocumentKind::Sale)
    }

    pub fn with_tax_mode(mut self, tax_mode: TaxMode) -> Self {
        self.tax_mode = tax_mode;
        self
    }

    pub fn with_line(mut self, line: LineItem) -> Self {
        self.lines.push(line);
        self
    }

    /// Iterates over rows that count towards totals, with their row index.
    pub fn non_empty_lines(&self) -> impl Iterator<Item = (usize, &LineItem)> {
        self.lines.iter().enumerate().filter(|(_, l)| !l.is_empty())
    }

    /// Backend endpoint that accepts this document's payload.
    pub const fn submit_path(&self) -> &'static str {
        match self.kind {
            DocumentKind::Purchase => "/api/purchases",
            DocumentKind::Sale => "/api/sales",
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
