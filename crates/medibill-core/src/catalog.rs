//! # Catalog Module
//!
//! Medicines with their stock batches, and the parties (suppliers and
//! customers) the forms pick from.
//!
//! ## Data Source Seam
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Catalog Access                                   │
//! │                                                                         │
//! │   Draft / commands                                                      │
//! │        │  search_medicines("para", 10)                                  │
//! │        ▼                                                                │
//! │   ┌──────────────────────┐                                              │
//! │   │  dyn CatalogSource   │  list / search / get                         │
//! │   └──────────┬───────────┘                                              │
//! │              │                                                          │
//! │      ┌───────┴──────────────┐                                           │
//! │      ▼                      ▼                                           │
//! │  InMemoryCatalog       medibill-db catalog_snapshot()                   │
//! │  (tests, snapshots)    (loads SQLite into an InMemoryCatalog)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Search Rules
//! - Case-insensitive substring match on the name.
//! - Medicine queries shorter than [`MIN_MEDICINE_QUERY_CHARS`] return nothing;
//!   party queries need [`MIN_PARTY_QUERY_CHARS`].
//! - The same medicine id never appears twice in one result list.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::input::clamp_percent;
use crate::types::DocumentKind;
use crate::{DEFAULT_TAX_RATE_PERCENT, MIN_MEDICINE_QUERY_CHARS, MIN_PARTY_QUERY_CHARS};

// =============================================================================
// Catalog Types
// =============================================================================

/// A medicine in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
    pub brand: Option<String>,

    /// Catalog GST rate. When present the form locks the row's tax cell.
    pub tax_rate: Option<f64>,

    /// Stock lots, loaded separately from the medicine row.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub batches: Vec<Batch>,
}

impl Medicine {
    /// Creates a medicine with no SKU, brand, tax rate or batches.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Medicine {
            id: id.into(),
            name: name.into(),
            sku: None,
            brand: None,
            tax_rate: None,
            batches: Vec::new(),
        }
    }

    pub fn with_tax_rate(mut self, tax_rate: f64) -> Self {
        self.tax_rate = Some(tax_rate);
        self
    }

    pub fn with_batch(mut self, batch: Batch) -> Self {
        self.batches.push(batch);
        self
    }

    /// Tax rate a row gets when this medicine is picked.
    pub fn effective_tax_rate(&self) -> f64 {
        clamp_percent(self.tax_rate.unwrap_or(DEFAULT_TAX_RATE_PERCENT))
    }

    /// Finds a batch by its lot number (exact, trimmed).
    pub fn batch(&self, batch_no: &str) -> Option<&Batch> {
        let batch_no = batch_no.trim();
        self.batches.iter().find(|b| b.batch_no == batch_no)
    }

    /// Total units on hand across all batches.
    pub fn stock_on_hand(&self) -> i64 {
        self.batches.iter().map(|b| b.quantity).sum()
    }
}

/// A stock lot of one medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Batch {
    pub id: String,
    pub medicine_id: String,
    pub batch_no: String,

    #[ts(as = "Option<String>")]
    pub expiry: Option<NaiveDate>,

    pub mrp: Option<f64>,

    /// Net unit price paid on the purchase that created the lot.
    pub purchase_rate: Option<f64>,

    /// Units on hand.
    pub quantity: i64,
}

impl Batch {
    pub fn new(
        id: impl Into<String>,
        medicine_id: impl Into<String>,
        batch_no: impl Into<String>,
    ) -> Self {
        Batch {
            id: id.into(),
            medicine_id: medicine_id.into(),
            batch_no: batch_no.into(),
            expiry: None,
            mrp: None,
            purchase_rate: None,
            quantity: 0,
        }
    }

    /// Whether the lot has expired on `today`. Lots without an expiry never do.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry.is_some_and(|expiry| expiry < today)
    }
}

/// A supplier or customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub gstin: Option<String>,
}

impl Party {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Party {
            id: id.into(),
            name: name.into(),
            phone: None,
            email: None,
            address: None,
            gstin: None,
        }
    }
}

// =============================================================================
// Catalog Source Trait
// =============================================================================

/// Read access to medicines, suppliers and customers.
///
/// Implementations apply the search rules from the module docs; use
/// [`filter_medicines`] and [`filter_parties`] to get them for free.
pub trait CatalogSource: Send + Sync {
    fn list_medicines(&self) -> Vec<Medicine>;
    fn search_medicines(&self, query: &str, limit: usize) -> Vec<Medicine>;
    fn get_medicine(&self, id: &str) -> Option<Medicine>;

    fn list_suppliers(&self) -> Vec<Party>;
    fn search_suppliers(&self, query: &str, limit: usize) -> Vec<Party>;
    fn get_supplier(&self, id: &str) -> Option<Party>;

    fn list_customers(&self) -> Vec<Party>;
    fn search_customers(&self, query: &str, limit: usize) -> Vec<Party>;
    fn get_customer(&self, id: &str) -> Option<Party>;

    /// Searches the counterparty list for a document kind: suppliers for
    /// purchases, customers for sales.
    fn search_parties(&self, kind: DocumentKind, query: &str, limit: usize) -> Vec<Party> {
        match kind {
            DocumentKind::Purchase => self.search_suppliers(query, limit),
            DocumentKind::Sale => self.search_customers(query, limit),
        }
    }

    /// Looks up the counterparty for a document kind.
    fn get_party(&self, kind: DocumentKind, id: &str) -> Option<Party> {
        match kind {
            DocumentKind::Purchase => self.get_supplier(id),
            DocumentKind::Sale => self.get_customer(id),
        }
    }
}

// =============================================================================
// Search Helpers
// =============================================================================

/// Key a name is matched on: trimmed and Unicode lower-cased.
///
/// ```rust
/// use medibill_core::catalog::search_key;
///
/// assert_eq!(search_key("  ÉCOSPRIN 75 "), "écosprin 75");
/// ```
pub fn search_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Lower-cased, trimmed query when it has at least `min_chars` characters.
pub fn normalize_query(query: &str, min_chars: usize) -> Option<String> {
    let query = query.trim();
    if query.chars().count() < min_chars {
        return None;
    }
    Some(search_key(query))
}

/// Applies the medicine search rules to any slice of medicines.
///
/// ## Example
/// ```rust
/// use medibill_core::catalog::{filter_medicines, Medicine};
///
/// let all = vec![
///     Medicine::new("m1", "Paracetamol 500"),
///     Medicine::new("m2", "Pantoprazole 40"),
///     Medicine::new("m1", "Paracetamol 500"),
/// ];
///
/// assert_eq!(filter_medicines(&all, "PA", 10).len(), 2);
/// assert!(filter_medicines(&all, "p", 10).is_empty());
/// ```
pub fn filter_medicines(medicines: &[Medicine], query: &str, limit: usize) -> Vec<Medicine> {
    let Some(needle) = normalize_query(query, MIN_MEDICINE_QUERY_CHARS) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    medicines
        .iter()
        .filter(|m| search_key(&m.name).contains(&needle))
        .filter(|m| seen.insert(m.id.clone()))
        .take(limit)
        .cloned()
        .collect()
}

/// Applies the party search rules to any slice of parties.
pub fn filter_parties(parties: &[Party], query: &str, limit: usize) -> Vec<Party> {
    let Some(needle) = normalize_query(query, MIN_PARTY_QUERY_CHARS) else {
        return Vec::new();
    };

    parties
        .iter()
        .filter(|p| search_key(&p.name).contains(&needle))
        .take(limit)
        .cloned()
        .collect()
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

/// A catalog held entirely in memory.
///
/// ## Usage
/// ```rust
/// use medibill_core::catalog::{CatalogSource, InMemoryCatalog, Medicine, Party};
///
/// let catalog = InMemoryCatalog::new()
///     .with_medicines(vec![Medicine::new("m1", "Cetirizine 10").with_tax_rate(12.0)])
///     .with_suppliers(vec![Party::new("s1", "Shree Pharma Distributors")]);
///
/// assert_eq!(catalog.search_medicines("ceti", 5)[0].id, "m1");
/// assert_eq!(catalog.search_suppliers("shree", 5).len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    medicines: Vec<Medicine>,
    suppliers: Vec<Party>,
    customers: Vec<Party>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_medicines(mut self, medicines: impl IntoIterator<Item = Medicine>) -> Self {
        self.medicines.extend(medicines);
        self
    }

    pub fn with_suppliers(mut self, suppliers: impl IntoIterator<Item = Party>) -> Self {
        self.suppliers.extend(suppliers);
        self
    }

    pub fn with_customers(mut self, customers: impl IntoIterator<Item = Party>) -> Self {
        self.customers.extend(customers);
        self
    }

    pub fn medicine_count(&self) -> usize {
        self.medicines.len()
    }
}

impl CatalogSource for InMemoryCatalog {
    fn list_medicines(&self) -> Vec<Medicine> {
        let mut seen = HashSet::new();
        self.medicines
            .iter()
            .filter(|m| seen.insert(m.id.clone()))
            .cloned()
            .collect()
    }

    fn search_medicines(&self, query: &str, limit: usize) -> Vec<Medicine> {
        filter_medicines(&self.medicines, query, limit)
    }

    fn get_medicine(&self, id: &str) -> Option<Medicine> {
        self.medicines.iter().find(|m| m.id == id).cloned()
    }

    fn list_suppliers(&self) -> Vec<Party> {
        self.suppliers.clone()
    }

    fn search_suppliers(&self, query: &str, limit: usize) -> Vec<Party> {
        filter_parties(&self.suppliers, query, limit)
    }

    fn get_supplier(&self, id: &str) -> Option<Party> {
        self.suppliers.iter().find(|p| p.id == id).cloned()
    }

    fn list_customers(&self) -> Vec<Party> {
        self.customers.clone()
    }

    fn search_customers(&self, query: &str, limit: usize) -> Vec<Party> {
        filter_parties(&self.customers, query, limit)
    }

    fn get_customer(&self, id: &str) -> Option<Party> {
        self.customers.iter().find(|p| p.id == id).cloned()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_medicines(vec![
                Medicine::new("m1", "Paracetamol 500").with_tax_rate(12.0),
                Medicine::new("m2", "Pantoprazole 40"),
                Medicine::new("m3", "Amoxicillin 250"),
                Medicine::new("m1", "Paracetamol 500 (dup)"),
            ])
            .with_suppliers(vec![
                Party::new("s1", "Apex Pharma"),
                Party::new("s2", "Medline Traders"),
            ])
            .with_customers(vec![Party::new("c1", "Walk-in Customer")])
    }

    #[test]
    fn test_medicine_search_is_case_insensitive_substring() {
        let results = catalog().search_medicines("CILL", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "m3");
    }

    #[test]
    fn test_medicine_search_requires_two_chars() {
        let c = catalog();
        assert!(c.search_medicines("", 10).is_empty());
        assert!(c.search_medicines("p", 10).is_empty());
        assert!(c.search_medicines(" p ", 10).is_empty());
        assert_eq!(c.search_medicines("pa", 10).len(), 2);
    }

    #[test]
    fn test_medicine_search_dedupes_by_id() {
        let results = catalog().search_medicines("paracetamol", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Paracetamol 500");
    }

    #[test]
    fn test_medicine_search_respects_limit() {
        assert_eq!(catalog().search_medicines("ol", 10).len(), 2);
        assert_eq!(catalog().search_medicines("ol", 1).len(), 1);
    }

    #[test]
    fn test_party_search_needs_one_char() {
        let c = catalog();
        assert!(c.search_suppliers("", 10).is_empty());
        assert_eq!(c.search_suppliers("m", 10).len(), 2);
        assert_eq!(c.search_customers("walk", 10)[0].id, "c1");
    }

    #[test]
    fn test_search_parties_by_document_kind() {
        let c = catalog();
        assert_eq!(c.search_parties(DocumentKind::Purchase, "apex", 5)[0].id, "s1");
        assert!(c.search_parties(DocumentKind::Sale, "apex", 5).is_empty());
        assert!(c.get_party(DocumentKind::Sale, "c1").is_some());
        assert!(c.get_party(DocumentKind::Purchase, "c1").is_none());
    }

    #[test]
    fn test_list_medicines_dedupes() {
        assert_eq!(catalog().list_medicines().len(), 3);
        assert_eq!(catalog().medicine_count(), 4);
    }

    #[test]
    fn test_effective_tax_rate() {
        assert_eq!(Medicine::new("x", "X").effective_tax_rate(), 5.0);
        assert_eq!(Medicine::new("x", "X").with_tax_rate(0.0).effective_tax_rate(), 0.0);
        assert_eq!(Medicine::new("x", "X").with_tax_rate(18.0).effective_tax_rate(), 18.0);
    }

    #[test]
    fn test_batch_lookup_and_stock() {
        let mut b1 = Batch::new("b1", "m1", "LOT-1");
        b1.quantity = 30;
        let mut b2 = Batch::new("b2", "m1", "LOT-2");
        b2.quantity = 12;

        let med = Medicine::new("m1", "Paracetamol 500")
            .with_batch(b1)
            .with_batch(b2);

        assert_eq!(med.batch(" LOT-2 ").map(|b| b.id.as_str()), Some("b2"));
        assert!(med.batch("LOT-3").is_none());
        assert_eq!(med.stock_on_hand(), 42);
    }

    #[test]
    fn test_batch_expiry() {
        let mut batch = Batch::new("b1", "m1", "LOT-1");
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(!batch.is_expired(today));

        batch.expiry = NaiveDate::from_ymd_opt(2026, 5, 31);
        assert!(batch.is_expired(today));
    }
}
