//! # Stock Module
//!
//! Stock position per medicine and the alert levels the dashboard shows.
//!
//! ## Alert Levels
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  units on hand        level        listed as low stock                  │
//! │  ─────────────        ─────        ───────────────────                  │
//! │  ..= critical (15)    Critical     yes                                  │
//! │  ..= warning  (25)    Warning      yes                                  │
//! │  ..= low      (30)    Ok           yes                                  │
//! │  above low            Ok           no                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Medicine;
use crate::types::DocumentKind;

// =============================================================================
// Stock Levels
// =============================================================================

/// How urgently a medicine needs reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Critical,
    Warning,
    Ok,
}

/// Unit counts that separate the stock levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct StockThresholds {
    /// At or below: critical.
    pub critical: i64,
    /// At or below: warning.
    pub warning: i64,
    /// At or below: shown in the low-stock list.
    pub low: i64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        StockThresholds {
            critical: 15,
            warning: 25,
            low: 30,
        }
    }
}

impl StockThresholds {
    /// Orders the limits so `critical <= warning <= low`, none below zero.
    pub fn normalized(self) -> Self {
        let critical = self.critical.max(0);
        let warning = self.warning.max(critical);
        let low = self.low.max(warning);
        StockThresholds {
            critical,
            warning,
            low,
        }
    }

    pub fn level(&self, units: i64) -> StockLevel {
        if units <= self.critical {
            StockLevel::Critical
        } else if units <= self.warning {
            StockLevel::Warning
        } else {
            StockLevel::Ok
        }
    }

    pub fn is_low(&self, units: i64) -> bool {
        units <= self.low
    }
}

// =============================================================================
// Medicine Summary
// =============================================================================

/// One row of the medicines page: totals over all of a medicine's batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MedicineSummary {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,

    /// Units on hand across batches; 0 when there are none.
    pub total_quantity: i64,

    #[ts(as = "Option<String>")]
    pub earliest_expiry: Option<NaiveDate>,

    pub max_purchase_rate: Option<f64>,
    pub max_mrp: Option<f64>,
}

impl MedicineSummary {
    /// Summarizes a medicine with its batches loaded.
    pub fn from_medicine(medicine: &Medicine) -> Self {
        let batches = &medicine.batches;
        MedicineSummary {
            id: medicine.id.clone(),
            name: medicine.name.clone(),
            brand: medicine.brand.clone(),
            total_quantity: medicine.stock_on_hand(),
            earliest_expiry: batches.iter().filter_map(|b| b.expiry).min(),
            max_purchase_rate: batches.iter().filter_map(|b| b.purchase_rate).reduce(f64::max),
            max_mrp: batches.iter().filter_map(|b| b.mrp).reduce(f64::max),
        }
    }
}

/// A medicine at or below the low-stock limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockItem {
    pub medicine_id: String,
    pub name: String,
    pub stock: i64,
    pub level: StockLevel,
}

/// Low-stock alerts, emptiest first (ties by name).
///
/// ## Example
/// ```rust
/// use medibill_core::stock::{low_stock, MedicineSummary, StockLevel, StockThresholds};
///
/// let row = |id: &str, qty| MedicineSummary {
///     id: id.to_string(),
///     name: id.to_string(),
///     brand: None,
///     total_quantity: qty,
///     earliest_expiry: None,
///     max_purchase_rate: None,
///     max_mrp: None,
/// };
///
/// let rows = [row("a", 22), row("b", 8), row("c", 90)];
/// let alerts = low_stock(&rows, &StockThresholds::default());
/// assert_eq!(alerts.len(), 2);
/// assert_eq!(alerts[0].level, StockLevel::Critical);
/// ```
pub fn low_stock(
    summaries: &[MedicineSummary],
    thresholds: &StockThresholds,
) -> Vec<LowStockItem> {
    let mut items: Vec<LowStockItem> = summaries
        .iter()
        .filter(|s| thresholds.is_low(s.total_quantity))
        .map(|s| LowStockItem {
            medicine_id: s.id.clone(),
            name: s.name.clone(),
            stock: s.total_quantity,
            level: thresholds.level(s.total_quantity),
        })
        .collect();

    items.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
    items
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub medicine_count: i64,
    pub low_stock_count: usize,

    /// Batches with stock whose expiry falls within the warning window.
    pub expiring_soon: i64,

    pub total_sales: f64,

    /// Spend on regular purchases; stock updates are left out.
    pub total_purchases: f64,
}

/// One entry of the recent purchases/sales feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ActivityEntry {
    pub kind: DocumentKind,
    pub id: String,
    pub invoice_number: String,
    pub party_name: Option<String>,
    pub grand_total: f64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Batch;

    #[test]
    fn test_levels_follow_thresholds() {
        let t = StockThresholds::default();
        assert_eq!(t.level(0), StockLevel::Critical);
        assert_eq!(t.level(12), StockLevel::Critical);
        assert_eq!(t.level(22), StockLevel::Warning);
        assert_eq!(t.level(30), StockLevel::Ok);
        assert!(t.is_low(30));
        assert!(!t.is_low(31));
        assert!(t.is_low(-4));
    }

    #[test]
    fn test_normalized_orders_limits() {
        let t = StockThresholds {
            critical: 40,
            warning: 10,
            low: -1,
        }
        .normalized();
        assert_eq!(t.critical, 40);
        assert_eq!(t.warning, 40);
        assert_eq!(t.low, 40);
    }

    #[test]
    fn test_summary_from_medicine() {
        let mut early = Batch::new("b1", "m1", "A");
        early.quantity = 10;
        early.expiry = NaiveDate::from_ymd_opt(2027, 1, 31);
        early.mrp = Some(40.0);
        early.purchase_rate = Some(28.0);

        let mut late = Batch::new("b2", "m1", "B");
        late.quantity = 5;
        late.expiry = NaiveDate::from_ymd_opt(2028, 3, 31);
        late.mrp = Some(45.0);

        let medicine = Medicine::new("m1", "Shelcal 500")
            .with_batch(late)
            .with_batch(early);
        let summary = MedicineSummary::from_medicine(&medicine);

        assert_eq!(summary.total_quantity, 15);
        assert_eq!(summary.earliest_expiry, NaiveDate::from_ymd_opt(2027, 1, 31));
        assert_eq!(summary.max_purchase_rate, Some(28.0));
        assert_eq!(summary.max_mrp, Some(45.0));
    }

    #[test]
    fn test_summary_without_batches() {
        let summary = MedicineSummary::from_medicine(&Medicine::new("m1", "Dolo 650"));
        assert_eq!(summary.total_quantity, 0);
        assert_eq!(summary.earliest_expiry, None);
        assert_eq!(summary.max_mrp, None);
    }

    #[test]
    fn test_low_stock_sorted_emptiest_first() {
        let summaries: Vec<MedicineSummary> = [("Paracetamol", 8), ("Aspirin", 30), ("Zinc", 8)]
            .iter()
            .map(|(name, qty)| {
                let mut s = MedicineSummary::from_medicine(&Medicine::new(*name, *name));
                s.total_quantity = *qty;
                s
            })
            .collect();

        let alerts = low_stock(&summaries, &StockThresholds::default());
        let names: Vec<&str> = alerts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Paracetamol", "Zinc", "Aspirin"]);
        assert_eq!(alerts[2].level, StockLevel::Ok);
    }
}
