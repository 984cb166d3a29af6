//! # Report Repository
//!
//! Read-only figures for the medicines page and the dashboard.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  medicines ──LEFT JOIN── batches                                        │
//! │       │  GROUP BY medicine                                              │
//! │       ▼                                                                 │
//! │  MedicineSummary (SUM quantity, MIN expiry, MAX rate, MAX mrp)          │
//! │       │                                                                 │
//! │       ▼  StockThresholds                                                │
//! │  LowStockItem list ──► DashboardSummary.low_stock_count                 │
//! │                                                                         │
//! │  purchases ∪ sales ──► recent activity feed, newest first               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Days, NaiveDate};
use medibill_core::stock::{
    low_stock, ActivityEntry, DashboardSummary, LowStockItem, MedicineSummary, StockThresholds,
};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for stock summaries and dashboard figures.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// One row per medicine, batches folded in. Medicines with no batches
    /// report zero units and no expiry or prices.
    pub async fn medicine_summary(&self) -> DbResult<Vec<MedicineSummary>> {
        let summaries = sqlx::query_as::<_, MedicineSummary>(
            r#"
            SELECT
                m.id,
                m.name,
                m.brand,
                COALESCE(SUM(b.quantity), 0) AS total_quantity,
                MIN(b.expiry) AS earliest_expiry,
                MAX(b.purchase_rate) AS max_purchase_rate,
                MAX(b.mrp) AS max_mrp
            FROM medicines m
            LEFT JOIN batches b ON b.medicine_id = m.id
            GROUP BY m.id, m.name, m.brand
            ORDER BY m.name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(summaries)
    }

    pub async fn low_stock(&self, thresholds: &StockThresholds) -> DbResult<Vec<LowStockItem>> {
        let summaries = self.medicine_summary().await?;
        Ok(low_stock(&summaries, thresholds))
    }

    /// Batches with units left whose expiry falls in `today ..= today + days`.
    pub async fn expiring_soon(&self, today: NaiveDate, days: u32) -> DbResult<i64> {
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM batches
            WHERE quantity > 0 AND expiry IS NOT NULL AND expiry >= ?1 AND expiry <= ?2
            "#,
        )
        .bind(today)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Latest purchases and sales together, newest first.
    pub async fn recent_activity(&self, limit: u32) -> DbResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT 'purchase' AS kind, p.id, p.invoice_number, pt.name AS party_name,
                   p.grand_total, p.created_at
            FROM purchases p
            LEFT JOIN parties pt ON pt.id = p.supplier_id
            UNION ALL
            SELECT 'sale' AS kind, s.id, s.invoice_number, pt.name AS party_name,
                   s.grand_total, s.created_at
            FROM sales s
            LEFT JOIN parties pt ON pt.id = s.customer_id
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn dashboard(
        &self,
        today: NaiveDate,
        thresholds: &StockThresholds,
        expiry_days: u32,
    ) -> DbResult<DashboardSummary> {
        let summaries = self.medicine_summary().await?;
        let low_stock_count = low_stock(&summaries, thresholds).len();
        let expiring_soon = self.expiring_soon(today, expiry_days).await?;

        let total_sales: f64 =
            sqlx::query_scalar("SELECT CAST(COALESCE(SUM(grand_total), 0) AS REAL) FROM sales")
                .fetch_one(&self.pool)
                .await?;

        let total_purchases: f64 = sqlx::query_scalar(
            r#"
            SELECT CAST(COALESCE(SUM(grand_total), 0) AS REAL)
            FROM purchases
            WHERE purchase_type = 'purchase'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        debug!(
            medicines = summaries.len(),
            low_stock_count, expiring_soon, "Dashboard figures loaded"
        );

        Ok(DashboardSummary {
            medicine_count: summaries.len() as i64,
            low_stock_count,
            expiring_soon,
            total_sales,
            total_purchases,
        })
    }
}
