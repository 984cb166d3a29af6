//! # Stock Commands
//!
//! The medicines page and the dashboard. Both read the database directly;
//! the autocomplete snapshot is not involved.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Medicines 42     Low stock 3     Expiring soon 5     Sales ₹12,400.00  │
//! │                                                                         │
//! │  LOW STOCK                         RECENT ACTIVITY                      │
//! │  Paracetamol 500   8   critical    Sale     B-201   Ravi Kumar  ₹40.00  │
//! │  Azithral 500     22   warning     Purchase INV-9  Apex Pharma ₹1750.00 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Local, NaiveDate};
use medibill_core::stock::{ActivityEntry, DashboardSummary, LowStockItem, MedicineSummary};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppConfig, DbState};

/// Dashboard figures plus the lists shown under them.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub summary: DashboardSummary,
    pub total_sales_display: String,
    pub total_purchases_display: String,
    pub low_stock: Vec<LowStockItem>,
    pub recent: Vec<ActivityView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    #[serde(flatten)]
    pub entry: ActivityEntry,
    pub grand_total_display: String,
}

/// Every medicine with its stock totals, ordered by name.
pub async fn medicine_summary(db: &DbState) -> Result<Vec<MedicineSummary>, ApiError> {
    let summaries = db.inner().reports().medicine_summary().await?;
    debug!(medicines = summaries.len(), "medicine_summary command");
    Ok(summaries)
}

/// Medicines at or below the configured low-stock limit, emptiest first.
pub async fn low_stock_alerts(
    db: &DbState,
    config: &AppConfig,
) -> Result<Vec<LowStockItem>, ApiError> {
    let alerts = db.inner().reports().low_stock(&config.stock_thresholds).await?;
    debug!(alerts = alerts.len(), "low_stock_alerts command");
    Ok(alerts)
}

/// Dashboard as of today's local date.
pub async fn dashboard(db: &DbState, config: &AppConfig) -> Result<DashboardView, ApiError> {
    dashboard_on(db, config, Local::now().date_naive()).await
}

/// Dashboard as of `today`; expiry counts are relative to it.
pub async fn dashboard_on(
    db: &DbState,
    config: &AppConfig,
    today: NaiveDate,
) -> Result<DashboardView, ApiError> {
    let reports = db.inner().reports();
    let thresholds = &config.stock_thresholds;

    let summary = reports
        .dashboard(today, thresholds, config.expiry_warning_days)
        .await?;
    let low_stock = reports.low_stock(thresholds).await?;
    let recent = reports
        .recent_activity(config.recent_activity_limit)
        .await?
        .into_iter()
        .map(|entry| ActivityView {
            grand_total_display: config.format_currency(entry.grand_total),
            entry,
        })
        .collect();

    debug!(%today, low_stock = low_stock.len(), "dashboard command");

    Ok(DashboardView {
        total_sales_display: config.format_currency(summary.total_sales),
        total_purchases_display: config.format_currency(summary.total_purchases),
        summary,
        low_stock,
        recent,
    })
}
