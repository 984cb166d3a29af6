//! # Sale Repository
//!
//! Records sale invoices and takes sold units out of batch stock.
//!
//! Lines typed without a catalog pick (no medicine id) are stored by name
//! only and move no stock. Stock is allowed to go negative: the counter
//! sale happens first, the purchase entry may come later.

use chrono::{DateTime, NaiveDate, Utc};
use medibill_core::payload::{PayloadLine, SalePayload};
use medibill_core::{PaymentType, TaxMode};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::medicine;
use super::party::{require_party, PartyRole};
use super::stock_units;
use crate::error::{DbError, DbResult};

/// Summary of a stored sale invoice.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SaleRecord {
    pub id: String,
    pub invoice_number: String,
    pub customer_id: Option<String>,
    pub sale_date: Option<NaiveDate>,
    pub payment_type: PaymentType,
    pub tax_mode: TaxMode,
    pub use_actual_price: bool,
    pub subtotal: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

const RECORD_SELECT: &str = r#"
    SELECT
        s.id,
        s.invoice_number,
        s.customer_id,
        s.sale_date,
        s.payment_type,
        s.tax_mode,
        s.use_actual_price,
        s.subtotal,
        s.tax_total,
        s.grand_total,
        (SELECT COUNT(*) FROM sale_items i WHERE i.sale_id = s.id) AS item_count,
        s.created_at
    FROM sales s
"#;

/// Repository for sale invoices.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Stores a sale and decrements stock for lines with a known batch.
    ///
    /// ## Errors
    /// - `NotFound` when a customer id or medicine id is given but unknown
    pub async fn record(&self, payload: &SalePayload) -> DbResult<SaleRecord> {
        let customer_id = payload
            .party_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        if let Some(customer_id) = customer_id {
            require_party(&mut tx, PartyRole::Customer, customer_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, invoice_number, customer_id, sale_date, payment_type, tax_mode,
                use_actual_price, subtotal, tax_total, grand_total, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&id)
        .bind(payload.invoice_number.trim())
        .bind(customer_id)
        .bind(payload.date)
        .bind(payload.payment_type)
        .bind(payload.tax_mode)
        .bind(payload.use_actual_price)
        .bind(payload.subtotal)
        .bind(payload.tax_total)
        .bind(payload.grand_total)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for line in &payload.lines {
            issue_line(&mut tx, &id, line).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %id,
            invoice = %payload.invoice_number,
            lines = payload.lines.len(),
            grand_total = payload.grand_total,
            "Sale recorded"
        );

        Ok(SaleRecord {
            id,
            invoice_number: payload.invoice_number.trim().to_string(),
            customer_id: customer_id.map(str::to_string),
            sale_date: payload.date,
            payment_type: payload.payment_type,
            tax_mode: payload.tax_mode,
            use_actual_price: payload.use_actual_price,
            subtotal: payload.subtotal,
            tax_total: payload.tax_total,
            grand_total: payload.grand_total,
            item_count: payload.lines.len() as i64,
            created_at,
        })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let sql = format!("{RECORD_SELECT} WHERE s.id = ?1");
        let record = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<SaleRecord>> {
        let sql = format!("{RECORD_SELECT} ORDER BY s.created_at DESC LIMIT ?1");
        let records = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}

async fn issue_line(
    conn: &mut SqliteConnection,
    sale_id: &str,
    line: &PayloadLine,
) -> DbResult<()> {
    let mut batch_id = None;

    if let Some(medicine_id) = line.medicine_id.as_deref() {
        if medicine::fetch_medicine(conn, medicine_id).await?.is_none() {
            return Err(DbError::not_found("Medicine", medicine_id));
        }

        if !line.batch.trim().is_empty() {
            if let Some(batch) = medicine::find_batch(conn, medicine_id, &line.batch).await? {
                let units = stock_units(line.quantity);
                let left = medicine::adjust_stock(conn, &batch.id, -units).await?;
                debug!(batch_no = %batch.batch_no, left, "Stock issued");
                batch_id = Some(batch.id);
            }
        }
    }

    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, medicine_id, medicine_name, batch_id, batch_no, quantity,
            unit_price, net_unit_price, tax_rate, discount_percent, tax_amount,
            row_total, actual_price
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(sale_id)
    .bind(&line.medicine_id)
    .bind(line.medicine_name.trim())
    .bind(batch_id)
    .bind(line.batch.trim())
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.net_unit_price)
    .bind(line.tax_rate)
    .bind(line.discount_percent.unwrap_or(0.0))
    .bind(line.tax_amount)
    .bind(line.row_total)
    .bind(line.actual_price)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
