//! # Purchase Repository
//!
//! Records purchase invoices and receives their stock.
//!
//! ## Recording a Purchase
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. supplier must exist                          (else NotFound)       │
//! │   2. INSERT purchases header                                            │
//! │   3. for each line                                                      │
//! │        medicine: by id (must exist) or find-or-create by name           │
//! │        batch:    find by (medicine, batch_no) or create with            │
//! │                  expiry, mrp, purchase_rate = net unit price            │
//! │        stock:    batch.quantity += line quantity                        │
//! │        INSERT purchase_items                                            │
//! │  COMMIT  (any failure rolls the whole invoice back)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock updates (`PurchaseType::StockUpdate`) add stock exactly like
//! purchases; the stored type lets reports leave them out of spend.

use chrono::{DateTime, NaiveDate, Utc};
use medibill_core::catalog::{Batch, Medicine};
use medibill_core::payload::{PayloadLine, PurchasePayload};
use medibill_core::{PaymentType, PurchaseType, TaxMode};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::medicine;
use super::party::{require_party, PartyRole};
use super::stock_units;
use crate::error::{DbError, DbResult};

/// Summary of a stored purchase invoice.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PurchaseRecord {
    pub id: String,
    pub invoice_number: String,
    pub supplier_id: String,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_type: PurchaseType,
    pub payment_type: PaymentType,
    pub tax_mode: TaxMode,
    pub use_actual_price: bool,
    pub subtotal: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// One stored purchase line.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PurchaseItemRecord {
    pub id: String,
    pub medicine_id: String,
    pub batch_id: String,
    pub batch_no: String,
    pub expiry: Option<NaiveDate>,
    pub mrp: Option<f64>,
    pub quantity: f64,
    pub unit_price: f64,
    pub net_unit_price: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub row_total: f64,
    pub actual_price: Option<f64>,
}

const RECORD_SELECT: &str = r#"
    SELECT
        p.id,
        p.invoice_number,
        p.supplier_id,
        p.purchase_date,
        p.purchase_type,
        p.payment_type,
        p.tax_mode,
        p.use_actual_price,
        p.subtotal,
        p.tax_total,
        p.grand_total,
        (SELECT COUNT(*) FROM purchase_items i WHERE i.purchase_id = p.id) AS item_count,
        p.created_at
    FROM purchases p
"#;

/// Repository for purchase invoices.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Stores a purchase and adds its quantities to batch stock, atomically.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown supplier or medicine id
    /// - Any SQL failure; nothing is written in that case
    pub async fn record(&self, payload: &PurchasePayload) -> DbResult<PurchaseRecord> {
        let supplier_id = payload.party_id.as_deref().unwrap_or_default();
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        require_party(&mut tx, PartyRole::Supplier, supplier_id).await?;

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, invoice_number, supplier_id, purchase_date, purchase_type,
                payment_type, tax_mode, use_actual_price,
                subtotal, tax_total, grand_total, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&id)
        .bind(payload.invoice_number.trim())
        .bind(supplier_id)
        .bind(payload.date)
        .bind(payload.purchase_type)
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
            receive_line(&mut tx, &id, line).await?;
        }

        tx.commit().await?;

        info!(
            purchase_id = %id,
            invoice = %payload.invoice_number,
            lines = payload.lines.len(),
            grand_total = payload.grand_total,
            "Purchase recorded"
        );

        Ok(PurchaseRecord {
            id,
            invoice_number: payload.invoice_number.trim().to_string(),
            supplier_id: supplier_id.to_string(),
            purchase_date: payload.date,
            purchase_type: payload.purchase_type,
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

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseRecord>> {
        let sql = format!("{RECORD_SELECT} WHERE p.id = ?1");
        let record = sqlx::query_as::<_, PurchaseRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Most recent purchases first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<PurchaseRecord>> {
        let sql = format!("{RECORD_SELECT} ORDER BY p.created_at DESC LIMIT ?1");
        let records = sqlx::query_as::<_, PurchaseRecord>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    pub async fn items(&self, purchase_id: &str) -> DbResult<Vec<PurchaseItemRecord>> {
        let items = sqlx::query_as::<_, PurchaseItemRecord>(
            r#"
            SELECT id, medicine_id, batch_id, batch_no, expiry, mrp, quantity,
                   unit_price, net_unit_price, tax_rate, tax_amount, row_total, actual_price
            FROM purchase_items
            WHERE purchase_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}

async fn resolve_medicine(conn: &mut SqliteConnection, line: &PayloadLine) -> DbResult<Medicine> {
    match line.medicine_id.as_deref() {
        Some(id) => medicine::fetch_medicine(conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", id)),
        None if line.medicine_name.trim().is_empty() => {
            Err(DbError::not_found("Medicine", "(unnamed)"))
        }
        None => medicine::find_or_create_by_name(conn, &line.medicine_name).await,
    }
}

async fn receive_line(
    conn: &mut SqliteConnection,
    purchase_id: &str,
    line: &PayloadLine,
) -> DbResult<()> {
    let medicine = resolve_medicine(conn, line).await?;

    let batch = match medicine::find_batch(conn, &medicine.id, &line.batch).await? {
        Some(batch) => batch,
        None => {
            let batch = Batch {
                expiry: line.expiry,
                mrp: line.mrp,
                purchase_rate: Some(line.net_unit_price),
                ..Batch::new(Uuid::new_v4().to_string(), &medicine.id, line.batch.trim())
            };
            medicine::insert_batch(conn, &batch).await?;
            batch
        }
    };

    let on_hand = medicine::adjust_stock(conn, &batch.id, stock_units(line.quantity)).await?;
    debug!(medicine = %medicine.name, batch_no = %batch.batch_no, on_hand, "Stock received");

    sqlx::query(
        r#"
        INSERT INTO purchase_items (
            id, purchase_id, medicine_id, batch_id, batch_no, expiry, mrp, quantity,
            unit_price, net_unit_price, tax_rate, tax_amount, row_total, actual_price
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(purchase_id)
    .bind(&medicine.id)
    .bind(&batch.id)
    .bind(&batch.batch_no)
    .bind(line.expiry)
    .bind(line.mrp)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.net_unit_price)
    .bind(line.tax_rate)
    .bind(line.tax_amount)
    .bind(line.row_total)
    .bind(line.actual_price)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
