//! # Medicine Repository
//!
//! Medicines, their stock batches, and stock movements.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  User types: "PARA"                                                     │
//! │       │                                                                 │
//! │       ▼  normalize_query (≥ 2 chars, lower-cased)                       │
//! │  search_name LIKE '%para%' ESCAPE '\'                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Paracetamol 500   ← match                                              │
//! │  Paracetamol 650   ← match                                              │
//! │  Pantoprazole 40                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use medibill_core::catalog::{normalize_query, search_key, Batch, Medicine};
use medibill_core::MIN_MEDICINE_QUERY_CHARS;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::like_pattern;
use crate::error::{DbError, DbResult};

const MEDICINE_COLUMNS: &str = "id, name, sku, brand, tax_rate";
const BATCH_COLUMNS: &str = "id, medicine_id, batch_no, expiry, mrp, purchase_rate, quantity";

/// Repository for medicine and batch operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.medicines();
/// let found = repo.search("para", 10).await?;
/// let with_batches = repo.get_by_id(&found[0].id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// All medicines ordered by name, without batches.
    pub async fn list(&self) -> DbResult<Vec<Medicine>> {
        let sql =
            format!("SELECT {MEDICINE_COLUMNS} FROM medicines ORDER BY name COLLATE NOCASE");
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(medicines)
    }

    /// Case-insensitive substring search on the name.
    ///
    /// Queries shorter than two characters return nothing, matching the
    /// in-memory catalog.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Medicine>> {
        let Some(needle) = normalize_query(query, MIN_MEDICINE_QUERY_CHARS) else {
            return Ok(Vec::new());
        };

        debug!(query = %needle, limit, "Searching medicines");

        let sql = format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines \
             WHERE search_name LIKE ?1 ESCAPE '\\' \
             ORDER BY name COLLATE NOCASE \
             LIMIT ?2"
        );
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .bind(like_pattern(&needle))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = medicines.len(), "Search returned medicines");
        Ok(medicines)
    }

    /// Gets a medicine with its batches.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Medicine>> {
        let mut conn = self.pool.acquire().await?;
        let Some(mut medicine) = fetch_medicine(&mut conn, id).await? else {
            return Ok(None);
        };
        medicine.batches = fetch_batches(&mut conn, id).await?;
        Ok(Some(medicine))
    }

    pub async fn insert(&self, medicine: &Medicine) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_medicine(&mut conn, medicine).await
    }

    /// Returns the medicine with this name (case-insensitive, trimmed), or
    /// creates a bare one.
    pub async fn find_or_create_by_name(&self, name: &str) -> DbResult<Medicine> {
        let mut conn = self.pool.acquire().await?;
        find_or_create_by_name(&mut conn, name).await
    }

    pub async fn batches_for(&self, medicine_id: &str) -> DbResult<Vec<Batch>> {
        let mut conn = self.pool.acquire().await?;
        fetch_batches(&mut conn, medicine_id).await
    }

    pub async fn find_batch(&self, medicine_id: &str, batch_no: &str) -> DbResult<Option<Batch>> {
        let mut conn = self.pool.acquire().await?;
        find_batch(&mut conn, medicine_id, batch_no).await
    }

    pub async fn insert_batch(&self, batch: &Batch) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_batch(&mut conn, batch).await
    }

    /// Adds `delta` units (negative to remove) and returns the new quantity.
    pub async fn adjust_batch_stock(&self, batch_id: &str, delta: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        adjust_stock(&mut conn, batch_id, delta).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (shared with the invoice transactions)
// =============================================================================

pub(crate) async fn fetch_medicine(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Medicine>> {
    let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1");
    let medicine = sqlx::query_as::<_, Medicine>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(medicine)
}

pub(crate) async fn fetch_batches(
    conn: &mut SqliteConnection,
    medicine_id: &str,
) -> DbResult<Vec<Batch>> {
    let sql = format!(
        "SELECT {BATCH_COLUMNS} FROM batches WHERE medicine_id = ?1 \
         ORDER BY expiry IS NULL, expiry, batch_no"
    );
    let batches = sqlx::query_as::<_, Batch>(&sql)
        .bind(medicine_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(batches)
}

pub(crate) async fn insert_medicine(
    conn: &mut SqliteConnection,
    medicine: &Medicine,
) -> DbResult<()> {
    debug!(id = %medicine.id, name = %medicine.name, "Inserting medicine");

    sqlx::query(
        r#"
        INSERT INTO medicines (id, name, search_name, sku, brand, tax_rate)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&medicine.id)
    .bind(medicine.name.trim())
    .bind(search_key(&medicine.name))
    .bind(&medicine.sku)
    .bind(&medicine.brand)
    .bind(medicine.tax_rate)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn find_or_create_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Medicine> {
    let name = name.trim();
    let sql = format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines \
         WHERE search_name = ?1 \
         ORDER BY created_at LIMIT 1"
    );
    let existing = sqlx::query_as::<_, Medicine>(&sql)
        .bind(search_key(name))
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(medicine) = existing {
        return Ok(medicine);
    }

    let medicine = Medicine::new(Uuid::new_v4().to_string(), name);
    insert_medicine(conn, &medicine).await?;
    Ok(medicine)
}

pub(crate) async fn find_batch(
    conn: &mut SqliteConnection,
    medicine_id: &str,
    batch_no: &str,
) -> DbResult<Option<Batch>> {
    let sql = format!(
        "SELECT {BATCH_COLUMNS} FROM batches WHERE medicine_id = ?1 AND batch_no = ?2"
    );
    let batch = sqlx::query_as::<_, Batch>(&sql)
        .bind(medicine_id)
        .bind(batch_no.trim())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(batch)
}

pub(crate) async fn insert_batch(conn: &mut SqliteConnection, batch: &Batch) -> DbResult<()> {
    debug!(id = %batch.id, batch_no = %batch.batch_no, "Inserting batch");

    sqlx::query(
        r#"
        INSERT INTO batches (id, medicine_id, batch_no, expiry, mrp, purchase_rate, quantity)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&batch.id)
    .bind(&batch.medicine_id)
    .bind(batch.batch_no.trim())
    .bind(batch.expiry)
    .bind(batch.mrp)
    .bind(batch.purchase_rate)
    .bind(batch.quantity)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn adjust_stock(
    conn: &mut SqliteConnection,
    batch_id: &str,
    delta: i64,
) -> DbResult<i64> {
    let quantity: Option<i64> = sqlx::query_scalar(
        "UPDATE batches SET quantity = quantity + ?1 WHERE id = ?2 RETURNING quantity",
    )
    .bind(delta)
    .bind(batch_id)
    .fetch_optional(&mut *conn)
    .await?;

    let quantity = quantity.ok_or_else(|| DbError::not_found("Batch", batch_id))?;
    debug!(batch_id, delta, quantity, "Batch stock adjusted");
    Ok(quantity)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::NaiveDate;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_search() {
        let db = db().await;
        let repo = db.medicines();
        repo.insert(&Medicine::new("m1", "Paracetamol 500")).await.unwrap();
        repo.insert(&Medicine::new("m2", "Paracetamol 650")).await.unwrap();
        repo.insert(&Medicine::new("m3", "Pantoprazole 40")).await.unwrap();

        assert_eq!(repo.search("PARACET", 10).await.unwrap().len(), 2);
        assert_eq!(repo.search("paracet", 1).await.unwrap().len(), 1);
        assert!(repo.search("p", 10).await.unwrap().is_empty());
        assert!(repo.search("100%", 10).await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_get_by_id_includes_batches() {
        let db = db().await;
        let repo = db.medicines();
        repo.insert(&Medicine::new("m1", "Azithral 500").with_tax_rate(12.0))
            .await
            .unwrap();

        let mut batch = Batch::new("b1", "m1", "AZ-01");
        batch.expiry = NaiveDate::from_ymd_opt(2027, 1, 31);
        batch.mrp = Some(118.5);
        repo.insert_batch(&batch).await.unwrap();

        let med = repo.get_by_id("m1").await.unwrap().unwrap();
        assert_eq!(med.tax_rate, Some(12.0));
        assert_eq!(med.batches, vec![batch]);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_or_create_by_name_is_case_insensitive() {
        let db = db().await;
        let repo = db.medicines();

        let created = repo.find_or_create_by_name("  Shelcal 500 ").await.unwrap();
        let found = repo.find_or_create_by_name("shelcal 500").await.unwrap();

        assert_eq!(created.id, found.id);
        assert_eq!(found.name, "Shelcal 500");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let db = db().await;
        let repo = db.medicines();
        repo.insert(&Medicine::new("m1", "ÉCOSPRIN 75")).await.unwrap();

        let found = repo.search("écos", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ÉCOSPRIN 75");

        let same = repo.find_or_create_by_name("écosprin 75").await.unwrap();
        assert_eq!(same.id, "m1");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_batch_is_rejected() {
        let db = db().await;
        let repo = db.medicines();
        repo.insert(&Medicine::new("m1", "Dolo 650")).await.unwrap();
        repo.insert_batch(&Batch::new("b1", "m1", "D-1")).await.unwrap();

        let err = repo.insert_batch(&Batch::new("b2", "m1", "D-1")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_adjust_batch_stock() {
        let db = db().await;
        let repo = db.medicines();
        repo.insert(&Medicine::new("m1", "Dolo 650")).await.unwrap();
        repo.insert_batch(&Batch::new("b1", "m1", "D-1")).await.unwrap();

        assert_eq!(repo.adjust_batch_stock("b1", 15).await.unwrap(), 15);
        assert_eq!(repo.adjust_batch_stock("b1", -4).await.unwrap(), 11);

        let err = repo.adjust_batch_stock("nope", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_find_batch() {
        let db = db().await;
        let repo = db.medicines();
        repo.insert(&Medicine::new("m1", "Dolo 650")).await.unwrap();
        repo.insert_batch(&Batch::new("b1", "m1", "D-1")).await.unwrap();

        assert!(repo.find_batch("m1", " D-1 ").await.unwrap().is_some());
        assert!(repo.find_batch("m1", "D-2").await.unwrap().is_none());
        assert_eq!(repo.batches_for("m1").await.unwrap().len(), 1);
    }
}
