//! # Party Repository
//!
//! Suppliers and customers share one `parties` table, split by `role`.
//!
//! ## Saving
//! ```text
//!   upsert(role, party)
//!       │
//!       ├── id blank ──────► INSERT with a fresh id
//!       └── id given ──────► UPDATE; no such row → NotFound
//!
//!   delete(role, id)
//!       └── still named on an invoice → ForeignKeyViolation
//! ```

use medibill_core::catalog::{normalize_query, search_key, Party};
use medibill_core::{DocumentKind, MIN_PARTY_QUERY_CHARS};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::like_pattern;
use crate::error::{DbError, DbResult};

const PARTY_COLUMNS: &str = "id, name, phone, email, address, gstin";

/// Which side of an invoice a party sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Supplier,
    Customer,
}

impl PartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyRole::Supplier => "supplier",
            PartyRole::Customer => "customer",
        }
    }

    /// Counterparty role for a document kind.
    pub fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Purchase => PartyRole::Supplier,
            DocumentKind::Sale => PartyRole::Customer,
        }
    }

    fn entity(&self) -> &'static str {
        match self {
            PartyRole::Supplier => "Supplier",
            PartyRole::Customer => "Customer",
        }
    }
}

/// Repository for supplier and customer operations.
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: SqlitePool,
}

impl PartyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository { pool }
    }

    pub async fn list(&self, role: PartyRole) -> DbResult<Vec<Party>> {
        let sql = format!(
            "SELECT {PARTY_COLUMNS} FROM parties WHERE role = ?1 ORDER BY name COLLATE NOCASE"
        );
        let parties = sqlx::query_as::<_, Party>(&sql)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(parties)
    }

    /// Case-insensitive substring search; blank queries return nothing.
    pub async fn search(&self, role: PartyRole, query: &str, limit: u32) -> DbResult<Vec<Party>> {
        let Some(needle) = normalize_query(query, MIN_PARTY_QUERY_CHARS) else {
            return Ok(Vec::new());
        };

        debug!(role = role.as_str(), query = %needle, limit, "Searching parties");

        let sql = format!(
            "SELECT {PARTY_COLUMNS} FROM parties \
             WHERE role = ?1 AND search_name LIKE ?2 ESCAPE '\\' \
             ORDER BY name COLLATE NOCASE \
             LIMIT ?3"
        );
        let parties = sqlx::query_as::<_, Party>(&sql)
            .bind(role)
            .bind(like_pattern(&needle))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(parties)
    }

    pub async fn get_by_id(&self, role: PartyRole, id: &str) -> DbResult<Option<Party>> {
        let mut conn = self.pool.acquire().await?;
        fetch_party(&mut conn, role, id).await
    }

    pub async fn insert(&self, role: PartyRole, party: &Party) -> DbResult<()> {
        debug!(role = role.as_str(), id = %party.id, "Inserting party");

        sqlx::query(
            r#"
            INSERT INTO parties (id, role, name, search_name, phone, email, address, gstin)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&party.id)
        .bind(role)
        .bind(party.name.trim())
        .bind(search_key(&party.name))
        .bind(&party.phone)
        .bind(&party.email)
        .bind(&party.address)
        .bind(&party.gstin)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Creates the party when its id is blank, otherwise updates the
    /// existing row. Returns the party as stored.
    pub async fn upsert(&self, role: PartyRole, party: &Party) -> DbResult<Party> {
        let mut saved = party.clone();
        saved.name = party.name.trim().to_string();

        if saved.id.trim().is_empty() {
            saved.id = Uuid::new_v4().to_string();
            self.insert(role, &saved).await?;
            info!(role = role.as_str(), id = %saved.id, "Party created");
            return Ok(saved);
        }

        debug!(role = role.as_str(), id = %saved.id, "Updating party");

        let result = sqlx::query(
            r#"
            UPDATE parties
            SET name = ?3, search_name = ?4, phone = ?5, email = ?6, address = ?7, gstin = ?8
            WHERE role = ?1 AND id = ?2
            "#,
        )
        .bind(role)
        .bind(&saved.id)
        .bind(&saved.name)
        .bind(search_key(&saved.name))
        .bind(&saved.phone)
        .bind(&saved.email)
        .bind(&saved.address)
        .bind(&saved.gstin)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(role.entity(), &saved.id));
        }

        info!(role = role.as_str(), id = %saved.id, "Party updated");
        Ok(saved)
    }

    /// Deletes a party. Parties named on a recorded invoice are kept and the
    /// call fails with `ForeignKeyViolation`.
    pub async fn delete(&self, role: PartyRole, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM parties WHERE role = ?1 AND id = ?2")
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(role.entity(), id));
        }

        info!(role = role.as_str(), id, "Party deleted");
        Ok(())
    }

    pub async fn count(&self, role: PartyRole) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parties WHERE role = ?1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub(crate) async fn fetch_party(
    conn: &mut SqliteConnection,
    role: PartyRole,
    id: &str,
) -> DbResult<Option<Party>> {
    let sql = format!("SELECT {PARTY_COLUMNS} FROM parties WHERE role = ?1 AND id = ?2");
    let party = sqlx::query_as::<_, Party>(&sql)
        .bind(role)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(party)
}

/// Fetches a party or fails with `NotFound` naming the role.
pub(crate) async fn require_party(
    conn: &mut SqliteConnection,
    role: PartyRole,
    id: &str,
) -> DbResult<Party> {
    fetch_party(conn, role, id)
        .await?
        .ok_or_else(|| DbError::not_found(role.entity(), id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_roles_are_separate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.parties();

        let mut supplier = Party::new("s1", "Apex Pharma");
        supplier.gstin = Some("27AAACA1234A1Z5".to_string());
        repo.insert(PartyRole::Supplier, &supplier).await.unwrap();
        repo.insert(PartyRole::Customer, &Party::new("c1", "Apex Clinic"))
            .await
            .unwrap();

        assert_eq!(repo.search(PartyRole::Supplier, "apex", 10).await.unwrap(), vec![supplier]);
        assert_eq!(repo.search(PartyRole::Customer, "a", 10).await.unwrap().len(), 1);
        assert!(repo.search(PartyRole::Customer, " ", 10).await.unwrap().is_empty());

        assert!(repo.get_by_id(PartyRole::Supplier, "c1").await.unwrap().is_none());
        assert!(repo.get_by_id(PartyRole::Customer, "c1").await.unwrap().is_some());
        assert_eq!(repo.count(PartyRole::Supplier).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.parties();

        let created = repo
            .upsert(PartyRole::Customer, &Party::new("", "  Ravi Kumar "))
            .await
            .unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.name, "Ravi Kumar");

        let mut edited = created.clone();
        edited.name = "RAVI KUMAR & SONS".to_string();
        edited.phone = Some("98450 12345".to_string());
        let updated = repo.upsert(PartyRole::Customer, &edited).await.unwrap();
        assert_eq!(updated.id, created.id);

        let stored = repo.get_by_id(PartyRole::Customer, &created.id).await.unwrap();
        assert_eq!(stored, Some(updated));
        assert_eq!(repo.search(PartyRole::Customer, "sons", 10).await.unwrap().len(), 1);
        assert_eq!(repo.count(PartyRole::Customer).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_unknown_id_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.parties();
        repo.insert(PartyRole::Supplier, &Party::new("s1", "Apex Pharma"))
            .await
            .unwrap();

        // same id, other role
        let err = repo
            .upsert(PartyRole::Customer, &Party::new("s1", "Apex Clinic"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Customer"));

        let err = repo
            .upsert(PartyRole::Supplier, &Party::new("s404", "Nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_party() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.parties();
        repo.insert(PartyRole::Supplier, &Party::new("s1", "Apex Pharma"))
            .await
            .unwrap();

        assert!(matches!(
            repo.delete(PartyRole::Customer, "s1").await,
            Err(DbError::NotFound { .. })
        ));
        repo.delete(PartyRole::Supplier, "s1").await.unwrap();
        assert_eq!(repo.count(PartyRole::Supplier).await.unwrap(), 0);
        assert!(matches!(
            repo.delete(PartyRole::Supplier, "s1").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_party_names() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.parties();
        repo.insert(PartyRole::Customer, &Party::new("c1", "ÅSA Medical"))
            .await
            .unwrap();

        assert_eq!(repo.search(PartyRole::Customer, "åsa", 10).await.unwrap().len(), 1);
    }

    #[test]
    fn test_role_for_kind() {
        assert_eq!(PartyRole::for_kind(DocumentKind::Purchase), PartyRole::Supplier);
        assert_eq!(PartyRole::for_kind(DocumentKind::Sale).as_str(), "customer");
    }
}
