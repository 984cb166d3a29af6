//! # Catalog Commands
//!
//! Autocomplete lookups for the medicine, batch and party fields, and the
//! selections that copy catalog data into the draft.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  type "do" ──► search_medicines ──► [Dolo 650, Dolonex DT]              │
//! │                                        │ Enter                          │
//! │                                        ▼                                │
//! │               choose_medicine(row, id) ─► name, id, tax rate (locked)   │
//! │                                        │                                │
//! │               choose_batch(row, "D12") ─► batch, expiry, MRP            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups read the in-memory [`CatalogState`] snapshot, not the database.

use medibill_core::{CatalogSource, CoreError, Medicine, Party};
use tracing::debug;

use super::draft::DraftView;
use crate::error::ApiError;
use crate::state::{AppConfig, CatalogState, DbState, DraftState};

/// Medicines whose name contains `query` (needs at least two characters).
pub fn search_medicines(
    catalog: &CatalogState,
    config: &AppConfig,
    query: &str,
) -> Vec<Medicine> {
    let results = catalog.with_catalog(|c| c.search_medicines(query, config.suggestion_limit));
    debug!(query, results = results.len(), "search_medicines command");
    results
}

/// Suppliers when the draft is a purchase, customers when it is a sale.
pub fn search_parties(
    catalog: &CatalogState,
    draft: &DraftState,
    config: &AppConfig,
    query: &str,
) -> Vec<Party> {
    let kind = draft.with_draft(|d| d.kind());
    let results = catalog.with_catalog(|c| c.search_parties(kind, query, config.suggestion_limit));
    debug!(query, ?kind, results = results.len(), "search_parties command");
    results
}

/// Fills `row` from a catalog medicine.
pub fn choose_medicine(
    catalog: &CatalogState,
    draft: &DraftState,
    config: &AppConfig,
    row: usize,
    medicine_id: &str,
) -> Result<DraftView, ApiError> {
    debug!(row, medicine_id, "choose_medicine command");

    let medicine = catalog
        .with_catalog(|c| c.get_medicine(medicine_id))
        .ok_or_else(|| CoreError::MedicineNotFound(medicine_id.to_string()))?;

    draft.with_draft_mut(|d| -> Result<DraftView, ApiError> {
        d.select_medicine(row, &medicine)?;
        Ok(DraftView::new(d, config))
    })
}

/// Fills `row`'s batch details from one of its medicine's batches.
///
/// The row must already have a catalog medicine.
pub fn choose_batch(
    catalog: &CatalogState,
    draft: &DraftState,
    config: &AppConfig,
    row: usize,
    batch_no: &str,
) -> Result<DraftView, ApiError> {
    debug!(row, batch_no, "choose_batch command");

    let (medicine_id, medicine_name) = draft.with_draft(|d| {
        d.row(row)
            .map(|line| (line.medicine_id.clone(), line.medicine_name.clone()))
    })?;
    let medicine_id = medicine_id
        .ok_or_else(|| ApiError::validation(format!("Row {} has no catalog medicine", row + 1)))?;

    let batch = catalog
        .with_catalog(|c| c.get_medicine(&medicine_id))
        .and_then(|m| m.batch(batch_no).cloned())
        .ok_or_else(|| CoreError::BatchNotFound {
            medicine: medicine_name,
            batch_no: batch_no.trim().to_string(),
        })?;

    draft.with_draft_mut(|d| -> Result<DraftView, ApiError> {
        d.select_batch(row, &batch)?;
        Ok(DraftView::new(d, config))
    })
}

/// Sets the draft's supplier or customer.
pub fn choose_party(
    catalog: &CatalogState,
    draft: &DraftState,
    config: &AppConfig,
    party_id: &str,
) -> Result<DraftView, ApiError> {
    debug!(party_id, "choose_party command");

    let kind = draft.with_draft(|d| d.kind());
    let party = catalog
        .with_catalog(|c| c.get_party(kind, party_id))
        .ok_or_else(|| CoreError::PartyNotFound {
            role: kind.party_role().to_string(),
            id: party_id.to_string(),
        })?;

    Ok(draft.with_draft_mut(|d| {
        d.set_party(&party);
        DraftView::new(d, config)
    }))
}

/// Reloads the autocomplete snapshot from the database.
pub async fn refresh_catalog(db: &DbState, catalog: &CatalogState) -> Result<usize, ApiError> {
    let count = catalog.refresh(db.inner()).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use medibill_core::{Batch, DocumentKind, InMemoryCatalog};

    fn setup(kind: DocumentKind) -> (CatalogState, DraftState, AppConfig) {
        let mut batch = Batch::new("b1", "m1", "D12");
        batch.mrp = Some(32.0);
        batch.expiry = chrono::NaiveDate::from_ymd_opt(2027, 6, 30);

        let catalog = InMemoryCatalog::new()
            .with_medicines([
                Medicine::new("m1", "Dolo 650").with_tax_rate(12.0).with_batch(batch),
                Medicine::new("m2", "Dolonex DT"),
                Medicine::new("m3", "Shelcal 500"),
            ])
            .with_suppliers([Party::new("s1", "Apex Pharma")])
            .with_customers([Party::new("c1", "Ravi Kumar")]);

        let config = AppConfig::default();
        let draft = DraftState::new(config.new_draft(kind));
        (CatalogState::new(catalog), draft, config)
    }

    #[test]
    fn test_search_medicines_needs_two_chars() {
        let (catalog, _, config) = setup(DocumentKind::Sale);
        assert!(search_medicines(&catalog, &config, "d").is_empty());
        assert_eq!(search_medicines(&catalog, &config, "DO").len(), 2);
    }

    #[test]
    fn test_search_parties_follows_draft_kind() {
        let (catalog, draft, config) = setup(DocumentKind::Purchase);
        assert_eq!(search_parties(&catalog, &draft, &config, "a")[0].id, "s1");

        draft.replace(config.new_draft(DocumentKind::Sale));
        assert_eq!(search_parties(&catalog, &draft, &config, "a")[0].id, "c1");
    }

    #[test]
    fn test_choose_medicine_then_batch() {
        let (catalog, draft, config) = setup(DocumentKind::Sale);

        let view = choose_medicine(&catalog, &draft, &config, 0, "m1").unwrap();
        assert_eq!(view.rows[0].line.medicine_name, "Dolo 650");
        assert_eq!(view.rows[0].line.tax_rate, 12.0);
        assert!(view.rows[0].line.tax_locked);

        let view = choose_batch(&catalog, &draft, &config, 0, "D12").unwrap();
        assert_eq!(view.rows[0].line.batch, "D12");
        assert_eq!(view.rows[0].line.mrp, Some(32.0));
    }

    #[test]
    fn test_medicine_without_rate_gets_default() {
        let (catalog, draft, config) = setup(DocumentKind::Sale);
        let view = choose_medicine(&catalog, &draft, &config, 0, "m2").unwrap();
        assert_eq!(view.rows[0].line.tax_rate, 5.0);
    }

    #[test]
    fn test_choose_unknown_medicine() {
        let (catalog, draft, config) = setup(DocumentKind::Sale);
        let err = choose_medicine(&catalog, &draft, &config, 0, "m9").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_choose_batch_needs_catalog_medicine() {
        let (catalog, draft, config) = setup(DocumentKind::Sale);
        let err = choose_batch(&catalog, &draft, &config, 0, "D12").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        choose_medicine(&catalog, &draft, &config, 0, "m1").unwrap();
        let err = choose_batch(&catalog, &draft, &config, 0, "X99").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Batch X99 not found for medicine Dolo 650");
    }

    #[test]
    fn test_choose_party() {
        let (catalog, draft, config) = setup(DocumentKind::Purchase);
        let view = choose_party(&catalog, &draft, &config, "s1").unwrap();
        assert_eq!(view.party_id.as_deref(), Some("s1"));
        assert_eq!(view.party_name, "Apex Pharma");

        let err = choose_party(&catalog, &draft, &config, "c1").unwrap_err();
        assert_eq!(err.message, "Supplier not found: c1");
    }
}
