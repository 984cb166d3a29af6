//! # Party Commands
//!
//! Supplier and customer maintenance. Both commands refresh the
//! autocomplete snapshot so the entry form sees the change at once.

use medibill_core::{DocumentKind, Party};
use medibill_db::{DbError, PartyRole};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::{CatalogState, DbState, DraftState};

/// Creates the party when `party.id` is blank, otherwise updates it.
pub async fn save_party(
    db: &DbState,
    catalog: &CatalogState,
    kind: DocumentKind,
    party: Party,
) -> Result<Party, ApiError> {
    let role = PartyRole::for_kind(kind);
    debug!(role = role.as_str(), id = %party.id, "save_party command");

    if party.name.trim().is_empty() {
        return Err(ApiError::validation(format!(
            "{} name is required",
            kind.party_role()
        )));
    }

    let saved = db.inner().parties().upsert(role, &party).await?;

    if let Err(e) = catalog.refresh(db.inner()).await {
        warn!("Catalog refresh after party save failed: {}", e);
    }
    Ok(saved)
}

/// Deletes a party. If the open draft names it, the draft's party is
/// cleared.
pub async fn delete_party(
    db: &DbState,
    catalog: &CatalogState,
    draft: &DraftState,
    kind: DocumentKind,
    party_id: &str,
) -> Result<(), ApiError> {
    let role = PartyRole::for_kind(kind);
    debug!(role = role.as_str(), party_id, "delete_party command");

    db.inner()
        .parties()
        .delete(role, party_id)
        .await
        .map_err(|e| match e {
            DbError::ForeignKeyViolation { .. } => ApiError::validation(format!(
                "{} {} appears on recorded invoices and cannot be deleted",
                kind.party_role(),
                party_id
            )),
            other => other.into(),
        })?;

    let cleared = draft.with_draft_mut(|d| {
        let named = d.kind() == kind && d.document().party_id.as_deref() == Some(party_id);
        if named {
            d.clear_party();
        }
        named
    });
    if cleared {
        info!(party_id, "Deleted party removed from the open draft");
    }

    if let Err(e) = catalog.refresh(db.inner()).await {
        warn!("Catalog refresh after party delete failed: {}", e);
    }
    Ok(())
}
