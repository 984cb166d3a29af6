//! # Submit Command
//!
//! Saves the current draft as a purchase or sale.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. copy the document out of DraftState (lock released)                 │
//! │  2. validate_for_submission   invoice number, party, ≥1 line,           │
//! │                               every line has a medicine                 │
//! │  3. build_payload             rounded amounts, empty rows dropped       │
//! │  4. record                    purchases().record / sales().record       │
//! │  5. reset the draft, refresh the catalog snapshot                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure at any step leaves the draft untouched so the user can fix it
//! and save again.

use medibill_core::{build_payload, validate_for_submission, DocumentKind, SubmissionPayload};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::{AppConfig, CatalogState, DbState, DraftState};

/// What the form shows after a successful save.
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    pub kind: DocumentKind,
    pub id: String,
    pub invoice_number: String,
    pub line_count: usize,
    pub grand_total: f64,
    pub grand_total_display: String,
}

/// Records a submission payload with the repository for its kind.
pub async fn record_payload(
    db: &DbState,
    config: &AppConfig,
    payload: &SubmissionPayload,
) -> Result<SaveResponse, ApiError> {
    let (id, invoice_number) = match payload {
        SubmissionPayload::Purchase(purchase) => {
            let record = db.inner().purchases().record(purchase).await?;
            (record.id, record.invoice_number)
        }
        SubmissionPayload::Sale(sale) => {
            let record = db.inner().sales().record(sale).await?;
            (record.id, record.invoice_number)
        }
    };

    Ok(SaveResponse {
        kind: payload.kind(),
        id,
        invoice_number,
        line_count: payload.lines().len(),
        grand_total: payload.grand_total(),
        grand_total_display: config.format_currency(payload.grand_total()),
    })
}

/// Validates, records and resets the current draft.
pub async fn save_draft(
    db: &DbState,
    catalog: &CatalogState,
    draft: &DraftState,
    config: &AppConfig,
) -> Result<SaveResponse, ApiError> {
    let document = draft.with_draft(|d| d.to_document());
    debug!(kind = ?document.kind, invoice = %document.invoice_number, "save_draft command");

    validate_for_submission(&document)?;
    let payload = build_payload(&document);
    let response = record_payload(db, config, &payload).await?;

    draft.with_draft_mut(|d| d.reset());

    if let Err(e) = catalog.refresh(db.inner()).await {
        warn!("Catalog refresh after save failed: {}", e);
    }

    info!(
        kind = ?response.kind,
        id = %response.id,
        grand_total = response.grand_total,
        "Draft saved"
    );
    Ok(response)
}
