//! # Draft Commands
//!
//! Commands that edit the invoice being typed in and read it back with
//! computed figures.
//!
//! Every command returns the whole [`DraftView`] so the form re-renders rows,
//! net unit prices, row totals and the summary block from one response.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PRODUCT NAME    BATCH   QTY   UNIT   TAX%   NET UNIT   TOTAL          │
//! │  Dolo 650        D12     100   10.50  5      11.03      1102.50        │
//! │  (empty)                                                                │
//! │                                                                         │
//! │                              Subtotal              ₹1050.00             │
//! │                              Tax                     ₹52.50             │
//! │                              Grand total           ₹1102.50             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use medibill_core::{
    DocumentDraft, DocumentKind, LineField, LineItem, LineResult, PaymentType, PurchaseType,
    TaxMode, Totals, ValidationError,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppConfig, DraftState};

// =============================================================================
// Views
// =============================================================================

/// One grid row with its computed figures.
#[derive(Debug, Clone, Serialize)]
pub struct RowView {
    pub index: usize,
    pub line: LineItem,
    pub result: LineResult,
    pub net_unit_display: String,
    pub row_total_display: String,
}

/// The summary block, rounded and formatted.
#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub line_count: usize,
    pub subtotal: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub subtotal_display: String,
    pub tax_total_display: String,
    pub grand_total_display: String,
}

impl TotalsView {
    pub fn new(totals: &Totals, config: &AppConfig) -> Self {
        let rounded = totals.rounded();
        TotalsView {
            line_count: rounded.line_count,
            subtotal: rounded.subtotal,
            tax_total: rounded.tax_total,
            grand_total: rounded.grand_total,
            subtotal_display: config.format_currency(totals.subtotal),
            tax_total_display: config.format_currency(totals.tax_total),
            grand_total_display: config.format_currency(totals.grand_total),
        }
    }
}

/// Everything the entry form renders.
#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub kind: DocumentKind,
    pub tax_mode: TaxMode,
    pub invoice_number: String,
    pub date: Option<NaiveDate>,
    pub party_id: Option<String>,
    pub party_name: String,
    pub purchase_type: PurchaseType,
    pub payment_type: PaymentType,
    pub use_actual_price: bool,
    pub rows: Vec<RowView>,
    pub totals: TotalsView,
}

impl DraftView {
    pub fn new(draft: &DocumentDraft, config: &AppConfig) -> Self {
        let document = draft.document();
        let rows = draft
            .rows()
            .iter()
            .zip(draft.line_results())
            .enumerate()
            .map(|(index, (line, result))| RowView {
                index,
                line: line.clone(),
                net_unit_display: config.format_currency(result.net_unit_incl_tax),
                row_total_display: config.format_currency(result.row_total),
                result,
            })
            .collect();

        DraftView {
            kind: document.kind,
            tax_mode: document.tax_mode,
            invoice_number: document.invoice_number.clone(),
            date: document.date,
            party_id: document.party_id.clone(),
            party_name: draft.party_name().to_string(),
            purchase_type: document.purchase_type,
            payment_type: document.payment_type,
            use_actual_price: document.use_actual_price,
            rows,
            totals: TotalsView::new(&draft.totals(), config),
        }
    }
}

/// Header fields to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeaderUpdate {
    pub invoice_number: Option<String>,
    /// `YYYY-MM-DD`; an empty string clears the date.
    pub date: Option<String>,
    pub purchase_type: Option<PurchaseType>,
    pub payment_type: Option<PaymentType>,
    pub use_actual_price: Option<bool>,
}

// =============================================================================
// Commands
// =============================================================================

/// Starts a new purchase or sale, discarding the current draft.
pub fn new_draft(draft: &DraftState, config: &AppConfig, kind: DocumentKind) -> DraftView {
    debug!(?kind, "new_draft command");
    let fresh = config.new_draft(kind);
    let view = DraftView::new(&fresh, config);
    draft.replace(fresh);
    view
}

pub fn get_draft(draft: &DraftState, config: &AppConfig) -> DraftView {
    draft.with_draft(|d| DraftView::new(d, config))
}

/// Writes typed text into one grid cell.
///
/// ## Arguments
/// * `row` - Zero-based row index
/// * `field` - snake_case field name, e.g. `"unit_price"`
/// * `value` - Raw cell text; coerced by the draft
pub fn edit_field(
    draft: &DraftState,
    config: &AppConfig,
    row: usize,
    field: &str,
    value: &str,
) -> Result<DraftView, ApiError> {
    debug!(row, field, "edit_field command");

    let field = LineField::parse(field)
        .ok_or_else(|| ApiError::validation(format!("Unknown field: {}", field)))?;

    draft.with_draft_mut(|d| -> Result<DraftView, ApiError> {
        d.set_field(row, field, value)?;
        Ok(DraftView::new(d, config))
    })
}

pub fn add_row(draft: &DraftState, config: &AppConfig) -> DraftView {
    draft.with_draft_mut(|d| {
        let row = d.add_row();
        debug!(row, "add_row command");
        DraftView::new(d, config)
    })
}

pub fn remove_row(
    draft: &DraftState,
    config: &AppConfig,
    row: usize,
) -> Result<DraftView, ApiError> {
    debug!(row, "remove_row command");
    draft.with_draft_mut(|d| -> Result<DraftView, ApiError> {
        d.remove_row(row)?;
        Ok(DraftView::new(d, config))
    })
}

/// Switches the tax mode ("exclusive" / "inclusive"). Rows keep their
/// entered prices and reprice under the new mode.
pub fn set_tax_mode(
    draft: &DraftState,
    config: &AppConfig,
    mode: &str,
) -> Result<DraftView, ApiError> {
    let mode = TaxMode::parse(mode)
        .ok_or_else(|| ApiError::validation(format!("Unknown tax mode: {}", mode)))?;

    Ok(draft.with_draft_mut(|d| {
        d.set_tax_mode(mode);
        DraftView::new(d, config)
    }))
}

pub fn update_header(
    draft: &DraftState,
    config: &AppConfig,
    update: HeaderUpdate,
) -> Result<DraftView, ApiError> {
    debug!(?update, "update_header command");

    let date = match update.date.as_deref().map(str::trim) {
        None => None,
        Some("") => Some(None),
        Some(text) => {
            let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| {
                ValidationError::InvalidFormat {
                    field: "date".to_string(),
                    reason: e.to_string(),
                }
            })?;
            Some(Some(parsed))
        }
    };

    Ok(draft.with_draft_mut(|d| {
        if let Some(invoice_number) = &update.invoice_number {
            d.set_invoice_number(invoice_number);
        }
        if let Some(date) = date {
            d.set_date(date);
        }
        if let Some(purchase_type) = update.purchase_type {
            d.set_purchase_type(purchase_type);
        }
        if let Some(payment_type) = update.payment_type {
            d.set_payment_type(payment_type);
        }
        if let Some(use_actual_price) = update.use_actual_price {
            d.set_use_actual_price(use_actual_price);
        }
        DraftView::new(d, config)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn setup(kind: DocumentKind) -> (DraftState, AppConfig) {
        let config = AppConfig::default();
        let draft = DraftState::new(config.new_draft(kind));
        (draft, config)
    }

    #[test]
    fn test_typing_a_purchase_row() {
        let (draft, config) = setup(DocumentKind::Purchase);

        edit_field(&draft, &config, 0, "medicine_name", "Dolo 650").unwrap();
        edit_field(&draft, &config, 0, "quantity", "100").unwrap();
        let view = edit_field(&draft, &config, 0, "unit_price", "10.5").unwrap();

        assert_eq!(view.rows[0].row_total_display, "₹1102.50");
        assert_eq!(view.totals.subtotal_display, "₹1050.00");
        assert_eq!(view.totals.tax_total_display, "₹52.50");
        assert_eq!(view.totals.grand_total, 1102.5);
        assert_eq!(view.totals.line_count, 1);
    }

    #[test]
    fn test_switching_to_inclusive_reprices() {
        let (draft, config) = setup(DocumentKind::Sale);

        edit_field(&draft, &config, 0, "medicine_name", "Dolo 650").unwrap();
        edit_field(&draft, &config, 0, "quantity", "100").unwrap();
        edit_field(&draft, &config, 0, "unit_price", "10.5").unwrap();

        let view = set_tax_mode(&draft, &config, "inclusive").unwrap();
        assert_eq!(view.tax_mode, TaxMode::Inclusive);
        assert_eq!(view.totals.grand_total, 1050.0);
        assert_eq!(view.totals.subtotal, 1000.0);
        assert_eq!(view.rows[0].line.unit_price, 10.5);
    }

    #[test]
    fn test_unknown_field_and_mode_are_rejected() {
        let (draft, config) = setup(DocumentKind::Sale);

        let err = edit_field(&draft, &config, 0, "colour", "red").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = set_tax_mode(&draft, &config, "vat").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_row_out_of_range() {
        let (draft, config) = setup(DocumentKind::Sale);
        let err = edit_field(&draft, &config, 7, "quantity", "1").unwrap_err();
        assert_eq!(err.code, ErrorCode::DraftError);
    }

    #[test]
    fn test_new_draft_replaces_current() {
        let (draft, config) = setup(DocumentKind::Sale);
        edit_field(&draft, &config, 0, "medicine_name", "ORS").unwrap();

        let view = new_draft(&draft, &config, DocumentKind::Purchase);
        assert_eq!(view.kind, DocumentKind::Purchase);
        assert_eq!(view.rows.len(), 2);
        assert!(view.rows.iter().all(|r| r.line.is_empty()));
        assert_eq!(get_draft(&draft, &config).kind, DocumentKind::Purchase);
    }

    #[test]
    fn test_add_and_remove_rows() {
        let (draft, config) = setup(DocumentKind::Sale);
        let view = add_row(&draft, &config);
        assert_eq!(view.rows.len(), 3);

        let view = remove_row(&draft, &config, 0).unwrap();
        assert_eq!(view.rows.len(), 2);
    }

    #[test]
    fn test_update_header() {
        let (draft, config) = setup(DocumentKind::Purchase);

        let view = update_header(
            &draft,
            &config,
            HeaderUpdate {
                invoice_number: Some("  INV-77 ".to_string()),
                date: Some("2026-10-16".to_string()),
                purchase_type: Some(PurchaseType::StockUpdate),
                use_actual_price: Some(true),
                ..HeaderUpdate::default()
            },
        )
        .unwrap();

        assert_eq!(view.invoice_number, "INV-77");
        assert_eq!(view.date, NaiveDate::from_ymd_opt(2026, 10, 16));
        assert_eq!(view.purchase_type, PurchaseType::StockUpdate);
        assert_eq!(view.payment_type, PaymentType::Cash);
        assert!(view.use_actual_price);

        let view = update_header(
            &draft,
            &config,
            HeaderUpdate {
                date: Some(String::new()),
                ..HeaderUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(view.date, None);
        assert_eq!(view.invoice_number, "INV-77");
    }

    #[test]
    fn test_bad_header_date() {
        let (draft, config) = setup(DocumentKind::Purchase);
        let err = update_header(
            &draft,
            &config,
            HeaderUpdate {
                date: Some("16/10/2026".to_string()),
                ..HeaderUpdate::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
