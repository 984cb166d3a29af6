//! # Commands Module
//!
//! Everything the entry form (or the CLI) can ask the backend to do.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── draft.rs    ◄─── new_draft, get_draft, edit_field, set_tax_mode, rows, header
//! ├── catalog.rs  ◄─── search_medicines, choose_medicine, choose_batch, parties
//! ├── navigation.rs ◄─ suggest_medicines, navigate_suggestions, move_cursor, reset_form
//! ├── party.rs    ◄─── save_party, delete_party
//! ├── stock.rs    ◄─── medicine_summary, low_stock_alerts, dashboard
//! └── submit.rs   ◄─── save_draft
//! ```
//!
//! ## State Injection
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only needs the draft
//! fn edit_field(draft: &DraftState, config: &AppConfig, row, field, value)
//!
//! // Needs the catalog snapshot and the draft
//! fn choose_medicine(catalog: &CatalogState, draft: &DraftState, ...)
//!
//! // Needs everything
//! async fn save_draft(db: &DbState, catalog: &CatalogState, draft: &DraftState, ...)
//! ```
//!
//! Commands return `Result<T, ApiError>`; `T` and `ApiError` both serialize
//! to JSON for the form.

pub mod catalog;
pub mod draft;
pub mod navigation;
pub mod party;
pub mod stock;
pub mod submit;

pub use catalog::{
    choose_batch, choose_medicine, choose_party, refresh_catalog, search_medicines, search_parties,
};
pub use draft::{
    add_row, edit_field, get_draft, new_draft, remove_row, set_tax_mode, update_header, DraftView,
    HeaderUpdate, RowView, TotalsView,
};
pub use navigation::{
    move_cursor, navigate_suggestions, reset_form, suggest_medicines, NavigationResponse,
    SuggestionView,
};
pub use party::{delete_party, save_party};
pub use stock::{
    dashboard, dashboard_on, low_stock_alerts, medicine_summary, ActivityView, DashboardView,
};
pub use submit::{record_payload, save_draft, SaveResponse};
