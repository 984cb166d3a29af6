//! # Navigation Commands
//!
//! Keyboard handling for the line grid: the medicine dropdown and the
//! arrow-key cursor.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "do" in row 0 ──► suggest_medicines ──► [Dolo 650, Dolonex DT]         │
//! │                                             │ ↓ ↓                       │
//! │                    navigate_suggestions ────┤ Moved (highlight 1)       │
//! │                                             │ Enter                     │
//! │                    choose_medicine(row 0) ◄─┘ Selected, cursor → Batch  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The form sends arrow keys to [`navigate_suggestions`] while a dropdown is
//! open and to [`move_cursor`] otherwise. [`reset_form`] clears both when a
//! new draft starts.

use medibill_core::navigation::{GridCursor, NavKey, SuggestionOutcome, Suggestions};
use medibill_core::{CatalogSource, Medicine};
use serde::Serialize;
use tracing::debug;

use super::catalog::choose_medicine;
use super::draft::DraftView;
use crate::error::ApiError;
use crate::state::{AppConfig, CatalogState, DraftState, FormState, MedicineDropdown};

/// Grid column the cursor lands on after a medicine is picked.
const BATCH_COLUMN: usize = 1;

/// An open (or just closed) medicine dropdown.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionView {
    pub row: usize,
    pub items: Vec<Medicine>,
    pub active: Option<usize>,
    pub open: bool,
}

impl SuggestionView {
    fn new(dropdown: &MedicineDropdown) -> Self {
        SuggestionView {
            row: dropdown.row,
            items: dropdown.suggestions.items().to_vec(),
            active: dropdown.suggestions.active_index(),
            open: dropdown.suggestions.is_open(),
        }
    }
}

/// Result of a key press on the dropdown.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationResponse {
    Moved { suggestions: SuggestionView },
    Selected { draft: DraftView, cursor: GridCursor },
    Closed,
}

/// Searches medicines for `row`'s name cell and opens the dropdown. Queries
/// under two characters close it.
pub fn suggest_medicines(
    catalog: &CatalogState,
    form: &FormState,
    config: &AppConfig,
    row: usize,
    query: &str,
) -> SuggestionView {
    let items = catalog.with_catalog(|c| c.search_medicines(query, config.suggestion_limit));
    debug!(row, query, results = items.len(), "suggest_medicines command");

    let dropdown = MedicineDropdown {
        row,
        suggestions: Suggestions::new(items),
    };
    let view = SuggestionView::new(&dropdown);

    form.with_focus_mut(|f| {
        f.cursor = GridCursor::new(row, 0);
        f.dropdown = dropdown.suggestions.is_open().then_some(dropdown);
    });
    view
}

/// Applies one key to the open dropdown. Enter on a highlighted medicine
/// fills the row and moves the cursor to its batch cell.
pub fn navigate_suggestions(
    catalog: &CatalogState,
    draft: &DraftState,
    form: &FormState,
    config: &AppConfig,
    key: NavKey,
) -> Result<NavigationResponse, ApiError> {
    let step = form.with_focus_mut(|f| {
        let dropdown = f.dropdown.as_mut()?;
        let outcome = dropdown.suggestions.handle_key(key);
        let view = SuggestionView::new(dropdown);
        let row = dropdown.row;
        if !dropdown.suggestions.is_open() {
            f.dropdown = None;
        }
        Some((row, outcome, view))
    });

    let Some((row, outcome, view)) = step else {
        return Ok(NavigationResponse::Closed);
    };
    debug!(row, ?key, "navigate_suggestions command");

    match outcome {
        SuggestionOutcome::Moved => Ok(NavigationResponse::Moved { suggestions: view }),
        SuggestionOutcome::Closed => Ok(NavigationResponse::Closed),
        SuggestionOutcome::Selected(medicine) => {
            let draft_view = choose_medicine(catalog, draft, config, row, &medicine.id)?;
            let cursor = GridCursor::new(row, BATCH_COLUMN);
            form.with_focus_mut(|f| f.cursor = cursor);
            Ok(NavigationResponse::Selected {
                draft: draft_view,
                cursor,
            })
        }
    }
}

/// Moves the grid cursor one cell, staying inside the draft's rows.
pub fn move_cursor(draft: &DraftState, form: &FormState, key: NavKey) -> GridCursor {
    let rows = draft.with_draft(|d| d.rows().len());
    form.with_focus_mut(|f| {
        f.cursor = f.cursor.step(key, rows);
        f.cursor
    })
}

/// Returns the form to the first cell and closes any dropdown. Called after
/// `new_draft` and after a successful save.
pub fn reset_form(form: &FormState) -> GridCursor {
    debug!("reset_form command");
    form.reset();
    form.with_focus(|f| f.cursor)
}
