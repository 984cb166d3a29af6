//! # Form State
//!
//! Keyboard focus of the entry form: the grid cell under the cursor and the
//! medicine dropdown, if one is open.
//!
//! ```text
//!   type in a medicine cell ──► suggest_medicines ──► dropdown for that row
//!   ↑ ↓ Enter Esc ───────────► navigate_suggestions
//!   ← → ↑ ↓ (no dropdown) ───► move_cursor
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use medibill_core::navigation::{GridCursor, Suggestions};
use medibill_core::Medicine;

/// Medicine suggestions open under one grid row.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicineDropdown {
    pub row: usize,
    pub suggestions: Suggestions<Medicine>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFocus {
    pub cursor: GridCursor,
    pub dropdown: Option<MedicineDropdown>,
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    focus: Arc<Mutex<FormFocus>>,
}

impl FormState {
    pub fn new() -> Self {
        FormState::default()
    }

    pub fn with_focus<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&FormFocus) -> R,
    {
        let focus = self.focus.lock().unwrap_or_else(PoisonError::into_inner);
        f(&focus)
    }

    pub fn with_focus_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut FormFocus) -> R,
    {
        let mut focus = self.focus.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut focus)
    }

    /// Back to the first cell with no dropdown, e.g. for a new draft.
    pub fn reset(&self) {
        self.with_focus_mut(|focus| *focus = FormFocus::default());
    }
}
