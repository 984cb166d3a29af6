//! # Draft State
//!
//! The invoice currently being typed in.
//!
//! ## Thread Safety
//! The draft is wrapped in `Arc<Mutex<T>>`: every command that edits it
//! takes the lock exclusively, and reads take it briefly. Commands never
//! hold the lock across an `.await`; `save_draft` copies the document out,
//! records it, then locks again to reset.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Form Action           Command              Draft Change                │
//! │  ───────────           ───────              ────────────                │
//! │  Type in a cell ─────► edit_field() ──────► set_field(row, field, text) │
//! │  Pick a medicine ────► choose_medicine() ─► select_medicine(row, &m)    │
//! │  Pick a batch ───────► choose_batch() ────► select_batch(row, &b)       │
//! │  Toggle tax mode ────► set_tax_mode() ────► reprices every row          │
//! │  Save ───────────────► save_draft() ──────► reset() after recording     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use medibill_core::DocumentDraft;

#[derive(Debug, Clone)]
pub struct DraftState {
    draft: Arc<Mutex<DocumentDraft>>,
}

impl DraftState {
    pub fn new(draft: DocumentDraft) -> Self {
        DraftState {
            draft: Arc::new(Mutex::new(draft)),
        }
    }

    /// Executes a function with read access to the draft.
    pub fn with_draft<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&DocumentDraft) -> R,
    {
        let draft = self.draft.lock().unwrap_or_else(PoisonError::into_inner);
        f(&draft)
    }

    /// Executes a function with write access to the draft.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// draft_state.with_draft_mut(|d| d.set_field(0, LineField::Quantity, "10"))?;
    /// ```
    pub fn with_draft_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut DocumentDraft) -> R,
    {
        let mut draft = self.draft.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut draft)
    }

    /// Swaps in a new draft, e.g. when the user switches forms.
    pub fn replace(&self, draft: DocumentDraft) {
        self.with_draft_mut(|current| *current = draft);
    }
}
