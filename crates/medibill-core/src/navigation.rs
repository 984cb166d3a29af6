//! # Navigation Module
//!
//! Keyboard behaviour of the entry forms: the autocomplete dropdown under a
//! medicine or party cell, and arrow-key movement across the line grid.
//!
//! ```text
//!   Suggestions (wraps)                 GridCursor (clamps)
//!   ───────────────────                 ───────────────────
//!   ArrowDown: none → 0 → 1 → … → n-1 → 0
//!   ArrowUp:   none → n-1 → … → 0 → n-1
//!   Enter:     take active, close       ← → stay inside the row
//!   Escape:    close                    ↑ ↓ stay inside the grid
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::draft::LineField;

/// Keys the forms forward to the navigation helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NavKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
}

// =============================================================================
// Autocomplete Suggestions
// =============================================================================

/// What a key press did to an open suggestion list.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionOutcome<T> {
    /// Highlight moved (or the key was ignored); list still open.
    Moved,
    /// Enter on a highlighted item; the list closed.
    Selected(T),
    /// Escape, or Enter with nothing highlighted; the list closed.
    Closed,
}

/// An open autocomplete dropdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestions<T> {
    items: Vec<T>,
    active: Option<usize>,
    open: bool,
}

impl<T: Clone> Suggestions<T> {
    /// Opens a list with nothing highlighted. An empty result set stays closed.
    pub fn new(items: Vec<T>) -> Self {
        let open = !items.is_empty();
        Suggestions {
            items,
            active: None,
            open,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&T> {
        self.active.and_then(|i| self.items.get(i))
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Applies one key press.
    ///
    /// ## Example
    /// ```rust
    /// use medibill_core::navigation::{NavKey, SuggestionOutcome, Suggestions};
    ///
    /// let mut list = Suggestions::new(vec!["Paracetamol", "Pantoprazole"]);
    /// list.handle_key(NavKey::ArrowUp);
    /// assert_eq!(list.active(), Some(&"Pantoprazole"));
    ///
    /// list.handle_key(NavKey::ArrowDown);
    /// assert_eq!(
    ///     list.handle_key(NavKey::Enter),
    ///     SuggestionOutcome::Selected("Paracetamol")
    /// );
    /// assert!(!list.is_open());
    /// ```
    pub fn handle_key(&mut self, key: NavKey) -> SuggestionOutcome<T> {
        if !self.open {
            return SuggestionOutcome::Closed;
        }

        let len = self.items.len();
        match key {
            NavKey::ArrowDown => {
                self.active = Some(match self.active {
                    Some(i) if i + 1 < len => i + 1,
                    _ => 0,
                });
                SuggestionOutcome::Moved
            }
            NavKey::ArrowUp => {
                self.active = Some(match self.active {
                    Some(i) if i > 0 => i - 1,
                    _ => len - 1,
                });
                SuggestionOutcome::Moved
            }
            NavKey::Enter => {
                let picked = self.active().cloned();
                self.close();
                match picked {
                    Some(item) => SuggestionOutcome::Selected(item),
                    None => SuggestionOutcome::Closed,
                }
            }
            NavKey::Escape => {
                self.close();
                SuggestionOutcome::Closed
            }
            NavKey::ArrowLeft | NavKey::ArrowRight => SuggestionOutcome::Moved,
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.active = None;
    }
}

// =============================================================================
// Grid Cursor
// =============================================================================

/// Grid columns reachable with the arrow keys, left to right.
pub const GRID_COLUMNS: [LineField; 7] = [
    LineField::MedicineName,
    LineField::Batch,
    LineField::Expiry,
    LineField::Mrp,
    LineField::TaxRate,
    LineField::Quantity,
    LineField::UnitPrice,
];

/// Focused cell in the line grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GridCursor {
    pub row: usize,
    pub col: usize,
}

impl GridCursor {
    pub fn new(row: usize, col: usize) -> Self {
        GridCursor {
            row,
            col: col.min(GRID_COLUMNS.len() - 1),
        }
    }

    /// Field under the cursor.
    pub fn field(&self) -> LineField {
        GRID_COLUMNS[self.col.min(GRID_COLUMNS.len() - 1)]
    }

    /// Moves one cell, never leaving a grid of `rows` rows.
    pub fn step(&self, key: NavKey, rows: usize) -> GridCursor {
        let last_row = rows.saturating_sub(1);
        let last_col = GRID_COLUMNS.len() - 1;
        let row = self.row.min(last_row);

        match key {
            NavKey::ArrowLeft => GridCursor {
                row,
                col: self.col.saturating_sub(1),
            },
            NavKey::ArrowRight => GridCursor {
                row,
                col: (self.col + 1).min(last_col),
            },
            NavKey::ArrowUp => GridCursor {
                row: row.saturating_sub(1),
                col: self.col,
            },
            NavKey::ArrowDown => GridCursor {
                row: (row + 1).min(last_row),
                col: self.col,
            },
            NavKey::Enter | NavKey::Escape => GridCursor { row, col: self.col },
        }
    }
}
