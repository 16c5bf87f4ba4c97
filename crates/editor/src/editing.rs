//! Editor lifecycle.
//!
//! Opening reads the cell's effective value and asks the control factory
//! for a control of the column's kind. Commit reads the control back and
//! emits one edit command; cancel closes the control without touching the
//! model. Boolean cells never open a control and toggle in place.

use std::collections::BTreeSet;

use cellgrid_core::{CellValue, ColumnType, RowId};
use cellgrid_protocol::Command;

use crate::controller::GridController;
use crate::errors::ErrorScope;
use crate::surface::{read_control, ControlKind, EditorControl, Key, KeyEvent};

/// The single open editor.
pub(crate) struct ActiveEditor {
    pub row_id: RowId,
    pub col_key: String,
    pub control: Box<dyn EditorControl>,
    /// Effective value when the editor opened
    pub original: CellValue,
    pub multiline: bool,
}

impl std::fmt::Debug for ActiveEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveEditor")
            .field("row_id", &self.row_id)
            .field("col_key", &self.col_key)
            .field("kind", &self.control.kind())
            .finish()
    }
}

impl GridController {
    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    /// Kind of the open control, if any.
    pub fn editor_kind(&self) -> Option<ControlKind> {
        self.editor.as_ref().map(|e| e.control.kind())
    }

    /// Open an editor at the active cell (F2).
    pub fn open_editor(&mut self) -> bool {
        self.open_editor_with(None)
    }

    /// Open an editor at the active cell, seeded with `seed` instead of the
    /// cell's value when given (typing into a selected cell).
    pub(crate) fn open_editor_with(&mut self, seed: Option<String>) -> bool {
        if self.editor.is_some() || self.destroyed {
            return false;
        }
        let Some((row, col)) = self.active else {
            return false;
        };
        let Some((row_id, col_key)) = self.cell_id(row, col) else {
            return false;
        };
        let Some(column) = self.model.schema().column(&col_key).cloned() else {
            return false;
        };
        if column.column_type == ColumnType::Boolean {
            return false;
        }
        if self.model.is_readonly(row_id, &col_key) {
            log::debug!("not editing readonly cell {row_id}/{col_key}");
            return false;
        }
        if let Some(owner) = self.remote_locks.get(&row_id) {
            log::debug!("not editing {row_id}: locked by {}", owner.id);
            return false;
        }

        let original = self.model.get_cell(row_id, &col_key).unwrap_or_default();
        let initial = seed.unwrap_or_else(|| original.to_edit_string());
        let multiline = column.wrap || initial.contains('\n');
        let kind = ControlKind::for_column(column.column_type, multiline);
        let mut control = self.controls.create(&column, kind, &initial);
        control.focus();

        log::debug!("editor opened at {row_id}/{col_key} ({kind:?})");
        self.editor = Some(ActiveEditor { row_id, col_key, control, original, multiline });
        self.fill_drag = None;
        self.lock_row(row_id);
        self.refresh();
        true
    }

    /// Close the editor and write its value. Returns whether a command was
    /// emitted; an unchanged value closes without one.
    pub fn commit_editor(&mut self) -> bool {
        let Some(mut editor) = self.editor.take() else {
            return false;
        };
        let value = self
            .model
            .schema()
            .column(&editor.col_key)
            .map(|column| read_control(editor.control.as_ref(), column));
        editor.control.destroy();
        self.unlock_row();
        log::debug!("editor committed at {}/{}", editor.row_id, editor.col_key);

        match value {
            Some(value) if !value.same_value(&editor.original) => {
                let cmd = Command::edit(editor.row_id, editor.col_key, editor.original, value);
                self.execute(vec![cmd]);
                true
            }
            _ => {
                self.refresh();
                false
            }
        }
    }

    /// Close the editor without writing.
    pub fn cancel_editor(&mut self) -> bool {
        let Some(mut editor) = self.editor.take() else {
            return false;
        };
        editor.control.destroy();
        self.unlock_row();
        log::debug!("editor cancelled at {}/{}", editor.row_id, editor.col_key);
        self.refresh();
        true
    }

    pub(crate) fn commit_editor_and_move(&mut self, dr: i32, dc: i32) -> bool {
        self.commit_editor();
        self.move_active(dr, dc, false)
    }

    /// The control fired its native change event.
    pub fn on_control_change(&mut self) -> bool {
        let instant = self.editor.as_ref().is_some_and(|e| e.control.kind().commits_on_change());
        instant && self.commit_editor()
    }

    // ========================================================================
    // IME
    // ========================================================================

    /// An IME composition finished at `timestamp_ms`.
    pub fn composition_end(&mut self, timestamp_ms: u64) {
        self.composition_ended_at = Some(timestamp_ms);
    }

    /// Enter/Tab/Escape are swallowed while composing and for a short grace
    /// window after composition ends.
    pub(crate) fn ime_blocks(&self, event: &KeyEvent) -> bool {
        if !matches!(event.key, Key::Enter | Key::Tab | Key::Escape) {
            return false;
        }
        if event.is_composing {
            return true;
        }
        self.composition_ended_at.is_some_and(|end| {
            event.timestamp_ms >= end && event.timestamp_ms - end < self.settings.composition_grace_ms
        })
    }

    pub(crate) fn handle_editing_key(&mut self, event: &KeyEvent) -> bool {
        let mods = event.modifiers;
        match event.key {
            Key::Enter => {
                let multiline = self.editor.as_ref().is_some_and(|e| e.multiline);
                if multiline && (mods.alt || mods.accel) {
                    if let Some(editor) = self.editor.as_mut() {
                        editor.control.insert_newline();
                    }
                    return true;
                }
                self.commit_editor_and_move(if mods.shift { -1 } else { 1 }, 0)
            }
            Key::Tab => self.commit_editor_and_move(0, if mods.shift { -1 } else { 1 }),
            Key::Escape => self.cancel_editor(),
            Key::Backspace => {
                // Backspace on an empty control commits empty
                let empty = self.editor.as_ref().is_some_and(|e| e.control.text().is_empty());
                if !empty {
                    return false;
                }
                self.commit_editor();
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // In-place writes
    // ========================================================================

    /// Flip a boolean cell. Ignored for other column types and readonly
    /// cells.
    pub fn toggle_boolean(&mut self, row: usize, col: usize) -> bool {
        let Some((row_id, key)) = self.cell_id(row, col) else {
            return false;
        };
        let is_bool = self.column_at(col).is_some_and(|c| c.column_type == ColumnType::Boolean);
        if !is_bool || self.model.is_readonly(row_id, &key) {
            return false;
        }
        let prev = self.model.get_cell(row_id, &key).unwrap_or_default();
        let next = CellValue::Bool(!prev.as_bool().unwrap_or(false));
        self.execute(vec![Command::edit(row_id, key, prev, next)]);
        true
    }

    /// Clear every selected cell (Delete/Backspace) as one batch. Returns
    /// the number of cells changed.
    pub fn clear_selected_cells(&mut self) -> usize {
        let cells = self.selected_cells();
        self.clear_cells(cells)
    }

    /// Clear `cells` to their column's cleared value (`false` for booleans,
    /// empty otherwise) as one batch, skipping readonly cells.
    pub(crate) fn clear_cells(&mut self, cells: BTreeSet<(usize, usize)>) -> usize {
        let batch = Self::new_batch_id();
        let mut commands = Vec::new();
        for (row, col) in cells {
            let Some((row_id, key)) = self.cell_id(row, col) else {
                continue;
            };
            let Some(column) = self.column_at(col) else {
                continue;
            };
            if self.model.is_readonly(row_id, &key) {
                continue;
            }
            let cleared = column.column_type.cleared_value();
            let prev = self.model.get_cell(row_id, &key).unwrap_or_default();
            if prev.same_value(&cleared) {
                continue;
            }
            commands.push(Command::edit(row_id, key, prev, cleared).with_batch(batch.clone()));
        }
        let count = commands.len();
        self.execute(commands);
        count
    }

    /// Every selected cell inside the grid.
    pub(crate) fn selected_cells(&self) -> BTreeSet<(usize, usize)> {
        let rows = self.model.row_count();
        let cols = self.col_count();
        self.selection
            .ranges()
            .iter()
            .flat_map(|r| r.cells_iter())
            .filter(|&(r, c)| r < rows && c < cols)
            .collect()
    }

    // ========================================================================
    // Deferred commits
    // ========================================================================

    /// Commit every pending row and send the flushed edits to the server.
    /// Returns the number of rows flushed.
    pub fn flush_pending(&mut self) -> usize {
        let row_ids = self.model.pending_row_ids();
        if row_ids.is_empty() {
            return 0;
        }
        let keys: Vec<String> = self.model.schema().keys().map(str::to_string).collect();
        let mut outgoing = Vec::new();
        for &row_id in &row_ids {
            for key in &keys {
                if let Some(next) = self.model.pending_value(row_id, key) {
                    let prev = self.model.get_raw_cell(row_id, key).unwrap_or_default();
                    outgoing.push(Command::edit(row_id, key.clone(), prev, next.clone()));
                }
            }
        }
        self.model.batch_update(|model| {
            for &row_id in &row_ids {
                model.apply_pending(row_id);
            }
        });
        log::debug!("flushed {} pending row(s)", row_ids.len());
        self.send_to_server(&outgoing);
        self.refresh();
        row_ids.len()
    }

    // ========================================================================
    // Row locks
    // ========================================================================

    pub(crate) fn lock_row(&mut self, row_id: RowId) {
        self.locked_row = Some(row_id);
        let Some(adapter) = self.adapter.as_mut() else {
            return;
        };
        if let Err(e) = adapter.lock_row(row_id, &self.user) {
            log::warn!("lock of {row_id} failed: {e}");
            self.errors.set(ErrorScope::Lock, e.to_string());
        }
    }

    pub(crate) fn unlock_row(&mut self) {
        let Some(row_id) = self.locked_row.take() else {
            return;
        };
        let Some(adapter) = self.adapter.as_mut() else {
            return;
        };
        if let Err(e) = adapter.unlock_rows(&[row_id], &self.user) {
            log::warn!("unlock of {row_id} failed: {e}");
            self.errors.set(ErrorScope::Lock, e.to_string());
        }
    }
}
