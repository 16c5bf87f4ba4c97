//! Undo/redo and the row and view commands that feed the history.
//!
//! Both directions first cancel an open editor, since its value is not in
//! the history. Undo applies inverses in reverse order; redo replays
//! forward in the original order.

use std::collections::BTreeSet;

use cellgrid_core::{RowData, RowId};
use cellgrid_engine::{apply_forward, apply_inverse, Replayed};
use cellgrid_protocol::Command;

use crate::controller::GridController;

impl GridController {
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_editor();
        self.fill_drag = None;
        let Some(batch) = self.history.undo() else {
            return false;
        };
        let committed = self.writes_committed();
        let mut view = None;
        self.model.batch_update(|model| {
            for cmd in batch.commands.iter().rev() {
                if let Replayed::View(prev) = apply_inverse(model, cmd, committed) {
                    view = Some(prev);
                }
            }
        });
        if let Some(view) = view {
            self.view = view;
        }
        log::debug!("undo: {}", batch.label());

        let inverses = batch.commands.iter().rev().map(Command::inverted).collect();
        self.forward_to_server(inverses);
        self.clamp_to_model();
        self.refresh();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_editor();
        self.fill_drag = None;
        let Some(batch) = self.history.redo() else {
            return false;
        };
        let committed = self.writes_committed();
        let mut view = None;
        self.model.batch_update(|model| {
            for cmd in &batch.commands {
                if let Replayed::View(next) = apply_forward(model, cmd, committed) {
                    view = Some(next);
                }
            }
        });
        if let Some(view) = view {
            self.view = view;
        }
        log::debug!("redo: {}", batch.label());

        self.forward_to_server(batch.commands);
        self.clamp_to_model();
        self.refresh();
        true
    }

    // ========================================================================
    // Row and view commands
    // ========================================================================

    /// Insert a row at `index` (clamped). Returns its new id.
    pub fn insert_row(&mut self, data: RowData, index: usize) -> RowId {
        if self.editor.is_some() {
            self.commit_editor();
        }
        let row_id = self.model.insert_row_at(data.clone(), index, None);
        let index = self.model.row_index(row_id).unwrap_or(index);
        self.record(vec![Command::insert_row(row_id, data, index)]);
        row_id
    }

    pub fn delete_row(&mut self, row_id: RowId) -> bool {
        if self.editor.as_ref().is_some_and(|e| e.row_id == row_id) {
            self.cancel_editor();
        }
        let Some(removed) = self.model.remove_row(row_id) else {
            return false;
        };
        let cmd = Command::delete_row(row_id, removed.row.raw, removed.index).with_pending(removed.pending);
        self.record(vec![cmd]);
        true
    }

    /// Delete every row the selection touches as one batch. Returns the
    /// number of rows removed.
    pub fn delete_selected_rows(&mut self) -> usize {
        self.cancel_editor();
        let rows = self.model.row_count();
        let indices: BTreeSet<usize> = self
            .selection
            .ranges()
            .iter()
            .flat_map(|r| {
                let (start, end) = r.row_span();
                start..=end
            })
            .filter(|&r| r < rows)
            .collect();
        // Bottom-up, so each recorded index is the row's position at the
        // time it was removed
        let ids: Vec<RowId> = indices.iter().rev().filter_map(|&r| self.model.row_id_at(r)).collect();
        if ids.is_empty() {
            return 0;
        }

        let batch = Self::new_batch_id();
        let commands: Vec<Command> = self.model.batch_update(|model| {
            ids.iter()
                .filter_map(|&id| {
                    let removed = model.remove_row(id)?;
                    let cmd = Command::delete_row(id, removed.row.raw, removed.index).with_pending(removed.pending);
                    Some(cmd.with_batch(batch.clone()))
                })
                .collect()
        });
        let count = commands.len();
        log::debug!("deleted {count} selected row(s)");
        self.record(commands);
        count
    }

    /// Replace the caller-owned view state, recording the change.
    pub fn set_view(&mut self, view: serde_json::Value) -> bool {
        if view == self.view {
            return false;
        }
        let prev = std::mem::replace(&mut self.view, view.clone());
        self.record(vec![Command::update_view(prev, view)]);
        true
    }
}
