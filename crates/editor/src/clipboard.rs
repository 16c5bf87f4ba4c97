//! Clipboard operations for the grid.
//!
//! Copy always keeps an internal copy of the payload next to the system
//! clipboard write. Paste reads the system clipboard and falls back to the
//! internal copy when the read fails or comes back empty.

use std::collections::BTreeSet;

use cellgrid_core::SelectionRange;
use cellgrid_io::{coerce_pasted, encode_grid, parse_clipboard, paste_plan, stringify_cell, StringGrid};
use cellgrid_protocol::Command;

use crate::controller::GridController;
use crate::errors::ErrorScope;
use crate::surface::ClipboardContents;

impl GridController {
    /// Copy the current range. Returns false with no selection, or while an
    /// editor is open (the control handles its own copy).
    pub fn copy(&mut self) -> bool {
        if self.editor.is_some() {
            return false;
        }
        let Some(range) = self.selection.primary().map(SelectionRange::normalized) else {
            return false;
        };
        let grid = self.range_strings(&range);
        if grid.is_empty() {
            return false;
        }

        let payload = encode_grid(&grid);
        self.internal_clipboard = Some(payload.clone());
        if let Some(backend) = self.clipboard.as_mut() {
            match backend.write(&payload) {
                Ok(()) => {
                    self.errors.clear(ErrorScope::Clipboard);
                }
                Err(e) => {
                    log::warn!("clipboard write failed, keeping internal copy: {e}");
                    self.errors.set(ErrorScope::Clipboard, e.to_string());
                }
            }
        }
        log::debug!("copied {}x{}", grid.len(), grid.first().map_or(0, Vec::len));
        true
    }

    /// Copy, then clear the copied range as one batch.
    pub fn cut(&mut self) -> bool {
        if !self.copy() {
            return false;
        }
        let Some(range) = self.selection.primary().map(SelectionRange::normalized) else {
            return false;
        };
        let rows = self.model.row_count();
        let cols = self.col_count();
        let cells: BTreeSet<(usize, usize)> =
            range.cells_iter().filter(|&(r, c)| r < rows && c < cols).collect();
        self.clear_cells(cells);
        true
    }

    /// Paste from the clipboard backend (or the internal copy) at the
    /// active cell.
    pub fn paste(&mut self) -> bool {
        if self.editor.is_some() {
            return false;
        }
        let contents = self.read_clipboard();
        self.paste_contents(&contents)
    }

    /// Paste contents the host received with a native paste event.
    pub fn paste_contents(&mut self, contents: &ClipboardContents) -> bool {
        if self.editor.is_some() || self.destroyed {
            return false;
        }
        let Some(anchor) = self.active else {
            return false;
        };
        let Some(grid) = parse_clipboard(contents.text.as_deref(), contents.html.as_deref()) else {
            log::debug!("paste ignored: clipboard holds no grid");
            return false;
        };
        self.paste_grid(&grid, anchor)
    }

    fn read_clipboard(&mut self) -> ClipboardContents {
        let from_backend = match self.clipboard.as_mut().map(|backend| backend.read()) {
            Some(Ok(contents)) if !contents.is_empty() => Some(contents),
            Some(Ok(_)) | None => None,
            Some(Err(e)) => {
                log::warn!("clipboard read failed, using internal copy: {e}");
                self.errors.set(ErrorScope::Clipboard, e.to_string());
                None
            }
        };
        from_backend
            .or_else(|| {
                self.internal_clipboard.as_ref().map(|p| ClipboardContents {
                    text: Some(p.text.clone()),
                    html: Some(p.html.clone()),
                })
            })
            .unwrap_or_default()
    }

    /// Write `grid` with its top-left at `anchor`, clipped to the grid, as
    /// one batch. Readonly destinations are skipped.
    fn paste_grid(&mut self, grid: &[Vec<String>], anchor: (usize, usize)) -> bool {
        let Some(plan) = paste_plan(grid, anchor, self.model.row_count(), self.col_count()) else {
            return false;
        };

        let batch = Self::new_batch_id();
        let mut commands = Vec::new();
        for (r, src_row) in grid.iter().take(plan.rows).enumerate() {
            for c in 0..plan.cols {
                let (row, col) = (plan.start_row + r, plan.start_col + c);
                let Some((row_id, key)) = self.cell_id(row, col) else {
                    continue;
                };
                let Some(column) = self.column_at(col) else {
                    continue;
                };
                if self.model.is_readonly(row_id, &key) {
                    continue;
                }
                let text = src_row.get(c).map_or("", String::as_str);
                let next = coerce_pasted(text, column.column_type);
                let prev = self.model.get_cell(row_id, &key).unwrap_or_default();
                if prev.same_value(&next) {
                    continue;
                }
                commands.push(Command::edit(row_id, key, prev, next).with_batch(batch.clone()));
            }
        }

        log::debug!("paste {}x{} at {:?}: {} cell(s)", plan.rows, plan.cols, anchor, commands.len());
        self.selection.set(SelectionRange::cells(
            plan.start_row,
            plan.start_col,
            plan.start_row + plan.rows - 1,
            plan.start_col + plan.cols - 1,
        ));
        self.execute(commands);
        true
    }

    /// Stringified cells of `range`, clipped to the grid.
    fn range_strings(&self, range: &SelectionRange) -> StringGrid {
        let rows = self.model.row_count();
        let cols = self.col_count();
        if rows == 0 || cols == 0 || range.start_row >= rows || range.start_col >= cols {
            return Vec::new();
        }
        let last_row = range.end_row.min(rows - 1);
        let last_col = range.end_col.min(cols - 1);
        (range.start_row..=last_row)
            .map(|row| {
                (range.start_col..=last_col)
                    .map(|col| {
                        let column = self.column_at(col);
                        let value = self
                            .cell_id(row, col)
                            .and_then(|(id, key)| self.model.get_cell(id, &key))
                            .unwrap_or_default();
                        stringify_cell(&value, column)
                    })
                    .collect()
            })
            .collect()
    }
}
