//! Fill handle (drag the selection corner down to extend a column)

use cellgrid_core::{CellValue, ColumnType, RangeKind, SelectionRange};
use cellgrid_engine::{infer_sequence, Sequence};
use cellgrid_protocol::Command;

use crate::controller::GridController;
use crate::mode::FillDrag;

impl GridController {
    /// The handle shows for one single-column cell range that contains the
    /// active cell, when the active cell is writable. Closed-option columns
    /// copy and need one seed row; sequence columns need two. Booleans never
    /// fill.
    pub fn fill_handle_visible(&self) -> bool {
        if self.editor.is_some() {
            return false;
        }
        let Some((row, col)) = self.active else {
            return false;
        };
        let [range] = self.selection.ranges() else {
            return false;
        };
        let r = range.normalized();
        if r.kind != RangeKind::Cells || r.start_col != r.end_col || !r.contains(row, col) {
            return false;
        }
        let (Some(column), Some(row_id)) = (self.column_at(col), self.model.row_id_at(row)) else {
            return false;
        };
        if self.model.is_readonly(row_id, &column.key) {
            return false;
        }
        match column.column_type {
            ColumnType::Boolean => false,
            t if t.is_closed_option() => r.height() >= 1,
            t if t.is_sequence_eligible() => r.height() >= 2,
            _ => false,
        }
    }

    /// Is fill handle drag active
    pub fn is_fill_dragging(&self) -> bool {
        self.fill_drag.is_some()
    }

    pub fn fill_drag(&self) -> Option<FillDrag> {
        self.fill_drag
    }

    /// Start fill handle drag from the current selection
    pub fn start_fill_drag(&mut self) -> bool {
        if !self.fill_handle_visible() {
            return false;
        }
        let Some(r) = self.selection.primary().map(SelectionRange::normalized) else {
            return false;
        };
        self.fill_drag = Some(FillDrag {
            col: r.start_col,
            start_row: r.start_row,
            end_row: r.end_row,
            target_row: r.end_row,
        });
        log::debug!("fill drag start: col {} rows {}..={}", r.start_col, r.start_row, r.end_row);
        self.refresh();
        true
    }

    /// Extend the preview to `row`. Fill only runs downward, so rows above
    /// the seed collapse the preview.
    pub(crate) fn update_fill_drag(&mut self, row: usize) -> bool {
        let last = self.model.row_count().saturating_sub(1);
        let Some(drag) = self.fill_drag.as_mut() else {
            return false;
        };
        let target = row.max(drag.end_row).min(last.max(drag.end_row));
        if target == drag.target_row {
            return false;
        }
        drag.target_row = target;
        self.refresh();
        true
    }

    /// Release: write the sequence into the newly covered rows as one batch.
    /// Readonly rows keep their value but still consume a sequence step, and
    /// a finite sequence leaves the rows past its end untouched. Returns the
    /// number of cells written.
    pub fn end_fill_drag(&mut self) -> usize {
        let Some(drag) = self.fill_drag.take() else {
            return 0;
        };
        let Some((first, last)) = drag.preview_rows() else {
            log::debug!("fill drag end: nothing to fill");
            self.refresh();
            return 0;
        };
        let Some(column) = self.column_at(drag.col).cloned() else {
            self.refresh();
            return 0;
        };

        let seed: Vec<CellValue> = (drag.start_row..=drag.end_row)
            .filter_map(|r| self.model.row_id_at(r))
            .map(|id| self.model.get_cell(id, &column.key).unwrap_or_default())
            .collect();
        let mut sequence = if column.column_type.is_closed_option() {
            Sequence::cycle(seed)
        } else {
            infer_sequence(&seed, &self.registry)
        };

        // The sequence yields offset 1 (the row below the seed) first
        let batch = Self::new_batch_id();
        let mut commands = Vec::new();
        for row in first..=last {
            let Some(value) = sequence.next() else {
                break;
            };
            let Some(row_id) = self.model.row_id_at(row) else {
                break;
            };
            if self.model.is_readonly(row_id, &column.key) {
                continue;
            }
            let prev = self.model.get_cell(row_id, &column.key).unwrap_or_default();
            if prev.same_value(&value) {
                continue;
            }
            commands.push(Command::edit(row_id, column.key.clone(), prev, value).with_batch(batch.clone()));
        }

        let written = commands.len();
        log::debug!("fill drag end: {written} cell(s) in {}", column.key);
        self.selection.set(SelectionRange::cells(drag.start_row, drag.col, last, drag.col));
        self.execute(commands);
        written
    }

    /// Drop the drag without writing.
    pub fn cancel_fill_drag(&mut self) -> bool {
        if self.fill_drag.take().is_none() {
            return false;
        }
        self.refresh();
        true
    }
}
