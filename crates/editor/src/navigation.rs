//! Pointer gestures, keyboard dispatch and selection movement.

use cellgrid_core::{ColumnType, Selection, SelectionRange};

use crate::controller::GridController;
use crate::mode::{DragOrigin, RangeDrag};
use crate::surface::{HitTarget, HitZone, Key, KeyEvent, Modifiers, PointerEvent};

/// Move `pos` by `delta`, clamped to `0..len`.
fn offset(pos: usize, delta: i32, len: usize) -> usize {
    let moved = pos as i64 + i64::from(delta);
    moved.clamp(0, len as i64 - 1) as usize
}

impl GridController {
    // ========================================================================
    // Programmatic selection
    // ========================================================================

    /// Make `(row, col)` the active cell and the whole selection.
    pub fn select_cell(&mut self, row: usize, col: usize) -> bool {
        if row >= self.model.row_count() || col >= self.col_count() {
            return false;
        }
        if self.editor.is_some() {
            self.commit_editor();
        }
        self.active = Some((row, col));
        self.extend_end = None;
        self.selection.set(SelectionRange::cell(row, col));
        self.scroll_into_view(row);
        self.refresh();
        true
    }

    /// Add a range to the selection, or replace the selection with it.
    pub fn select_range(&mut self, range: SelectionRange, add: bool) {
        if add {
            self.selection.add(range);
        } else {
            self.selection.set(range);
        }
        let n = range.normalized();
        if self.active.map_or(true, |(r, c)| !range.contains(r, c)) {
            self.active = Some((n.start_row, n.start_col));
        }
        self.clamp_to_model();
        self.refresh();
    }

    pub fn clear_selection(&mut self) {
        if self.editor.is_some() {
            self.commit_editor();
        }
        self.selection.clear();
        self.active = None;
        self.extend_end = None;
        self.refresh();
    }

    fn range_for(&self, origin: DragOrigin, anchor: (usize, usize), target: (usize, usize)) -> SelectionRange {
        match origin {
            DragOrigin::Cell => SelectionRange::cells(anchor.0, anchor.1, target.0, target.1),
            DragOrigin::RowHeader => SelectionRange::rows(anchor.0, target.0, self.col_count()),
            DragOrigin::ColumnHeader => {
                let last = self.model.row_count().saturating_sub(1);
                SelectionRange::cells(0, anchor.1, last, target.1)
            }
        }
    }

    /// Resolve a hit target to indices. Header hits fill the missing axis
    /// from the active cell.
    fn hit_cell(&self, hit: &HitTarget) -> Option<(usize, usize)> {
        let row = hit.row_id.and_then(|id| self.model.row_index(id));
        let col = hit.col_key.as_deref().and_then(|key| self.model.schema().index_of(key));
        match hit.zone {
            HitZone::Cell | HitZone::FillHandle => Some((row?, col?)),
            HitZone::RowHeader => Some((row?, self.active.map_or(0, |(_, c)| c))),
            HitZone::ColumnHeader => Some((self.active.map_or(0, |(r, _)| r), col?)),
        }
    }

    /// Apply a click gesture: plain replaces, shift extends from the active
    /// cell, accel unions.
    fn apply_gesture(&mut self, origin: DragOrigin, target: (usize, usize), mods: Modifiers) {
        let anchor = match (mods.shift, self.active) {
            (true, Some(active)) => active,
            _ => target,
        };
        let range = self.range_for(origin, anchor, target);
        let base = if mods.accel { self.selection.clone() } else { Selection::new() };

        if mods.accel {
            self.selection.add(range);
        } else {
            self.selection.set(range);
        }
        if mods.shift && self.active.is_some() {
            self.extend_end = Some(target);
        } else {
            let active = match origin {
                DragOrigin::ColumnHeader => (0, target.1),
                _ => target,
            };
            self.active = Some(active);
            self.extend_end = None;
        }
        self.range_drag = Some(RangeDrag { origin, anchor, base });
        log::debug!("range drag start {origin:?} at {target:?}");
    }

    // ========================================================================
    // Pointer
    // ========================================================================

    pub fn pointer_down(&mut self, event: PointerEvent) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(hit) = self.surface.as_ref().and_then(|s| s.hit_test(&event)) else {
            return false;
        };
        self.last_pointer = Some(event);

        if hit.zone == HitZone::FillHandle {
            if self.editor.is_some() {
                self.commit_editor();
            }
            return self.start_fill_drag();
        }
        if hit.zone == HitZone::ColumnHeader && self.model.row_count() == 0 {
            return false;
        }
        let Some(target) = self.hit_cell(&hit) else {
            return false;
        };

        if self.editor.is_some() {
            // Clicks inside the open editor belong to the control
            if hit.zone == HitZone::Cell && self.active == Some(target) {
                return false;
            }
            self.commit_editor();
        }

        let mods = event.modifiers;
        if hit.zone == HitZone::Cell
            && mods.is_empty()
            && self.active == Some(target)
            && self.is_boolean_column(target.1)
        {
            // Second click on a selected boolean cell
            return self.toggle_boolean(target.0, target.1);
        }

        let origin = match hit.zone {
            HitZone::RowHeader => DragOrigin::RowHeader,
            HitZone::ColumnHeader => DragOrigin::ColumnHeader,
            _ => DragOrigin::Cell,
        };
        self.apply_gesture(origin, target, mods);
        self.refresh();
        true
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> bool {
        if self.destroyed || (self.fill_drag.is_none() && self.range_drag.is_none()) {
            return false;
        }
        self.last_pointer = Some(event);
        self.resample_pointer()
    }

    pub fn pointer_up(&mut self, event: PointerEvent) -> bool {
        if self.destroyed {
            return false;
        }
        if self.fill_drag.is_some() {
            self.last_pointer = Some(event);
            self.resample_pointer();
            self.last_pointer = None;
            self.end_fill_drag();
            return true;
        }
        self.last_pointer = None;
        if self.range_drag.take().is_some() {
            log::debug!("range drag end");
            self.refresh();
            return true;
        }
        false
    }

    /// Pointer capture lost. Drags stop without writing.
    pub fn pointer_cancel(&mut self) {
        self.last_pointer = None;
        let had_drag = self.fill_drag.take().is_some() | self.range_drag.take().is_some();
        if had_drag {
            log::debug!("drag cancelled");
            self.refresh();
        }
    }

    /// Hit-test the last pointer position again and update the drag in
    /// progress. Called on pointer move and on every auto-scroll tick.
    pub(crate) fn resample_pointer(&mut self) -> bool {
        let Some(event) = self.last_pointer else {
            return false;
        };
        let Some(hit) = self.surface.as_ref().and_then(|s| s.hit_test(&event)) else {
            return false;
        };
        let row = hit.row_id.and_then(|id| self.model.row_index(id));
        let col = hit.col_key.as_deref().and_then(|key| self.model.schema().index_of(key));

        if self.fill_drag.is_some() {
            return row.is_some_and(|row| self.update_fill_drag(row));
        }
        let Some(drag) = self.range_drag.clone() else {
            return false;
        };
        let target = match (drag.origin, row, col) {
            (DragOrigin::Cell, Some(r), Some(c)) => (r, c),
            (DragOrigin::RowHeader, Some(r), _) => (r, drag.anchor.1),
            (DragOrigin::ColumnHeader, _, Some(c)) => (drag.anchor.0, c),
            _ => return false,
        };
        let mut selection = drag.base.clone();
        selection.add(self.range_for(drag.origin, drag.anchor, target));
        self.selection = selection;
        if self.active != Some(target) {
            self.extend_end = Some(target);
        }
        self.refresh();
        true
    }

    fn is_boolean_column(&self, col: usize) -> bool {
        self.column_at(col).is_some_and(|c| c.column_type == ColumnType::Boolean)
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    /// Dispatch a key. Returns whether the grid consumed it.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        if self.destroyed {
            return false;
        }
        if self.ime_blocks(&event) {
            log::debug!("{:?} ignored during composition", event.key);
            return false;
        }
        if self.editor.is_some() {
            return self.handle_editing_key(&event);
        }
        let Some((row, col)) = self.active else {
            return false;
        };

        let mods = event.modifiers;
        if mods.accel {
            let Key::Char(c) = event.key else {
                return false;
            };
            return match c.to_ascii_lowercase() {
                'z' if mods.shift => self.redo(),
                'z' => self.undo(),
                'y' => self.redo(),
                'c' => self.copy(),
                'x' => self.cut(),
                'v' => self.paste(),
                _ => false,
            };
        }

        match event.key {
            Key::ArrowUp => self.move_active(-1, 0, mods.shift),
            Key::ArrowDown => self.move_active(1, 0, mods.shift),
            Key::ArrowLeft => self.move_active(0, -1, mods.shift),
            Key::ArrowRight => self.move_active(0, 1, mods.shift),
            Key::Tab => self.move_active(0, if mods.shift { -1 } else { 1 }, false),
            Key::Enter => self.move_active(if mods.shift { -1 } else { 1 }, 0, false),
            Key::F2 => self.open_editor(),
            Key::Delete | Key::Backspace => {
                self.clear_selected_cells();
                true
            }
            Key::Space if self.is_boolean_column(col) => self.toggle_boolean(row, col),
            Key::Space => self.open_editor_with(Some(" ".to_string())),
            Key::Char(c) if !mods.alt && !self.is_boolean_column(col) => {
                self.open_editor_with(Some(c.to_string()))
            }
            Key::Escape => {
                let had_drag = self.fill_drag.take().is_some() | self.range_drag.take().is_some();
                if had_drag {
                    self.refresh();
                }
                had_drag
            }
            _ => false,
        }
    }

    /// Move the active cell, or with `extend` grow the selection from it.
    pub fn move_active(&mut self, dr: i32, dc: i32, extend: bool) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        let rows = self.model.row_count();
        let cols = self.col_count();
        if rows == 0 || cols == 0 {
            return false;
        }

        let from = if extend { self.extend_end.unwrap_or(active) } else { active };
        let to = (offset(from.0, dr, rows), offset(from.1, dc, cols));
        if extend {
            self.selection.set(SelectionRange::cells(active.0, active.1, to.0, to.1));
            self.extend_end = Some(to);
        } else {
            self.active = Some(to);
            self.extend_end = None;
            self.selection.set(SelectionRange::cell(to.0, to.1));
        }
        self.scroll_into_view(to.0);
        self.refresh();
        true
    }

    pub(crate) fn scroll_into_view(&mut self, row: usize) {
        let visible = self.viewport.visible_rows.max(1);
        if row < self.viewport.first_row {
            self.viewport.first_row = row;
        } else if row >= self.viewport.first_row + visible {
            self.viewport.first_row = row + 1 - visible;
        }
    }
}
