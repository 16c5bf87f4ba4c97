//! Auto-scroll while a drag nears the top or bottom edge.
//!
//! The host calls `tick_auto_scroll` once per animation frame while it
//! returns true. The tick stops on its own when the drag ends, the pointer
//! is cancelled, or the grid is destroyed.

use crate::controller::GridController;

impl GridController {
    /// -1 scrolls up, 1 scrolls down
    fn auto_scroll_direction(&self) -> Option<i32> {
        if self.destroyed || (self.fill_drag.is_none() && self.range_drag.is_none()) {
            return None;
        }
        let pointer = self.last_pointer?;
        let rect = self.surface.as_ref()?.viewport_rect();
        let margin = self.settings.auto_scroll_edge_margin;
        if pointer.y < rect.y + margin {
            Some(-1)
        } else if pointer.y > rect.bottom() - margin {
            Some(1)
        } else {
            None
        }
    }

    pub fn is_auto_scrolling(&self) -> bool {
        self.auto_scroll_direction().is_some()
    }

    /// Scroll one step toward the edge and re-sample the pointer. Returns
    /// whether another tick should be scheduled.
    pub fn tick_auto_scroll(&mut self) -> bool {
        let Some(direction) = self.auto_scroll_direction() else {
            return false;
        };
        let step = self.settings.auto_scroll_rows_per_tick.max(1);
        let max_first = self.model.row_count().saturating_sub(self.viewport.visible_rows);
        let first = self.viewport.first_row;
        let next = if direction < 0 { first.saturating_sub(step) } else { (first + step).min(max_first) };
        if next != first {
            self.viewport.first_row = next;
            self.render();
        }
        self.resample_pointer();
        true
    }
}
