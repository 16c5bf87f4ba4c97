use cellgrid_core::Selection;

/// Interaction states. Derived from the controller's state rather than
/// stored, so there is never more than one editor or drag in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// No active cell.
    #[default]
    Idle,
    /// Active cell set; keys navigate and drive the clipboard.
    Selection,
    /// One editor control is open at the active cell.
    Editing,
    /// Dragging the fill handle.
    FillDragging,
    /// Dragging out a range from a cell or header.
    RangeDragging,
}

impl Mode {
    pub fn is_editing(&self) -> bool {
        matches!(self, Mode::Editing)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Mode::FillDragging | Mode::RangeDragging)
    }
}

/// Fill handle drag state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillDrag {
    /// Column being filled
    pub col: usize,
    /// Seed rows (inclusive)
    pub start_row: usize,
    pub end_row: usize,
    /// Last row covered by the drag; never above `end_row`
    pub target_row: usize,
}

impl FillDrag {
    /// Rows the release would write, if any.
    pub fn preview_rows(&self) -> Option<(usize, usize)> {
        (self.target_row > self.end_row).then_some((self.end_row + 1, self.target_row))
    }
}

/// What a range drag started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DragOrigin {
    Cell,
    RowHeader,
    ColumnHeader,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RangeDrag {
    pub origin: DragOrigin,
    pub anchor: (usize, usize),
    /// Ranges kept from before an accelerator-modified drag
    pub base: Selection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_preview_rows() {
        let mut drag = FillDrag { col: 0, start_row: 2, end_row: 3, target_row: 3 };
        assert_eq!(drag.preview_rows(), None);
        drag.target_row = 6;
        assert_eq!(drag.preview_rows(), Some((4, 6)));
    }
}
