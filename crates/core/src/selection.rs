use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeKind {
    /// A rectangle of cells.
    Cells,
    /// Whole rows; the column span is ignored.
    Rows,
}

/// A rectangular cell span or full-row span, inclusive on both ends.
///
/// Stored exactly as the gesture produced it (start may be after end);
/// use `normalized()` or the span accessors to read min/max bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRange {
    pub kind: RangeKind,
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl SelectionRange {
    /// Create a single-cell range.
    pub fn cell(row: usize, col: usize) -> Self {
        Self::cells(row, col, row, col)
    }

    /// Rectangle from one corner to the opposite one, not normalized.
    pub fn cells(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            kind: RangeKind::Cells,
            start_row: r1,
            end_row: r2,
            start_col: c1,
            end_col: c2,
        }
    }

    /// Whole rows `r1..=r2` across `col_count` columns.
    pub fn rows(r1: usize, r2: usize, col_count: usize) -> Self {
        Self {
            kind: RangeKind::Rows,
            start_row: r1,
            end_row: r2,
            start_col: 0,
            end_col: col_count.saturating_sub(1),
        }
    }

    pub fn normalized(&self) -> Self {
        let (start_row, end_row) = self.row_span();
        let (start_col, end_col) = self.col_span();
        Self { kind: self.kind, start_row, end_row, start_col, end_col }
    }

    /// `(min_row, max_row)`
    pub fn row_span(&self) -> (usize, usize) {
        (self.start_row.min(self.end_row), self.start_row.max(self.end_row))
    }

    /// `(min_col, max_col)`
    pub fn col_span(&self) -> (usize, usize) {
        (self.start_col.min(self.end_col), self.start_col.max(self.end_col))
    }

    pub fn height(&self) -> usize {
        let (a, b) = self.row_span();
        b - a + 1
    }

    pub fn width(&self) -> usize {
        let (a, b) = self.col_span();
        b - a + 1
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        let (r0, r1) = self.row_span();
        if row < r0 || row > r1 {
            return false;
        }
        match self.kind {
            RangeKind::Rows => true,
            RangeKind::Cells => {
                let (c0, c1) = self.col_span();
                col >= c0 && col <= c1
            }
        }
    }

    /// Number of cells in this range.
    pub fn cell_count(&self) -> usize {
        self.height() * self.width()
    }

    pub fn is_single(&self) -> bool {
        self.kind == RangeKind::Cells && self.start_row == self.end_row && self.start_col == self.end_col
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells_iter(&self) -> impl Iterator<Item = (usize, usize)> {
        let (r0, r1) = self.row_span();
        let (c0, c1) = self.col_span();
        (r0..=r1).flat_map(move |r| (c0..=c1).map(move |c| (r, c)))
    }

    /// Union of two ranges when it is itself a single range of the same kind.
    pub fn try_merge(&self, other: &SelectionRange) -> Option<SelectionRange> {
        if self.kind != other.kind {
            return None;
        }
        let a = self.normalized();
        let b = other.normalized();
        let rows_touch = a.start_row <= b.end_row + 1 && b.start_row <= a.end_row + 1;
        let cols_touch = a.start_col <= b.end_col + 1 && b.start_col <= a.end_col + 1;
        let same_cols = a.start_col == b.start_col && a.end_col == b.end_col;
        let same_rows = a.start_row == b.start_row && a.end_row == b.end_row;

        let merged_rows = || (a.start_row.min(b.start_row), a.end_row.max(b.end_row));

        match a.kind {
            RangeKind::Rows if rows_touch => {
                let (r0, r1) = merged_rows();
                Some(SelectionRange { start_row: r0, end_row: r1, ..a })
            }
            RangeKind::Rows => None,
            RangeKind::Cells => {
                if same_cols && rows_touch {
                    let (r0, r1) = merged_rows();
                    Some(SelectionRange { start_row: r0, end_row: r1, ..a })
                } else if same_rows && cols_touch {
                    Some(SelectionRange {
                        start_col: a.start_col.min(b.start_col),
                        end_col: a.end_col.max(b.end_col),
                        ..a
                    })
                } else if encloses(&a, &b) {
                    Some(a)
                } else if encloses(&b, &a) {
                    Some(b)
                } else {
                    None
                }
            }
        }
    }
}

fn encloses(outer: &SelectionRange, inner: &SelectionRange) -> bool {
    outer.start_row <= inner.start_row
        && outer.end_row >= inner.end_row
        && outer.start_col <= inner.start_col
        && outer.end_col >= inner.end_col
}

/// Collapse ranges until no two of them can be merged into one.
///
/// Order of first appearance is kept; ranges that never merge are returned
/// exactly as given (un-normalized).
pub fn merge_ranges(ranges: &[SelectionRange]) -> Vec<SelectionRange> {
    let mut out: Vec<SelectionRange> = ranges.to_vec();
    'outer: loop {
        for i in 0..out.len() {
            for j in (i + 1)..out.len() {
                if let Some(merged) = out[i].try_merge(&out[j]) {
                    out[i] = merged;
                    out.remove(j);
                    continue 'outer;
                }
            }
        }
        return out;
    }
}

/// The stored selection: an always-minimal list of ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<SelectionRange>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all ranges.
    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The range the last gesture produced.
    pub fn primary(&self) -> Option<&SelectionRange> {
        self.ranges.last()
    }

    /// Check if a cell is selected.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(row, col))
    }

    /// Replace the selection with one range (click, shift+click).
    pub fn set(&mut self, range: SelectionRange) {
        self.ranges = vec![range];
    }

    /// Union an additional range (ctrl+click).
    pub fn add(&mut self, range: SelectionRange) {
        self.ranges.push(range);
        self.ranges = merge_ranges(&self.ranges);
    }

    /// Replace the most recent range (drag extension) and re-merge.
    pub fn replace_last(&mut self, range: SelectionRange) {
        self.ranges.pop();
        self.ranges.push(range);
        self.ranges = merge_ranges(&self.ranges);
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Drop ranges that start past the last row and clip the rest.
    pub fn clamp_rows(&mut self, row_count: usize) {
        if row_count == 0 {
            self.ranges.clear();
            return;
        }
        let last = row_count - 1;
        self.ranges.retain(|r| r.row_span().0 <= last);
        for r in &mut self.ranges {
            r.start_row = r.start_row.min(last);
            r.end_row = r.end_row.min(last);
        }
        self.ranges = merge_ranges(&self.ranges);
    }
}
