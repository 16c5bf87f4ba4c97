//! Cell addresses.
//!
//! Callers can name a cell three ways: by row id + column key, by row/column
//! index, or by an A1-style reference. `resolve` turns any of them into
//! canonical `(row, col)` indices, or `None` when the cell does not exist.
//! Out-of-range addresses are never clamped.

use crate::row::RowId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellAddress {
    Id { row_id: RowId, col_key: String },
    Index { row: usize, col: usize },
    /// A1-style reference such as `B3` or `$B$3` (1-based row).
    Reference(String),
}

/// What an address is resolved against.
pub trait AddressSpace {
    fn row_count(&self) -> usize;
    fn col_count(&self) -> usize;
    fn row_index(&self, id: RowId) -> Option<usize>;
    fn col_index(&self, key: &str) -> Option<usize>;
}

/// Resolve an address to `(row, col)` indices.
pub fn resolve(addr: &CellAddress, space: &impl AddressSpace) -> Option<(usize, usize)> {
    let (row, col) = match addr {
        CellAddress::Id { row_id, col_key } => {
            (space.row_index(*row_id)?, space.col_index(col_key)?)
        }
        CellAddress::Index { row, col } => (*row, *col),
        CellAddress::Reference(reference) => parse_reference(reference)?,
    };
    (row < space.row_count() && col < space.col_count()).then_some((row, col))
}

/// Parse `"B3"` into `(row, col)` = `(2, 1)`. Letters must precede digits.
pub fn parse_reference(reference: &str) -> Option<(usize, usize)> {
    let s = reference.trim();
    let mut col: usize = 0;
    let mut row: usize = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for ch in s.chars() {
        match ch {
            '$' => continue,
            c if c.is_ascii_alphabetic() => {
                if saw_row {
                    return None;
                }
                let v = (c.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
                col = col.checked_mul(26)?.checked_add(v)?;
                saw_col = true;
            }
            c if c.is_ascii_digit() => {
                if !saw_col {
                    return None;
                }
                row = row.checked_mul(10)?.checked_add(c as usize - '0' as usize)?;
                saw_row = true;
            }
            _ => return None,
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Column letters for a 0-based index: 0 → `A`, 26 → `AA`.
pub fn column_letters(col: usize) -> String {
    let mut n = col + 1;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
