//! Text grid encoding and paste coercion.
//!
//! Copy turns a rectangular block of cells into a `StringGrid`, then into
//! tab/newline-delimited text (cells containing tabs, newlines or quotes
//! are quoted, TSV convention) plus an HTML table. Paste goes the other
//! way: HTML is preferred when it holds an unambiguous table, otherwise
//! the text is split. Unrecognized input yields `None`, never an error.

use cellgrid_core::{CellValue, Column, ColumnType};
use chrono::SecondsFormat;

use crate::html;

/// Rectangular grid of cell strings, row-major.
pub type StringGrid = Vec<Vec<String>>;

/// What copy writes to the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub text: String,
    pub html: String,
}

// ============================================================================
// Stringification
// ============================================================================

/// Clipboard text for one cell. `column` supplies option labels for
/// Choice values that carry none.
pub fn stringify_cell(value: &CellValue, column: Option<&Column>) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => canonical_number(*n),
        CellValue::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
        CellValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
        CellValue::Choice { value, label } => label
            .clone()
            .or_else(|| column.and_then(|c| c.option_label(value)).map(str::to_string))
            .unwrap_or_else(|| value.clone()),
        CellValue::Tags(tags) => tags.join(", "),
    }
}

/// Decimal form without exponent; `-0` prints as `0`.
pub fn canonical_number(n: f64) -> String {
    if !n.is_finite() {
        if n.is_nan() {
            return "NaN".to_string();
        }
        return if n > 0.0 { "INF".to_string() } else { "-INF".to_string() };
    }

    let n0 = if n == 0.0 { 0.0 } else { n };

    // Integer fast path: no decimal point needed
    if n0.fract() == 0.0 && n0.abs() < 9e15 {
        format!("{:.0}", n0)
    } else {
        // Fixed precision (15 decimals), trim trailing zeros
        let mut s = format!("{:.15}", n0);
        while s.contains('.') && s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        s
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Quote a cell if it contains a tab, newline or quote, doubling inner quotes.
fn escape_cell(value: &str) -> String {
    let needs_quoting = value.contains('\t') || value.contains('\n') || value.contains('\r') || value.contains('"');
    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Tab-delimited cells, newline-delimited rows, no trailing newline.
pub fn serialize_text(grid: &[Vec<String>]) -> String {
    grid.iter()
        .map(|row| row.iter().map(|c| escape_cell(c)).collect::<Vec<_>>().join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn encode_grid(grid: &[Vec<String>]) -> ClipboardPayload {
    ClipboardPayload {
        text: serialize_text(grid),
        html: html::serialize_html(grid),
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Pad every row to the widest row.
pub(crate) fn rectangular(mut grid: StringGrid) -> Option<StringGrid> {
    let width = grid.iter().map(Vec::len).max()?;
    if width == 0 {
        return None;
    }
    for row in grid.iter_mut() {
        row.resize(width, String::new());
    }
    Some(grid)
}

/// Split clipboard text into a grid. Quoted cells may contain tabs and
/// newlines; unquoted input is split directly so blank lines survive as
/// empty rows.
pub fn parse_text(text: &str) -> Option<StringGrid> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let body = normalized.strip_suffix('\n').unwrap_or(&normalized);
    if body.is_empty() {
        return None;
    }

    if !body.contains('"') {
        let grid = body
            .split('\n')
            .map(|line| line.split('\t').map(str::to_string).collect())
            .collect();
        return rectangular(grid);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => grid.push(record.iter().map(str::to_string).collect()),
            Err(e) => {
                log::warn!("ignoring malformed clipboard text: {e}");
                return None;
            }
        }
    }
    rectangular(grid)
}

/// Decode a paste. An HTML table wins when present and unambiguous;
/// otherwise the plain text is used.
pub fn parse_clipboard(text: Option<&str>, html: Option<&str>) -> Option<StringGrid> {
    html.and_then(html::parse_html).or_else(|| text.and_then(parse_text))
}

// ============================================================================
// Paste
// ============================================================================

/// Convert one pasted string for a column type. Blank input clears.
/// Numbers that do not parse, and booleans outside the recognized words,
/// stay as text.
pub fn coerce_pasted(text: &str, column_type: ColumnType) -> CellValue {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    match column_type {
        ColumnType::Number => match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::text(text),
        },
        ColumnType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => CellValue::Bool(true),
            "false" | "0" | "no" => CellValue::Bool(false),
            _ => CellValue::text(text),
        },
        _ => CellValue::text(text),
    }
}

/// Target rectangle of a paste, clipped to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PastePlan {
    pub start_row: usize,
    pub start_col: usize,
    pub rows: usize,
    pub cols: usize,
}

pub fn paste_plan(
    grid: &[Vec<String>],
    anchor: (usize, usize),
    row_count: usize,
    col_count: usize,
) -> Option<PastePlan> {
    let (start_row, start_col) = anchor;
    let src_cols = grid.iter().map(Vec::len).max().unwrap_or(0);
    let rows = grid.len().min(row_count.saturating_sub(start_row));
    let cols = src_cols.min(col_count.saturating_sub(start_col));
    (rows > 0 && cols > 0).then_some(PastePlan { start_row, start_col, rows, cols })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgrid_core::SelectOption;
    use chrono::{TimeZone, Utc};

    fn grid(rows: &[&[&str]]) -> StringGrid {
        rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect()
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify_cell(&CellValue::Bool(true), None), "TRUE");
        assert_eq!(stringify_cell(&CellValue::Number(3.0), None), "3");
        assert_eq!(stringify_cell(&CellValue::Number(-0.0), None), "0");
        assert_eq!(stringify_cell(&CellValue::Number(0.25), None), "0.25");
        assert_eq!(stringify_cell(&CellValue::Tags(vec!["a".into(), "b".into()]), None), "a, b");
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(stringify_cell(&CellValue::Date(date), None), "2024-03-01T12:00:00.000Z");
    }

    #[test]
    fn test_stringify_choice_uses_label() {
        let col = Column::new("s", ColumnType::Select).with_options(vec![SelectOption::new("hi", "High")]);
        assert_eq!(stringify_cell(&CellValue::choice("hi"), Some(&col)), "High");
        assert_eq!(stringify_cell(&CellValue::choice("hi"), None), "hi");
        let labelled = CellValue::Choice { value: "x".into(), label: Some("Ex".into()) };
        assert_eq!(stringify_cell(&labelled, Some(&col)), "Ex");
    }

    #[test]
    fn test_numeric_grid_roundtrip() {
        let g = grid(&[&["1", "2.5"], &["-3", "4"]]);
        let text = serialize_text(&g);
        assert_eq!(text, "1\t2.5\n-3\t4");
        assert_eq!(parse_text(&text), Some(g));
    }

    #[test]
    fn test_quoted_cells_roundtrip() {
        let g = grid(&[&["line1\nline2", "say \"hi\""], &["a\tb", ""]]);
        let text = serialize_text(&g);
        assert_eq!(parse_text(&text), Some(g));
    }

    #[test]
    fn test_own_copy_keeps_whitespace() {
        let g = grid(&[&["a  b ", " lead", "x\ty"], &["trail  ", "", "in  side"]]);
        let payload = encode_grid(&g);
        assert_eq!(parse_clipboard(Some(&payload.text), Some(&payload.html)), Some(g));
    }

    #[test]
    fn test_parse_text_shapes() {
        assert_eq!(parse_text("7\n8"), Some(grid(&[&["7"], &["8"]])));
        assert_eq!(parse_text("7\r\n8\r\n"), Some(grid(&[&["7"], &["8"]])));
        assert_eq!(parse_text("a\tb\nc"), Some(grid(&[&["a", "b"], &["c", ""]])));
        assert_eq!(parse_text("x\n\ny"), Some(grid(&[&["x"], &[""], &["y"]])));
        assert_eq!(parse_text(""), None);
        assert_eq!(parse_text("\n"), None);
    }

    #[test]
    fn test_parse_clipboard_prefers_html() {
        let html = "<table><tr><td>h</td></tr></table>";
        assert_eq!(parse_clipboard(Some("t"), Some(html)), Some(grid(&[&["h"]])));
        assert_eq!(parse_clipboard(Some("t"), Some("<p>no table</p>")), Some(grid(&[&["t"]])));
        assert_eq!(parse_clipboard(None, None), None);
    }

    #[test]
    fn test_coerce_pasted() {
        assert_eq!(coerce_pasted("7", ColumnType::Number), CellValue::Number(7.0));
        assert_eq!(coerce_pasted(" 2.5 ", ColumnType::Number), CellValue::Number(2.5));
        assert_eq!(coerce_pasted("abc", ColumnType::Number), CellValue::text("abc"));
        assert_eq!(coerce_pasted("inf", ColumnType::Number), CellValue::text("inf"));
        assert_eq!(coerce_pasted("YES", ColumnType::Boolean), CellValue::Bool(true));
        assert_eq!(coerce_pasted("0", ColumnType::Boolean), CellValue::Bool(false));
        assert_eq!(coerce_pasted("maybe", ColumnType::Boolean), CellValue::text("maybe"));
        assert_eq!(coerce_pasted("42", ColumnType::Text), CellValue::text("42"));
        assert_eq!(coerce_pasted("  ", ColumnType::Number), CellValue::Empty);
    }

    #[test]
    fn test_paste_plan_clips() {
        let g = grid(&[&["a", "b", "c"], &["d", "e", "f"]]);
        assert_eq!(
            paste_plan(&g, (9, 1), 10, 3),
            Some(PastePlan { start_row: 9, start_col: 1, rows: 1, cols: 2 })
        );
        assert_eq!(paste_plan(&g, (10, 0), 10, 3), None);
    }
}
