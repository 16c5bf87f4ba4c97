//! HTML table side of the clipboard codec.
//!
//! Spreadsheets and browsers put an HTML table on the clipboard next to the
//! plain text. Reading it is preferred because cell boundaries survive
//! intact. Tables with merged cells (rowspan/colspan > 1) have no
//! unambiguous grid shape and are rejected.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::clipboard::{rectangular, StringGrid};

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::error!("clipboard html pattern failed to compile: {e}");
            None
        }
    })
    .as_ref()
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> Option<&'static Regex> {
            static RE: OnceLock<Option<Regex>> = OnceLock::new();
            cached(&RE, $re)
        }
    };
}

pattern!(table_re, r"(?is)<table\b[^>]*>(.*?)</table\s*>");
pattern!(row_re, r"(?is)<tr\b[^>]*>(.*?)</tr\s*>");
pattern!(cell_re, r"(?is)<t[dh]\b([^>]*)>(.*?)</t[dh]\s*>");
pattern!(span_re, r#"(?i)\b(?:rowspan|colspan)\s*=\s*["']?\s*(\d+)"#);
pattern!(space_re, r"[ \t\r\n]+");
pattern!(br_re, r"(?i)<br\s*/?>");
pattern!(tag_re, r"(?s)<[^>]*>");
pattern!(entity_re, r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);");

// ============================================================================
// Decoding
// ============================================================================

/// Parse the first table in `html` into a grid.
pub fn parse_html(html: &str) -> Option<StringGrid> {
    let table = table_re()?.captures(html)?.get(1)?.as_str();

    let mut grid = Vec::new();
    for row in row_re()?.captures_iter(table) {
        let row_html = row.get(1).map_or("", |m| m.as_str());
        let mut cells = Vec::new();
        for cell in cell_re()?.captures_iter(row_html) {
            let attrs = cell.get(1).map_or("", |m| m.as_str());
            if has_span(attrs)? {
                log::debug!("clipboard html has merged cells, falling back to text");
                return None;
            }
            cells.push(cell_text(cell.get(2).map_or("", |m| m.as_str()))?);
        }
        grid.push(cells);
    }

    rectangular(grid)
}

fn has_span(attrs: &str) -> Option<bool> {
    Some(
        span_re()?
            .captures_iter(attrs)
            .any(|c| c[1].parse::<u32>().map_or(false, |n| n > 1)),
    )
}

/// Literal whitespace collapses and is trimmed per line. Entity-encoded
/// whitespace (`&nbsp;`, `&#9;`) is decoded after that and survives.
fn cell_text(inner: &str) -> Option<String> {
    let collapsed = space_re()?.replace_all(inner, " ");
    let broken = br_re()?.replace_all(&collapsed, "\n");
    let stripped = tag_re()?.replace_all(&broken, "");
    let trimmed: Vec<&str> = stripped.split('\n').map(|l| l.trim_matches(' ')).collect();
    decode_entities(&trimmed.join("\n"))
}

fn decode_entities(text: &str) -> Option<String> {
    let decoded = entity_re()?.replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        let ch = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = name.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => None,
            }
        };
        ch.map_or_else(|| caps[0].to_string(), String::from)
    });
    Some(decoded.into_owned())
}

// ============================================================================
// Encoding
// ============================================================================

/// Escape cell text for a `<td>`. Spaces a reader would collapse or trim
/// (leading, trailing, or following another space) become `&nbsp;` and
/// tabs become `&#9;`.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ' ' => {
                let at_edge = matches!(prev, None | Some(' ' | '\n'))
                    || matches!(chars.peek(), None | Some('\n' | '\r'));
                out.push_str(if at_edge { "&nbsp;" } else { " " });
            }
            '\t' => out.push_str("&#9;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("<br>"),
            '\r' => {}
            _ => out.push(c),
        }
        if c != '\r' {
            prev = Some(c);
        }
    }
    out
}

pub fn serialize_html(grid: &[Vec<String>]) -> String {
    let mut html = String::from("<table><tbody>");
    for row in grid {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&escape_html(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}
