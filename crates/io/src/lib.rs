// Clipboard grid codec

pub mod clipboard;
pub mod html;

pub use clipboard::{
    coerce_pasted, encode_grid, parse_clipboard, parse_text, paste_plan, serialize_text,
    stringify_cell, ClipboardPayload, PastePlan, StringGrid,
};
pub use html::{parse_html, serialize_html};
