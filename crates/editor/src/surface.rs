//! Interfaces to the outside world.
//!
//! The controller never paints, never owns a widget and never talks to the
//! network itself. A host supplies these collaborators.

use cellgrid_core::{CellValue, Column, ColumnType, RowId, SelectionRange};
use cellgrid_io::ClipboardPayload;
use cellgrid_protocol::{Command, InitialPayload, ServerEvent, User};
use chrono::{DateTime, Utc};

use crate::errors::{AdapterError, ClipboardError, RenderError};

// ============================================================================
// Geometry and input
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Scroll position handed to the surface on every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub first_row: usize,
    pub visible_rows: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { first_row: 0, visible_rows: 20 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl on Windows/Linux, Cmd on macOS
    pub accel: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false, accel: false, alt: false };

    pub fn shift() -> Self {
        Self { shift: true, ..Self::NONE }
    }

    pub fn accel() -> Self {
        Self { accel: true, ..Self::NONE }
    }

    pub fn is_empty(&self) -> bool {
        !self.shift && !self.accel && !self.alt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn at(x: f32, y: f32) -> Self {
        Self { x, y, modifiers: Modifiers::NONE }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    F2,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Key is part of an IME composition
    pub is_composing: bool,
    pub timestamp_ms: u64,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key, modifiers: Modifiers::NONE, is_composing: false, timestamp_ms: 0 }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn composing(mut self) -> Self {
        self.is_composing = true;
        self
    }

    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

// ============================================================================
// Rendering surface
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitZone {
    Cell,
    RowHeader,
    ColumnHeader,
    /// The fill handle hot-zone at the bottom-right of the selection.
    FillHandle,
}

/// What lies under a pointer. Row headers carry no column; column headers
/// carry no row.
#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    pub zone: HitZone,
    pub row_id: Option<RowId>,
    pub col_key: Option<String>,
    pub rect: Rect,
}

impl HitTarget {
    pub fn cell(row_id: RowId, col_key: impl Into<String>, rect: Rect) -> Self {
        Self { zone: HitZone::Cell, row_id: Some(row_id), col_key: Some(col_key.into()), rect }
    }
}

pub trait RenderSurface {
    fn mount(&mut self) -> Result<(), RenderError>;
    fn render(&mut self, viewport: &Viewport) -> Result<(), RenderError>;
    fn destroy(&mut self);
    fn hit_test(&self, event: &PointerEvent) -> Option<HitTarget>;
    fn set_active_cell(&mut self, cell: Option<(RowId, &str)>);
    fn set_selection(&mut self, ranges: &[SelectionRange]);
    /// Visible grid area, in the same coordinates as pointer events.
    fn viewport_rect(&self) -> Rect;
}

// ============================================================================
// Editor controls
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Checkbox,
    Number,
    Date,
    Time,
    DateTime,
    Select,
    Tags,
    Text,
    MultilineText,
}

impl ControlKind {
    /// Control for a column. Text falls back to multi-line for wrapping
    /// columns or values with embedded newlines.
    pub fn for_column(column_type: ColumnType, multiline: bool) -> Self {
        match column_type {
            ColumnType::Boolean => ControlKind::Checkbox,
            ColumnType::Number => ControlKind::Number,
            ColumnType::Date => ControlKind::Date,
            ColumnType::Time => ControlKind::Time,
            ColumnType::DateTime => ControlKind::DateTime,
            ColumnType::Select => ControlKind::Select,
            ColumnType::Tags => ControlKind::Tags,
            ColumnType::Text if multiline => ControlKind::MultilineText,
            ColumnType::Text => ControlKind::Text,
        }
    }

    /// Controls that commit on their native change event.
    pub fn commits_on_change(self) -> bool {
        matches!(
            self,
            ControlKind::Checkbox
                | ControlKind::Number
                | ControlKind::Date
                | ControlKind::Time
                | ControlKind::DateTime
                | ControlKind::Select
        )
    }
}

/// A live editor widget. Typed accessors return `None` when the control
/// does not hold a value of that type (or holds an unparsable one).
pub trait EditorControl {
    fn kind(&self) -> ControlKind;
    /// Raw text content
    fn text(&self) -> String;
    fn checked(&self) -> Option<bool> {
        None
    }
    fn number(&self) -> Option<f64> {
        None
    }
    fn date(&self) -> Option<DateTime<Utc>> {
        None
    }
    /// Selected option value
    fn selected(&self) -> Option<String> {
        None
    }
    fn tags(&self) -> Option<Vec<String>> {
        None
    }
    fn insert_newline(&mut self) {}
    fn focus(&mut self) {}
    fn destroy(&mut self) {}
}

pub trait ControlFactory {
    /// Create a control for `column`, seeded with `initial`.
    fn create(&mut self, column: &Column, kind: ControlKind, initial: &str) -> Box<dyn EditorControl>;
}

/// Read a control back into a cell value for `column`.
pub(crate) fn read_control(control: &dyn EditorControl, column: &Column) -> CellValue {
    let text = control.text();
    let cleared = column.column_type.cleared_value();
    let blank = text.trim().is_empty();
    match column.column_type {
        ColumnType::Boolean => control.checked().map_or(cleared, CellValue::Bool),
        ColumnType::Number => match control.number() {
            Some(n) => CellValue::Number(n),
            None if blank => cleared,
            None => CellValue::Text(text),
        },
        ColumnType::Date | ColumnType::Time | ColumnType::DateTime => match control.date() {
            Some(d) => CellValue::Date(d),
            None if blank => cleared,
            None => CellValue::Text(text),
        },
        ColumnType::Select => match control.selected() {
            Some(value) if !value.is_empty() => {
                let label = column.option_label(&value).map(str::to_string);
                CellValue::Choice { value, label }
            }
            _ => cleared,
        },
        ColumnType::Tags => {
            let tags = control.tags().unwrap_or_else(|| {
                text.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect()
            });
            if tags.is_empty() { cleared } else { CellValue::Tags(tags) }
        }
        ColumnType::Text if text.is_empty() => cleared,
        ColumnType::Text => CellValue::Text(text),
    }
}

// ============================================================================
// Server adapter
// ============================================================================

/// Receives events pushed by the server.
pub type ServerEventSink = Box<dyn FnMut(ServerEvent)>;

/// Optional network collaborator. Calls dispatch and return without waiting
/// for the server; an `Err` means the request could not be sent. Failures
/// the adapter learns about later are reported through
/// `GridController::report_error`.
pub trait ServerAdapter {
    fn fetch_initial(&mut self) -> Result<InitialPayload, AdapterError>;
    fn lock_row(&mut self, row_id: RowId, user: &User) -> Result<(), AdapterError>;
    fn unlock_rows(&mut self, row_ids: &[RowId], user: &User) -> Result<(), AdapterError>;
    fn commit(&mut self, commands: &[Command], user: &User) -> Result<(), AdapterError>;
    fn subscribe(&mut self, sink: ServerEventSink) -> Result<(), AdapterError>;
    fn unsubscribe(&mut self) {}
}

// ============================================================================
// Clipboard
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardContents {
    pub text: Option<String>,
    pub html: Option<String>,
}

impl ClipboardContents {
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, str::is_empty) && self.html.as_deref().map_or(true, str::is_empty)
    }
}

pub trait ClipboardBackend {
    fn write(&mut self, payload: &ClipboardPayload) -> Result<(), ClipboardError>;
    fn read(&mut self) -> Result<ClipboardContents, ClipboardError>;
}
