//! Recording fakes for the editor's collaborators.
//!
//! Each fake shares its state through an `Rc<RefCell<..>>` handle so a test
//! can inspect or steer it after the controller has taken ownership.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use cellgrid_core::{CellValue, Column, ColumnType, RowData, RowId, Schema, SelectionRange};
use cellgrid_editor::{
    AdapterError, ClipboardBackend, ClipboardContents, ClipboardError, ControlFactory, ControlKind,
    EditorControl, GridController, HitTarget, HitZone, PointerEvent, Rect, RenderError,
    RenderSurface, ServerAdapter, ServerEventSink, Viewport,
};
use cellgrid_engine::DataModel;
use cellgrid_io::ClipboardPayload;
use cellgrid_protocol::{Command, InitialPayload, ServerEvent, User};
use chrono::{DateTime, Utc};

pub const ROW_H: f32 = 20.0;
pub const COL_W: f32 = 100.0;
/// Pointer x at or beyond this is the fill handle
pub const FILL_HANDLE_X: f32 = 10_000.0;

// ============================================================================
// Surface
// ============================================================================

#[derive(Debug, Default)]
pub struct SurfaceState {
    pub rows: Vec<RowId>,
    pub cols: Vec<String>,
    pub first_row: usize,
    pub renders: usize,
    pub fail_render: bool,
    pub mounted: bool,
    pub destroyed: bool,
    pub active: Option<(RowId, String)>,
    pub selection: Vec<SelectionRange>,
}

/// Cells are `COL_W` x `ROW_H`; negative x is the row header, negative y
/// the column header.
#[derive(Clone, Default)]
pub struct MockSurface(pub Rc<RefCell<SurfaceState>>);

impl MockSurface {
    pub fn sync_rows(&self, model: &DataModel) {
        let mut s = self.0.borrow_mut();
        s.rows = model.rows().iter().map(|r| r.id).collect();
        s.cols = model.schema().keys().map(str::to_string).collect();
    }
}

impl RenderSurface for MockSurface {
    fn mount(&mut self) -> Result<(), RenderError> {
        self.0.borrow_mut().mounted = true;
        Ok(())
    }

    fn render(&mut self, viewport: &Viewport) -> Result<(), RenderError> {
        let mut s = self.0.borrow_mut();
        s.first_row = viewport.first_row;
        if s.fail_render {
            return Err(RenderError::Failed("canvas lost".into()));
        }
        s.renders += 1;
        Ok(())
    }

    fn destroy(&mut self) {
        self.0.borrow_mut().destroyed = true;
    }

    fn hit_test(&self, event: &PointerEvent) -> Option<HitTarget> {
        let s = self.0.borrow();
        let rect = Rect::new(event.x, event.y, COL_W, ROW_H);
        let row = || {
            let r = s.first_row + (event.y / ROW_H).floor() as usize;
            s.rows.get(r).copied()
        };
        let col = || s.cols.get((event.x / COL_W).floor() as usize).cloned();
        if event.x >= FILL_HANDLE_X {
            return Some(HitTarget { zone: HitZone::FillHandle, row_id: None, col_key: None, rect });
        }
        if event.x < 0.0 {
            return Some(HitTarget { zone: HitZone::RowHeader, row_id: Some(row()?), col_key: None, rect });
        }
        if event.y < 0.0 {
            return Some(HitTarget { zone: HitZone::ColumnHeader, row_id: None, col_key: Some(col()?), rect });
        }
        Some(HitTarget::cell(row()?, col()?, rect))
    }

    fn set_active_cell(&mut self, cell: Option<(RowId, &str)>) {
        self.0.borrow_mut().active = cell.map(|(id, key)| (id, key.to_string()));
    }

    fn set_selection(&mut self, ranges: &[SelectionRange]) {
        self.0.borrow_mut().selection = ranges.to_vec();
    }

    fn viewport_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, 400.0, 200.0)
    }
}

/// Pointer over a visible cell, with the viewport at the top.
pub fn cell_point(row: usize, col: usize) -> PointerEvent {
    PointerEvent::at(col as f32 * COL_W + COL_W / 2.0, row as f32 * ROW_H + ROW_H / 2.0)
}

pub fn row_header_point(row: usize) -> PointerEvent {
    PointerEvent::at(-10.0, row as f32 * ROW_H + ROW_H / 2.0)
}

pub fn col_header_point(col: usize) -> PointerEvent {
    PointerEvent::at(col as f32 * COL_W + COL_W / 2.0, -10.0)
}

pub fn fill_handle_point() -> PointerEvent {
    PointerEvent::at(FILL_HANDLE_X, 0.0)
}

// ============================================================================
// Controls
// ============================================================================

#[derive(Debug, Default)]
pub struct ControlState {
    pub text: String,
    pub checked: Option<bool>,
    /// (column key, kind, initial text) per created control
    pub created: Vec<(String, ControlKind, String)>,
    pub destroyed: usize,
    pub newlines: usize,
}

#[derive(Clone, Default)]
pub struct MockControls(pub Rc<RefCell<ControlState>>);

impl MockControls {
    pub fn type_text(&self, text: &str) {
        self.0.borrow_mut().text = text.to_string();
    }
}

struct MockControl {
    kind: ControlKind,
    state: Rc<RefCell<ControlState>>,
}

impl EditorControl for MockControl {
    fn kind(&self) -> ControlKind {
        self.kind
    }

    fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    fn checked(&self) -> Option<bool> {
        self.state.borrow().checked
    }

    fn number(&self) -> Option<f64> {
        self.state.borrow().text.trim().parse().ok()
    }

    fn date(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.state.borrow().text.trim()).ok().map(|d| d.with_timezone(&Utc))
    }

    fn selected(&self) -> Option<String> {
        let text = self.state.borrow().text.clone();
        (!text.is_empty()).then_some(text)
    }

    fn insert_newline(&mut self) {
        let mut s = self.state.borrow_mut();
        s.text.push('\n');
        s.newlines += 1;
    }

    fn destroy(&mut self) {
        self.state.borrow_mut().destroyed += 1;
    }
}

impl ControlFactory for MockControls {
    fn create(&mut self, column: &Column, kind: ControlKind, initial: &str) -> Box<dyn EditorControl> {
        {
            let mut s = self.0.borrow_mut();
            s.text = initial.to_string();
            s.created.push((column.key.clone(), kind, initial.to_string()));
        }
        Box::new(MockControl { kind, state: Rc::clone(&self.0) })
    }
}

// ============================================================================
// Server adapter
// ============================================================================

#[derive(Default)]
pub struct AdapterState {
    pub initial: Option<InitialPayload>,
    pub locks: Vec<RowId>,
    pub unlocks: Vec<Vec<RowId>>,
    pub commits: Vec<Vec<Command>>,
    pub sink: Option<ServerEventSink>,
    pub fail_commit: bool,
    pub fail_lock: bool,
}

#[derive(Clone, Default)]
pub struct MockAdapter(pub Rc<RefCell<AdapterState>>);

impl MockAdapter {
    /// Push an event as the server would.
    pub fn push(&self, event: ServerEvent) {
        let mut s = self.0.borrow_mut();
        if let Some(sink) = s.sink.as_mut() {
            sink(event);
        }
    }
}

impl ServerAdapter for MockAdapter {
    fn fetch_initial(&mut self) -> Result<InitialPayload, AdapterError> {
        self.0
            .borrow_mut()
            .initial
            .take()
            .ok_or_else(|| AdapterError::Unavailable("no initial payload".into()))
    }

    fn lock_row(&mut self, row_id: RowId, _user: &User) -> Result<(), AdapterError> {
        let mut s = self.0.borrow_mut();
        if s.fail_lock {
            return Err(AdapterError::Rejected("lock refused".into()));
        }
        s.locks.push(row_id);
        Ok(())
    }

    fn unlock_rows(&mut self, row_ids: &[RowId], _user: &User) -> Result<(), AdapterError> {
        self.0.borrow_mut().unlocks.push(row_ids.to_vec());
        Ok(())
    }

    fn commit(&mut self, commands: &[Command], _user: &User) -> Result<(), AdapterError> {
        let mut s = self.0.borrow_mut();
        if s.fail_commit {
            return Err(AdapterError::Unavailable("offline".into()));
        }
        s.commits.push(commands.to_vec());
        Ok(())
    }

    fn subscribe(&mut self, sink: ServerEventSink) -> Result<(), AdapterError> {
        self.0.borrow_mut().sink = Some(sink);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.0.borrow_mut().sink = None;
    }
}

// ============================================================================
// Clipboard
// ============================================================================

#[derive(Debug, Default)]
pub struct ClipboardState {
    pub contents: ClipboardContents,
    pub fail_write: bool,
    pub fail_read: bool,
    pub writes: usize,
}

#[derive(Clone, Default)]
pub struct MockClipboard(pub Rc<RefCell<ClipboardState>>);

impl ClipboardBackend for MockClipboard {
    fn write(&mut self, payload: &ClipboardPayload) -> Result<(), ClipboardError> {
        let mut s = self.0.borrow_mut();
        if s.fail_write {
            return Err(ClipboardError::Denied("no focus".into()));
        }
        s.writes += 1;
        s.contents = ClipboardContents { text: Some(payload.text.clone()), html: Some(payload.html.clone()) };
        Ok(())
    }

    fn read(&mut self) -> Result<ClipboardContents, ClipboardError> {
        let s = self.0.borrow();
        if s.fail_read {
            return Err(ClipboardError::Unavailable);
        }
        Ok(s.contents.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub struct Harness {
    pub grid: GridController,
    pub surface: MockSurface,
    pub controls: MockControls,
    pub adapter: MockAdapter,
    pub clipboard: MockClipboard,
}

impl Harness {
    /// Refresh the surface's row list after structural changes.
    pub fn sync(&self) {
        self.surface.sync_rows(self.grid.model());
    }

    pub fn value(&self, row: usize, key: &str) -> CellValue {
        let id = self.grid.model().row_id_at(row).expect("row exists");
        self.grid.model().get_cell(id, key).expect("cell exists")
    }

    pub fn raw(&self, row: usize, key: &str) -> CellValue {
        let id = self.grid.model().row_id_at(row).expect("row exists");
        self.grid.model().get_raw_cell(id, key).expect("cell exists")
    }

    pub fn row_id(&self, row: usize) -> RowId {
        self.grid.model().row_id_at(row).expect("row exists")
    }
}

/// Columns: name (text), qty (number), done (boolean), status (select),
/// note (text, wrapping).
pub fn schema() -> Schema {
    use cellgrid_core::SelectOption;
    Schema::new(vec![
        Column::new("name", ColumnType::Text),
        Column::new("qty", ColumnType::Number),
        Column::new("done", ColumnType::Boolean),
        Column::new("status", ColumnType::Select)
            .with_options(vec![SelectOption::new("open", "Open"), SelectOption::new("closed", "Closed")]),
        Column::new("note", ColumnType::Text).wrapping(),
    ])
    .expect("valid schema")
}

pub fn rows(n: usize) -> Vec<RowData> {
    (0..n)
        .map(|i| {
            RowData::keyed([
                ("name", CellValue::text(format!("item{i}"))),
                ("qty", CellValue::Number(i as f64)),
                ("done", CellValue::Bool(false)),
                ("status", CellValue::choice("open")),
                ("note", CellValue::Empty),
            ])
        })
        .collect()
}

pub fn harness_with(model: DataModel, configure: impl FnOnce(GridController) -> GridController) -> Harness {
    let surface = MockSurface::default();
    let controls = MockControls::default();
    let adapter = MockAdapter::default();
    let clipboard = MockClipboard::default();
    surface.sync_rows(&model);
    let grid = GridController::new(model, controls.clone())
        .with_surface(surface.clone())
        .with_adapter(adapter.clone())
        .with_clipboard(clipboard.clone())
        .with_user(User { id: "me".into(), name: "Me".into() });
    let mut grid = configure(grid);
    grid.mount();
    Harness { grid, surface, controls, adapter, clipboard }
}

pub fn harness(n: usize) -> Harness {
    harness_with(DataModel::new(schema()).with_data(rows(n)), |g| g)
}
