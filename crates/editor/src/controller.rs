use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use cellgrid_config::{CommitMode, GridSettings};
use cellgrid_core::{Column, RowId, Selection};
use cellgrid_engine::{apply_forward, CommandQueue, DataModel, Replayed, SequenceRegistry};
use cellgrid_io::ClipboardPayload;
use cellgrid_protocol::{Command, CommandKind, ServerEvent, User};
use rustc_hash::FxHashMap;

use crate::editing::ActiveEditor;
use crate::errors::{ErrorScope, ScopedErrors};
use crate::mode::{FillDrag, Mode, RangeDrag};
use crate::surface::{
    ClipboardBackend, ControlFactory, PointerEvent, RenderSurface, ServerAdapter, Viewport,
};

/// The interactive grid: selection, editor lifecycle, fill, clipboard and
/// history, over one `DataModel`.
pub struct GridController {
    pub(crate) model: DataModel,
    pub(crate) history: CommandQueue,
    pub(crate) registry: SequenceRegistry,
    pub(crate) settings: GridSettings,

    // Selection state
    pub(crate) selection: Selection,
    pub(crate) active: Option<(usize, usize)>,
    /// Moving end of a keyboard or shift-click extension; the active cell
    /// stays the anchor.
    pub(crate) extend_end: Option<(usize, usize)>,

    // At most one of each
    pub(crate) editor: Option<ActiveEditor>,
    pub(crate) fill_drag: Option<FillDrag>,
    pub(crate) range_drag: Option<RangeDrag>,
    pub(crate) last_pointer: Option<PointerEvent>,

    pub(crate) viewport: Viewport,
    /// Caller-owned view state (sort, filters), opaque to the grid
    pub(crate) view: serde_json::Value,
    pub(crate) user: User,
    /// Rows other users are editing
    pub(crate) remote_locks: FxHashMap<RowId, User>,
    /// Row our open editor has locked
    pub(crate) locked_row: Option<RowId>,
    pub(crate) errors: ScopedErrors,
    pub(crate) internal_clipboard: Option<ClipboardPayload>,
    pub(crate) composition_ended_at: Option<u64>,
    pub(crate) inbox: Rc<RefCell<VecDeque<ServerEvent>>>,
    pub(crate) destroyed: bool,

    // Collaborators
    pub(crate) surface: Option<Box<dyn RenderSurface>>,
    pub(crate) controls: Box<dyn ControlFactory>,
    pub(crate) adapter: Option<Box<dyn ServerAdapter>>,
    pub(crate) clipboard: Option<Box<dyn ClipboardBackend>>,
}

impl GridController {
    pub fn new(model: DataModel, controls: impl ControlFactory + 'static) -> Self {
        let settings = GridSettings::default();
        Self {
            model,
            history: CommandQueue::with_capacity(settings.history_capacity),
            registry: SequenceRegistry::builtin().with_languages(settings.fill_languages.clone()),
            settings,
            selection: Selection::new(),
            active: None,
            extend_end: None,
            editor: None,
            fill_drag: None,
            range_drag: None,
            last_pointer: None,
            viewport: Viewport::default(),
            view: serde_json::Value::Null,
            user: User::default(),
            remote_locks: FxHashMap::default(),
            locked_row: None,
            errors: ScopedErrors::new(),
            internal_clipboard: None,
            composition_ended_at: None,
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            destroyed: false,
            surface: None,
            controls: Box::new(controls),
            adapter: None,
            clipboard: None,
        }
    }

    /// Apply settings. Resets the history to the configured capacity.
    pub fn with_settings(mut self, settings: GridSettings) -> Self {
        self.history = CommandQueue::with_capacity(settings.history_capacity);
        self.registry = std::mem::take(&mut self.registry).with_languages(settings.fill_languages.clone());
        self.settings = settings;
        self
    }

    /// Replace the sequence registry. Language preference from the current
    /// settings is applied to it.
    pub fn with_registry(mut self, registry: SequenceRegistry) -> Self {
        self.registry = registry.with_languages(self.settings.fill_languages.clone());
        self
    }

    pub fn with_surface(mut self, surface: impl RenderSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    pub fn with_adapter(mut self, adapter: impl ServerAdapter + 'static) -> Self {
        self.adapter = Some(Box::new(adapter));
        self
    }

    pub fn with_clipboard(mut self, clipboard: impl ClipboardBackend + 'static) -> Self {
        self.clipboard = Some(Box::new(clipboard));
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = user;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn model(&self) -> &DataModel {
        &self.model
    }

    /// Direct model access for host setup. Mutations made here bypass the
    /// history.
    pub fn model_mut(&mut self) -> &mut DataModel {
        &mut self.model
    }

    pub fn history(&self) -> &CommandQueue {
        &self.history
    }

    pub fn registry(&self) -> &SequenceRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_cell(&self) -> Option<(usize, usize)> {
        self.active
    }

    pub fn mode(&self) -> Mode {
        if self.editor.is_some() {
            Mode::Editing
        } else if self.fill_drag.is_some() {
            Mode::FillDragging
        } else if self.range_drag.is_some() {
            Mode::RangeDragging
        } else if self.active.is_some() {
            Mode::Selection
        } else {
            Mode::Idle
        }
    }

    pub fn errors(&self) -> &ScopedErrors {
        &self.errors
    }

    pub fn view(&self) -> &serde_json::Value {
        &self.view
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.render();
    }

    /// Who holds a remote lock on `row_id`.
    pub fn remote_lock(&self, row_id: RowId) -> Option<&User> {
        self.remote_locks.get(&row_id)
    }

    /// Record a failure the host learned about after the fact (for example
    /// a late commit rejection from the server).
    pub fn report_error(&mut self, scope: ErrorScope, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{scope:?}: {message}");
        self.errors.set(scope, message);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn mount(&mut self) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        if let Err(e) = surface.mount() {
            log::error!("mount failed: {e}");
            self.errors.set(ErrorScope::Render, e.to_string());
            return false;
        }
        self.refresh();
        true
    }

    /// Render the current viewport. A failure parks a render error; the
    /// next successful render clears it.
    pub fn render(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        match surface.render(&self.viewport) {
            Ok(()) => {
                self.errors.clear(ErrorScope::Render);
                true
            }
            Err(e) => {
                log::error!("render failed: {e}");
                self.errors.set(ErrorScope::Render, e.to_string());
                false
            }
        }
    }

    /// Tear down: stops drags and auto-scroll, closes the editor, drops the
    /// server subscription and destroys the surface. Further input is
    /// ignored.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.fill_drag = None;
        self.range_drag = None;
        self.last_pointer = None;
        self.cancel_editor();
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.unsubscribe();
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.destroy();
        }
        self.destroyed = true;
        log::debug!("grid destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    pub(crate) fn col_count(&self) -> usize {
        self.model.schema().len()
    }

    pub(crate) fn column_at(&self, col: usize) -> Option<&Column> {
        self.model.schema().column_at(col)
    }

    pub(crate) fn cell_id(&self, row: usize, col: usize) -> Option<(RowId, String)> {
        let row_id = self.model.row_id_at(row)?;
        let key = self.column_at(col)?.key.clone();
        Some((row_id, key))
    }

    pub(crate) fn writes_committed(&self) -> bool {
        self.settings.commit_mode == CommitMode::Direct
    }

    pub(crate) fn new_batch_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Push selection state to the surface and re-render.
    pub(crate) fn refresh(&mut self) {
        if self.destroyed {
            return;
        }
        let active = self.active.and_then(|(row, col)| self.cell_id(row, col));
        if let Some(surface) = self.surface.as_mut() {
            surface.set_active_cell(active.as_ref().map(|(id, key)| (*id, key.as_str())));
            surface.set_selection(self.selection.ranges());
        }
        self.render();
    }

    /// Keep selection and active cell inside the grid after a structural
    /// change.
    pub(crate) fn clamp_to_model(&mut self) {
        let rows = self.model.row_count();
        let cols = self.col_count();
        self.selection.clamp_rows(rows);
        if rows == 0 || cols == 0 {
            self.active = None;
            self.extend_end = None;
            self.selection.clear();
            return;
        }
        let clamp = |(r, c): (usize, usize)| (r.min(rows - 1), c.min(cols - 1));
        self.active = self.active.map(clamp);
        self.extend_end = self.extend_end.map(clamp);
    }

    /// Apply commands forward, then record them.
    pub(crate) fn execute(&mut self, commands: Vec<Command>) {
        if commands.is_empty() {
            self.refresh();
            return;
        }
        let commands: Vec<Command> = commands.into_iter().map(|cmd| self.mark_unset(cmd)).collect();
        let committed = self.writes_committed();
        let mut view = None;
        self.model.batch_update(|model| {
            for cmd in &commands {
                if let Replayed::View(next) = apply_forward(model, cmd, committed) {
                    view = Some(next);
                }
            }
        });
        if let Some(view) = view {
            self.view = view;
        }
        self.record(commands);
    }

    /// Flag an edit whose key the row does not hold yet, so undo removes
    /// the key instead of writing an empty value.
    fn mark_unset(&self, cmd: Command) -> Command {
        match (cmd.kind, cmd.row_id, cmd.col_key.as_deref()) {
            (CommandKind::Edit, Some(row_id), Some(key)) if self.model.is_unset(row_id, key) => cmd.with_prev_unset(),
            _ => cmd,
        }
    }

    /// Enqueue commands that have already been applied.
    pub(crate) fn record(&mut self, commands: Vec<Command>) {
        log::debug!(
            "recording {} command(s), batch {:?}",
            commands.len(),
            commands.first().and_then(|c| c.batch_id())
        );
        self.forward_to_server(commands.clone());
        for cmd in commands {
            self.history.enqueue(cmd);
        }
        self.clamp_to_model();
        self.refresh();
    }

    /// Send applied commands to the adapter. In deferred mode edits wait for
    /// `flush_pending`; structural commands always go out, without the
    /// overlay entries a deleted row carries.
    pub(crate) fn forward_to_server(&mut self, mut commands: Vec<Command>) {
        if !self.writes_committed() {
            commands.retain(|c| c.kind != CommandKind::Edit);
        }
        let commands: Vec<Command> = commands.iter().map(Command::without_pending).collect();
        self.send_to_server(&commands);
    }

    pub(crate) fn send_to_server(&mut self, commands: &[Command]) {
        if commands.is_empty() {
            return;
        }
        let Some(adapter) = self.adapter.as_mut() else {
            return;
        };
        match adapter.commit(commands, &self.user) {
            Ok(()) => {
                self.errors.clear(ErrorScope::Commit);
            }
            Err(e) => {
                log::warn!("commit of {} command(s) failed: {e}", commands.len());
                self.errors.set(ErrorScope::Commit, e.to_string());
            }
        }
    }
}

impl std::fmt::Debug for GridController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridController")
            .field("mode", &self.mode())
            .field("active", &self.active)
            .field("selection", &self.selection)
            .field("rows", &self.model.row_count())
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}
