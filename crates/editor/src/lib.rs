//! Selection & editing engine.
//!
//! `GridController` owns the selection, the active cell and at most one open
//! editor. It turns pointer and keyboard input (already hit-tested by a
//! `RenderSurface`) into selection changes and `Command`s, applies them to
//! the `DataModel` and records them in the `CommandQueue`.
//!
//! The controller is split across modules by concern, each adding methods
//! to the same type:
//!
//! - `navigation`: pointer gestures, keyboard dispatch, selection moves
//! - `editing`: editor lifecycle, commit routing, boolean toggles
//! - `fill`: the fill handle and drag-to-fill
//! - `clipboard`: copy, cut and paste
//! - `undo_redo`: history replay and row/view commands
//! - `sync`: server adapter plumbing
//! - `autoscroll`: edge scrolling while dragging

mod autoscroll;
mod clipboard;
mod controller;
mod editing;
pub mod errors;
mod fill;
pub mod mode;
mod navigation;
pub mod surface;
mod sync;
mod undo_redo;

pub use controller::GridController;
pub use errors::{AdapterError, ClipboardError, ErrorScope, RenderError, ScopedErrors};
pub use mode::{FillDrag, Mode};
pub use surface::{
    ClipboardBackend, ClipboardContents, ControlFactory, ControlKind, EditorControl, HitTarget,
    HitZone, Key, KeyEvent, Modifiers, PointerEvent, Rect, RenderSurface, ServerAdapter,
    ServerEventSink, Viewport,
};
