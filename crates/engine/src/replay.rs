//! Applying recorded commands to a `DataModel`.
//!
//! `apply_forward` performs a command as recorded (redo, remote commits);
//! `apply_inverse` reverts it (undo). Batches are undone by calling
//! `apply_inverse` on their commands in reverse order.

use cellgrid_protocol::{Command, CommandKind};

use crate::model::DataModel;

/// What applying a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Replayed {
    Cell,
    Row,
    /// The model holds no view state. The caller installs this value.
    View(serde_json::Value),
    /// The command referenced something that no longer exists, or was
    /// missing required fields.
    Skipped,
}

pub fn apply_forward(model: &mut DataModel, cmd: &Command, committed: bool) -> Replayed {
    match cmd.kind {
        CommandKind::Edit => write_cell(model, cmd, cmd.next.clone(), cmd.next_unset(), committed),
        CommandKind::InsertRow => insert(model, cmd, false),
        CommandKind::DeleteRow => remove(model, cmd),
        CommandKind::UpdateView => match cmd.view() {
            Some(view) => Replayed::View(view.next.clone()),
            None => Replayed::Skipped,
        },
    }
}

pub fn apply_inverse(model: &mut DataModel, cmd: &Command, committed: bool) -> Replayed {
    match cmd.kind {
        CommandKind::Edit => write_cell(model, cmd, cmd.prev.clone(), cmd.prev_unset(), committed),
        CommandKind::InsertRow => remove(model, cmd),
        CommandKind::DeleteRow => insert(model, cmd, true),
        CommandKind::UpdateView => match cmd.view() {
            Some(view) => Replayed::View(view.prev.clone()),
            None => Replayed::Skipped,
        },
    }
}

fn write_cell(
    model: &mut DataModel,
    cmd: &Command,
    value: Option<cellgrid_core::CellValue>,
    unset: bool,
    committed: bool,
) -> Replayed {
    let (Some(row_id), Some(key)) = (cmd.row_id, cmd.col_key.as_deref()) else {
        return Replayed::Skipped;
    };
    // A deferred write of the unset value already drops the overlay entry
    let written = if unset && committed {
        model.unset_cell(row_id, key)
    } else {
        model.set_cell(row_id, key, value.unwrap_or_default(), committed)
    };
    if written {
        Replayed::Cell
    } else {
        log::debug!("replay: cell {row_id}/{key} no longer exists");
        Replayed::Skipped
    }
}

/// Undoing a local delete also brings back the row's overlay entries.
fn insert(model: &mut DataModel, cmd: &Command, restore_pending: bool) -> Replayed {
    let data = cmd.row_data.clone().unwrap_or_default();
    let index = cmd.index().unwrap_or(model.row_count());
    let row_id = model.insert_row_at(data, index, cmd.row_id);
    let pending = cmd.pending().filter(|_| restore_pending);
    for (key, value) in pending.into_iter().flatten() {
        model.set_cell(row_id, key, value.clone(), false);
    }
    Replayed::Row
}

fn remove(model: &mut DataModel, cmd: &Command) -> Replayed {
    match cmd.row_id.and_then(|id| model.remove_row(id)) {
        Some(_) => Replayed::Row,
        None => Replayed::Skipped,
    }
}
