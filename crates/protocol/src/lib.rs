//! cellgrid protocol: v1 wire format
//!
//! Defines the `Command` record (the unit of undo history, and also the form
//! commands are persisted and transmitted in) plus the messages exchanged
//! with an optional server adapter. Everything here is plain JSON via serde.
//!
//! # Usage
//!
//! ```ignore
//! use cellgrid_protocol::Command;
//!
//! let cmd = Command::edit(row_id, "qty", prev, next).with_batch("b1");
//! let json = serde_json::to_string(&cmd)?;
//! ```

use std::collections::BTreeMap;

use cellgrid_core::{CellValue, RowData, RowId, Schema};
use serde::{Deserialize, Serialize};

/// Current protocol version. Increment for breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    Edit,
    InsertRow,
    DeleteRow,
    UpdateView,
}

impl CommandKind {
    /// Human-readable label used by history listings.
    pub fn label(self) -> &'static str {
        match self {
            CommandKind::Edit => "Edit",
            CommandKind::InsertRow => "Insert row",
            CommandKind::DeleteRow => "Delete row",
            CommandKind::UpdateView => "Update view",
        }
    }
}

/// Previous and next view state for an `UpdateView` command. The view is
/// owned by the caller, so it travels as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewChange {
    pub prev: serde_json::Value,
    pub next: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandPayload {
    /// Groups a multi-command user action for atomic undo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// Row position for insert/delete commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewChange>,
    /// Uncommitted overlay entries a deleted row carried. Restored as
    /// pending writes when the row comes back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<BTreeMap<String, CellValue>>,
    /// The edited key was absent from the row before the edit.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prev_unset: bool,
    /// The edit removes the key from the row rather than writing `next`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub next_unset: bool,
}

/// One recorded mutation. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<RowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_data: Option<RowData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<CommandPayload>,
}

impl Command {
    fn bare(kind: CommandKind) -> Self {
        Self {
            kind,
            row_id: None,
            col_key: None,
            prev: None,
            next: None,
            row_data: None,
            payload: None,
        }
    }

    pub fn edit(row_id: RowId, col_key: impl Into<String>, prev: CellValue, next: CellValue) -> Self {
        Self {
            row_id: Some(row_id),
            col_key: Some(col_key.into()),
            prev: Some(prev),
            next: Some(next),
            ..Self::bare(CommandKind::Edit)
        }
    }

    pub fn insert_row(row_id: RowId, data: RowData, index: usize) -> Self {
        Self {
            row_id: Some(row_id),
            row_data: Some(data),
            payload: Some(CommandPayload { index: Some(index), ..Default::default() }),
            ..Self::bare(CommandKind::InsertRow)
        }
    }

    pub fn delete_row(row_id: RowId, data: RowData, index: usize) -> Self {
        Self {
            row_id: Some(row_id),
            row_data: Some(data),
            payload: Some(CommandPayload { index: Some(index), ..Default::default() }),
            ..Self::bare(CommandKind::DeleteRow)
        }
    }

    pub fn update_view(prev: serde_json::Value, next: serde_json::Value) -> Self {
        Self {
            payload: Some(CommandPayload {
                view: Some(ViewChange { prev, next }),
                ..Default::default()
            }),
            ..Self::bare(CommandKind::UpdateView)
        }
    }

    /// Tag this command with a batch id.
    pub fn with_batch(mut self, batch_id: impl Into<String>) -> Self {
        self.payload.get_or_insert_with(CommandPayload::default).batch_id = Some(batch_id.into());
        self
    }

    /// Attach a deleted row's overlay entries. Empty maps are not stored.
    pub fn with_pending(mut self, pending: BTreeMap<String, CellValue>) -> Self {
        if !pending.is_empty() {
            self.payload.get_or_insert_with(CommandPayload::default).pending = Some(pending);
        }
        self
    }

    /// Mark an edit whose key did not exist in the row beforehand.
    pub fn with_prev_unset(mut self) -> Self {
        self.payload.get_or_insert_with(CommandPayload::default).prev_unset = true;
        self
    }

    /// This command minus any carried overlay entries, the form sent to
    /// a server.
    pub fn without_pending(&self) -> Command {
        let mut cmd = self.clone();
        if let Some(p) = cmd.payload.as_mut() {
            p.pending = None;
        }
        cmd
    }

    pub fn pending(&self) -> Option<&BTreeMap<String, CellValue>> {
        self.payload.as_ref()?.pending.as_ref()
    }

    pub fn prev_unset(&self) -> bool {
        self.payload.as_ref().is_some_and(|p| p.prev_unset)
    }

    pub fn next_unset(&self) -> bool {
        self.payload.as_ref().is_some_and(|p| p.next_unset)
    }

    pub fn batch_id(&self) -> Option<&str> {
        self.payload.as_ref()?.batch_id.as_deref()
    }

    pub fn index(&self) -> Option<usize> {
        self.payload.as_ref()?.index
    }

    pub fn view(&self) -> Option<&ViewChange> {
        self.payload.as_ref()?.view.as_ref()
    }

    /// The command that reverses this one. Edits swap prev/next, row
    /// inserts and deletes swap kinds, view changes swap states. The batch
    /// id is kept.
    pub fn inverted(&self) -> Command {
        let mut inv = self.clone();
        match self.kind {
            CommandKind::Edit => {
                inv.prev = self.next.clone();
                inv.next = self.prev.clone();
                if let Some(p) = inv.payload.as_mut() {
                    std::mem::swap(&mut p.prev_unset, &mut p.next_unset);
                }
            }
            CommandKind::InsertRow => inv.kind = CommandKind::DeleteRow,
            CommandKind::DeleteRow => inv.kind = CommandKind::InsertRow,
            CommandKind::UpdateView => {
                if let Some(view) = inv.payload.as_mut().and_then(|p| p.view.as_mut()) {
                    std::mem::swap(&mut view.prev, &mut view.next);
                }
            }
        }
        inv
    }
}

// =============================================================================
// Server Adapter Messages
// =============================================================================

/// The editing user as known to the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Result of the adapter's initial fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialPayload {
    pub data: Vec<RowData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<serde_json::Value>,
    pub user: User,
}

/// Events pushed by the server through `subscribe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    RowsLocked { row_ids: Vec<RowId>, user: User },
    #[serde(rename_all = "camelCase")]
    RowsUnlocked { row_ids: Vec<RowId> },
    /// Commands another user committed. Applied as committed writes,
    /// outside the local undo history.
    Committed { commands: Vec<Command>, user: User },
    /// The server replaced the whole dataset.
    DataReplaced { data: Vec<RowData> },
}
