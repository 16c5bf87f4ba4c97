//! Undo/redo command queue.
//!
//! Commands are grouped into batches. Consecutive enqueues that share a
//! non-null batch id land in the same batch, and undo/redo always move whole
//! batches. The queue only records; applying commands (and their inverses)
//! is done by `replay`.

use std::collections::VecDeque;

use cellgrid_protocol::{Command, CommandKind};

pub const DEFAULT_CAPACITY: usize = 100;

/// Commands undone and redone as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBatch {
    pub batch_id: Option<String>,
    pub commands: Vec<Command>,
}

impl CommandBatch {
    /// "Edit", "Edit + Insert row", ... from the distinct kinds, in
    /// first-seen order.
    pub fn label(&self) -> String {
        let mut kinds: Vec<CommandKind> = Vec::new();
        for cmd in &self.commands {
            if !kinds.contains(&cmd.kind) {
                kinds.push(cmd.kind);
            }
        }
        kinds.iter().map(|k| k.label()).collect::<Vec<_>>().join(" + ")
    }
}

/// One line of the history listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub label: String,
    pub batch_id: Option<String>,
    pub len: usize,
}

#[derive(Debug)]
pub struct CommandQueue {
    undo_stack: VecDeque<CommandBatch>,
    redo_stack: Vec<CommandBatch>,
    capacity: usize,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A capacity of 0 is treated as 1.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a command. Clears the redo stack.
    pub fn enqueue(&mut self, cmd: Command) {
        self.redo_stack.clear();

        if let Some(id) = cmd.batch_id() {
            if let Some(top) = self.undo_stack.back_mut() {
                if top.batch_id.as_deref() == Some(id) {
                    top.commands.push(cmd);
                    return;
                }
            }
        }

        log::debug!("history: new batch {:?} ({})", cmd.batch_id(), cmd.kind.label());
        self.undo_stack.push_back(CommandBatch {
            batch_id: cmd.batch_id().map(str::to_string),
            commands: vec![cmd],
        });
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
    }

    /// Pop the latest batch. Commands are in original enqueue order; the
    /// caller applies their inverses in reverse.
    pub fn undo(&mut self) -> Option<CommandBatch> {
        let batch = self.undo_stack.pop_back()?;
        self.redo_stack.push(batch.clone());
        Some(batch)
    }

    /// Pop the latest undone batch, in original order.
    pub fn redo(&mut self) -> Option<CommandBatch> {
        let batch = self.redo_stack.pop()?;
        self.undo_stack.push_back(batch.clone());
        Some(batch)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undoable batches, most recent first.
    pub fn history(&self) -> Vec<HistoryItem> {
        self.undo_stack
            .iter()
            .rev()
            .map(|b| HistoryItem {
                label: b.label(),
                batch_id: b.batch_id.clone(),
                len: b.commands.len(),
            })
            .collect()
    }

    /// Number of undoable batches.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
