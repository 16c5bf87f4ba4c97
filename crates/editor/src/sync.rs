//! Server adapter plumbing.
//!
//! Pushed server events land in an inbox owned by the controller; the host
//! drains it with `pump_server_events` from its event loop, so events are
//! never applied while the controller is mid-mutation.

use std::rc::Rc;

use cellgrid_engine::{apply_forward, Replayed};
use cellgrid_protocol::{InitialPayload, ServerEvent};

use crate::controller::GridController;
use crate::errors::ErrorScope;

impl GridController {
    /// Subscribe to server events.
    pub fn connect(&mut self) -> bool {
        let Some(adapter) = self.adapter.as_mut() else {
            return false;
        };
        let inbox = Rc::clone(&self.inbox);
        match adapter.subscribe(Box::new(move |event| inbox.borrow_mut().push_back(event))) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("subscribe failed: {e}");
                self.errors.set(ErrorScope::Commit, e.to_string());
                false
            }
        }
    }

    /// Fetch the initial dataset from the adapter and install it.
    pub fn load_initial(&mut self) -> bool {
        let Some(adapter) = self.adapter.as_mut() else {
            return false;
        };
        match adapter.fetch_initial() {
            Ok(payload) => {
                self.install_initial(payload);
                true
            }
            Err(e) => {
                log::warn!("initial fetch failed: {e}");
                self.errors.set(ErrorScope::Commit, e.to_string());
                false
            }
        }
    }

    /// Replace data, schema, view and user. History, locks and selection
    /// start over.
    pub fn install_initial(&mut self, payload: InitialPayload) {
        self.cancel_editor();
        self.fill_drag = None;
        self.range_drag = None;
        let InitialPayload { data, schema, view, user } = payload;
        self.model.batch_update(|model| {
            if let Some(schema) = schema {
                model.set_schema(schema);
            }
            model.set_data(data);
        });
        if let Some(view) = view {
            self.view = view;
        }
        self.user = user;
        self.history.clear();
        self.remote_locks.clear();
        self.selection.clear();
        self.active = None;
        self.extend_end = None;
        log::debug!("initial data installed: {} rows", self.model.row_count());
        self.refresh();
    }

    /// Apply queued server events. Returns how many were handled.
    pub fn pump_server_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            self.handle_server_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_server_event(&mut self, event: ServerEvent) {
        if self.destroyed {
            return;
        }
        match event {
            ServerEvent::RowsLocked { row_ids, user } => {
                if user.id == self.user.id {
                    return;
                }
                for row_id in row_ids {
                    if self.editor.as_ref().is_some_and(|e| e.row_id == row_id) {
                        log::debug!("{row_id} locked by {}, closing editor", user.id);
                        self.cancel_editor();
                    }
                    self.remote_locks.insert(row_id, user.clone());
                }
            }
            ServerEvent::RowsUnlocked { row_ids } => {
                for row_id in &row_ids {
                    self.remote_locks.remove(row_id);
                }
            }
            ServerEvent::Committed { commands, user } => {
                // Our own commits echoed back are already applied
                if user.id == self.user.id {
                    return;
                }
                self.model.batch_update(|model| {
                    for cmd in &commands {
                        if let Replayed::Skipped = apply_forward(model, cmd, true) {
                            log::debug!("remote {:?} skipped", cmd.kind);
                        }
                    }
                });
                self.clamp_to_model();
            }
            ServerEvent::DataReplaced { data } => {
                self.cancel_editor();
                self.fill_drag = None;
                self.range_drag = None;
                self.model.set_data(data);
                self.history.clear();
                self.remote_locks.clear();
                self.clamp_to_model();
            }
        }
        self.refresh();
    }
}
