//! Change notification for the data model.
//!
//! Listeners are owned by the model instance; there is no global registry.
//! Emission is synchronous and non-reentrant: a listener receives `&ModelEvent`
//! and has no path back into the model while it runs.
//!
//! `suspend`/`resume` implement batching. While suspended, events are
//! coalesced; when the outermost scope resumes, at most one event is
//! delivered (the single event itself, or `ModelEvent::Bulk` when several
//! were coalesced).

use cellgrid_core::RowId;

/// What changed.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// `set_data` replaced every row.
    DataReplaced,
    /// `set_schema` replaced the columns.
    SchemaReplaced,
    CellChanged {
        row_id: RowId,
        col_key: String,
        committed: bool,
    },
    PendingApplied { row_id: RowId },
    PendingDiscarded { row_id: RowId },
    RowInserted { row_id: RowId, index: usize },
    RowRemoved { row_id: RowId, index: usize },
    RowReadonlyChanged { row_id: RowId },
    StyleChanged { row_id: RowId, col_key: String },
    /// Several changes coalesced by a batch scope.
    Bulk,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&ModelEvent)>;

/// Per-instance observer list with a suspend counter.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    suspended: u32,
    held: Option<ModelEvent>,
    coalesced: bool,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended > 0
    }

    pub fn emit(&mut self, event: ModelEvent) {
        if self.suspended > 0 {
            if self.held.is_some() {
                self.coalesced = true;
            } else {
                self.held = Some(event);
            }
            return;
        }
        self.deliver(&event);
    }

    pub fn suspend(&mut self) {
        self.suspended += 1;
    }

    /// Leave one batch scope. The outermost exit flushes.
    pub fn resume(&mut self) {
        self.suspended = self.suspended.saturating_sub(1);
        if self.suspended > 0 {
            return;
        }
        let held = self.held.take();
        let coalesced = std::mem::take(&mut self.coalesced);
        match held {
            Some(_) if coalesced => self.deliver(&ModelEvent::Bulk),
            Some(event) => self.deliver(&event),
            None => {}
        }
    }

    fn deliver(&mut self, event: &ModelEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .field("suspended", &self.suspended)
            .finish()
    }
}

/// Collects events for assertions. Hand a `sink()` to `subscribe`.
#[derive(Debug, Default, Clone)]
pub struct EventCollector {
    events: std::rc::Rc<std::cell::RefCell<Vec<ModelEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> impl FnMut(&ModelEvent) + 'static {
        let events = self.events.clone();
        move |e| events.borrow_mut().push(e.clone())
    }

    pub fn events(&self) -> Vec<ModelEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
