//! Grid engine: data model, validation, change notification, undo/redo
//! command queue and sequence inference.

pub mod events;
pub mod history;
pub mod model;
pub mod replay;
pub mod series;
pub mod validation;

pub use events::{EventCollector, ModelEvent, SubscriptionId};
pub use history::{CommandBatch, CommandQueue, HistoryItem};
pub use model::{DataModel, RemovedRow, Row};
pub use replay::{apply_forward, apply_inverse, Replayed};
pub use series::{infer_sequence, Sequence, SequenceList, SequenceMatcher, SequenceRegistry};
pub use validation::{ErrorCode, ValidationError};
