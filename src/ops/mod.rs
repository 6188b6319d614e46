pub mod aggregate;
pub mod export;
pub mod index;
pub mod reconcile;
pub mod tracker;
pub mod undo;

pub use index::ItemIndex;
pub use reconcile::{ImportOptions, ImportOutcome, ImportPlan, ImportSummary};
pub use tracker::{Tracker, TrackerError};
pub use undo::{Undo, UndoError, UndoKind};
