use std::fmt;

use crate::io::store::StatusChange;

/// What produced an [`Undo`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoKind {
    Import,
    MarkAll { section_id: String, value: bool },
}

impl fmt::Display for UndoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoKind::Import => write!(f, "import"),
            UndoKind::MarkAll { section_id, value } => {
                let verb = if *value { "mark all" } else { "unmark all" };
                write!(f, "{} in {}", verb, section_id)
            }
        }
    }
}

/// Snapshot of the statuses a bulk operation overwrote.
///
/// Only the undo produced most recently by a tracker can be applied;
/// `generation` identifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Undo {
    pub(crate) generation: u64,
    pub kind: UndoKind,
    /// Status each touched item had before the operation
    pub previous: Vec<StatusChange>,
}

impl Undo {
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

/// Error type for applying an undo
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UndoError {
    #[error("cannot undo {kind}: state changed since it was recorded")]
    Stale { kind: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(UndoKind::Import.to_string(), "import");
        let kind = UndoKind::MarkAll {
            section_id: "hist".into(),
            value: false,
        };
        assert_eq!(kind.to_string(), "unmark all in hist");
    }

    #[test]
    fn stale_message() {
        let err = UndoError::Stale {
            kind: UndoKind::Import.to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot undo import: state changed since it was recorded"
        );
    }
}
