use tracing::{debug, info, warn};

use crate::io::store::{StatusChange, StatusStore};
use crate::model::item::{Counts, Item, ReadFilter};
use crate::ops::aggregate;
use crate::ops::export::{self, ExportError};
use crate::ops::index::ItemIndex;
use crate::ops::reconcile::{self, ImportOptions, ImportOutcome, ImportPlan};
use crate::ops::undo::{Undo, UndoError, UndoKind};
use crate::parse::CsvRecord;

type SectionObserver = Box<dyn FnMut(&str, Counts)>;
type GlobalObserver = Box<dyn FnMut(Counts)>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("unknown section: {0}")]
    UnknownSection(String),
}

/// Read-state engine for one context: the item index, its status store
/// and the observers that render counts.
///
/// Every mutation goes through here. A batch (import, mark-all, undo,
/// external sync) is written to the store once and notifies each
/// touched section once, then every global observer once.
pub struct Tracker<S: StatusStore> {
    index: ItemIndex,
    store: S,
    section_observers: Vec<SectionObserver>,
    global_observers: Vec<GlobalObserver>,
    /// Generation of the only undo that may still be applied
    generation: u64,
}

impl<S: StatusStore> Tracker<S> {
    pub fn new(store: S) -> Self {
        Tracker {
            index: ItemIndex::new(),
            store,
            section_observers: Vec::new(),
            global_observers: Vec::new(),
            generation: 0,
        }
    }

    pub fn index(&self) -> &ItemIndex {
        &self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register the items of one section from their display texts.
    ///
    /// Blank texts are skipped. Returns the ids of the remaining texts in
    /// order; new items start with the status the store holds for them.
    pub fn discover<T: AsRef<str>>(
        &mut self,
        section_id: &str,
        section_name: Option<&str>,
        texts: &[T],
    ) -> Vec<String> {
        let mut changed = self.index.register_section(section_id, section_name);
        let mut ids = Vec::new();

        for text in texts {
            let title = text.as_ref().trim();
            if title.is_empty() {
                continue;
            }
            let id = self.index.assign_id(section_id, title);
            if !self.index.contains(&id) {
                let mut item = Item::new(id.clone(), section_id.to_string(), title.to_string());
                item.read = self.stored_status(&id);
                self.index.register(item);
                changed = true;
            }
            ids.push(id);
        }

        debug!(section = section_id, items = ids.len(), "discovered section");
        if changed {
            self.notify(&[section_id.to_string()]);
        }
        ids
    }

    fn stored_status(&self, id: &str) -> bool {
        match self.store.get(id) {
            Ok(read) => read,
            Err(e) => {
                warn!(error = %e, id, "could not read stored status");
                false
            }
        }
    }

    /// Set one item's status.
    pub fn set_status(&mut self, id: &str, read: bool) -> Result<(), TrackerError> {
        if !self.index.contains(id) {
            return Err(TrackerError::UnknownItem(id.to_string()));
        }
        self.commit(&[StatusChange::new(id, read)], true);
        Ok(())
    }

    /// Set every member of a section to `value`.
    pub fn mark_all(&mut self, section_id: &str, value: bool) -> Result<Undo, TrackerError> {
        if self.index.section(section_id).is_none() {
            return Err(TrackerError::UnknownSection(section_id.to_string()));
        }
        let changes = aggregate::mark_all_changes(&self.index, section_id, value);
        let previous = self.commit(&changes, true);
        info!(section = section_id, value, changed = previous.len(), "mark all");
        Ok(self.record_undo(
            UndoKind::MarkAll {
                section_id: section_id.to_string(),
                value,
            },
            previous,
        ))
    }

    /// Restore the statuses captured by `undo`.
    ///
    /// Fails without touching anything if a newer undo was recorded, an
    /// undo was already applied, or another context changed an item since.
    pub fn undo(&mut self, undo: Undo) -> Result<(), UndoError> {
        if undo.generation != self.generation {
            return Err(UndoError::Stale {
                kind: undo.kind.to_string(),
            });
        }
        self.commit(&undo.previous, true);
        self.generation += 1;
        info!(kind = %undo.kind, restored = undo.len(), "undo");
        Ok(())
    }

    pub fn counts(&self, section_id: &str) -> Counts {
        aggregate::section_counts(&self.index, section_id)
    }

    pub fn totals(&self) -> Counts {
        aggregate::global_totals(&self.index)
    }

    pub fn filter(&self, section_id: &str, read_filter: ReadFilter) -> Vec<&Item> {
        aggregate::filter(&self.index, section_id, read_filter)
    }

    /// Called with a section id and its counts whenever they may have changed
    pub fn on_change(&mut self, observer: impl FnMut(&str, Counts) + 'static) {
        self.section_observers.push(Box::new(observer));
    }

    /// Called with the global totals after every notified batch
    pub fn on_global_change(&mut self, observer: impl FnMut(Counts) + 'static) {
        self.global_observers.push(Box::new(observer));
    }

    /// Classify `records` and, unless `options.dry_run`, apply the result.
    pub fn reconcile(&mut self, records: &[CsvRecord], options: &ImportOptions) -> ImportOutcome {
        let plan = reconcile::classify(&self.index, records, options);
        if options.dry_run {
            debug!(total = plan.summary.total, "import dry run");
            return ImportOutcome {
                plan,
                applied: false,
                conflicts: Vec::new(),
                undo: None,
            };
        }
        self.apply_import(plan, Vec::new())
    }

    /// Dry-run classification to show before [`Tracker::apply_plan`]
    pub fn preview(&self, records: &[CsvRecord], options: &ImportOptions) -> ImportPlan {
        reconcile::classify(&self.index, records, options)
    }

    /// Apply a previewed plan, recomputed against the current state.
    /// Items that changed since the preview are reported as conflicts.
    pub fn apply_plan(&mut self, plan: &ImportPlan) -> ImportOutcome {
        let (fresh, conflicts) = reconcile::revalidate(&self.index, plan);
        if !conflicts.is_empty() {
            warn!(conflicts = conflicts.len(), "items changed since import preview");
        }
        self.apply_import(fresh, conflicts)
    }

    fn apply_import(
        &mut self,
        plan: ImportPlan,
        conflicts: Vec<reconcile::Conflict>,
    ) -> ImportOutcome {
        let previous = self.commit(&plan.changes(), true);
        let s = plan.summary;
        info!(
            total = s.total,
            known = s.known,
            unknown = s.unknown,
            to_mark = s.to_mark,
            to_unmark = s.to_unmark,
            "import applied"
        );
        let undo = self.record_undo(UndoKind::Import, previous);
        ImportOutcome {
            plan,
            applied: true,
            conflicts,
            undo: Some(undo),
        }
    }

    pub fn export(&self) -> Result<String, ExportError> {
        export::export_read(&self.index)
    }

    /// Expand one section's panel, collapsing the others.
    pub fn expand_section(&mut self, section_id: &str) -> Result<(), TrackerError> {
        if self.index.expand_section(section_id) {
            Ok(())
        } else {
            Err(TrackerError::UnknownSection(section_id.to_string()))
        }
    }

    /// Pull changes other contexts wrote to the store. Returns how many
    /// items changed.
    pub fn sync(&mut self) -> usize {
        let changes = self.store.poll_external();
        self.apply_external(&changes)
    }

    /// Mirror changes made elsewhere without writing them back.
    /// Ids missing from the index are ignored.
    pub fn apply_external(&mut self, changes: &[StatusChange]) -> usize {
        let known: Vec<StatusChange> = changes
            .iter()
            .filter(|c| self.index.contains(&c.id))
            .cloned()
            .collect();
        let applied = self.commit(&known, false).len();
        if applied > 0 {
            // Invalidates any outstanding undo
            self.generation += 1;
            debug!(applied, "applied external changes");
        }
        applied
    }

    fn record_undo(&mut self, kind: UndoKind, previous: Vec<StatusChange>) -> Undo {
        self.generation += 1;
        Undo {
            generation: self.generation,
            kind,
            previous,
        }
    }

    /// Apply `changes` to the index, persist the effective ones when
    /// `persist` is set, and notify. Returns the prior status of every
    /// item that actually changed.
    fn commit(&mut self, changes: &[StatusChange], persist: bool) -> Vec<StatusChange> {
        let mut previous = Vec::new();
        let mut effective = Vec::new();
        let mut sections: Vec<String> = Vec::new();

        for change in changes {
            let Some(old) = self.index.set_read(&change.id, change.value) else {
                continue;
            };
            if old == change.value {
                continue;
            }
            previous.push(StatusChange::new(change.id.clone(), old));
            effective.push(change.clone());
            if let Some(item) = self.index.get(&change.id)
                && !sections.contains(&item.section_id)
            {
                sections.push(item.section_id.clone());
            }
        }

        if effective.is_empty() {
            return previous;
        }
        if persist && let Err(e) = self.store.write_batch(&effective) {
            warn!(error = %e, count = effective.len(), "could not persist status");
        }
        self.notify(&sections);
        previous
    }

    fn notify(&mut self, sections: &[String]) {
        for section_id in sections {
            let counts = aggregate::section_counts(&self.index, section_id);
            for observer in &mut self.section_observers {
                observer(section_id, counts);
            }
        }
        let totals = aggregate::global_totals(&self.index);
        for observer in &mut self.global_observers {
            observer(totals);
        }
    }
}
