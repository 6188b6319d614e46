use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::io::store::StatusChange;
use crate::ops::index::ItemIndex;
use crate::ops::undo::Undo;
use crate::parse::{CsvRecord, is_truthy};

/// Header names accepted for the item id column
pub const ID_ALIASES: &[&str] = &["id", "bookId", "bookid"];
/// Header names accepted for the read flag column
pub const READ_ALIASES: &[&str] = &["read", "Read", "reading"];
/// Header names accepted for the section column
pub const SECTION_ALIASES: &[&str] = &["sectionId", "section"];

/// Options for one import call
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Report only; leave items and store untouched
    pub dry_run: bool,
    /// Only consider records whose section field names this section
    pub section_scope: Option<String>,
    /// Affirmative tokens accepted on top of the built-in ones
    pub extra_truthy: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownReason {
    MissingId,
    NotFound,
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownReason::MissingId => write!(f, "missing id"),
            UnknownReason::NotFound => write!(f, "not found"),
        }
    }
}

/// A record that could not be matched to an item.
/// `row` is the 1-based position among the data records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownRecord {
    pub row: usize,
    pub id: Option<String>,
    pub reason: UnknownReason,
}

/// A record matched to an item, with the status it asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub row: usize,
    pub id: String,
    pub section_id: String,
    pub title: String,
    pub current: bool,
    pub desired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub known: usize,
    pub unknown: usize,
    pub to_mark: usize,
    pub to_unmark: usize,
    pub noop: usize,
    /// Earlier records for an id that a later record overrides
    pub duplicates: usize,
}

/// Classified result of comparing import records with the index
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImportPlan {
    pub summary: ImportSummary,
    pub unknown: Vec<UnknownRecord>,
    pub to_mark: Vec<DiffEntry>,
    pub to_unmark: Vec<DiffEntry>,
    pub noop: Vec<DiffEntry>,
    /// Rows skipped because a later row carries the same id
    pub duplicates: Vec<usize>,
}

impl ImportPlan {
    /// Status writes this plan performs, marks first
    pub fn changes(&self) -> Vec<StatusChange> {
        self.to_mark
            .iter()
            .chain(&self.to_unmark)
            .map(|e| StatusChange::new(e.id.clone(), e.desired))
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.to_mark.is_empty() || !self.to_unmark.is_empty()
    }

    fn push(&mut self, entry: DiffEntry) {
        match (entry.current, entry.desired) {
            (false, true) => self.to_mark.push(entry),
            (true, false) => self.to_unmark.push(entry),
            _ => self.noop.push(entry),
        }
    }

    fn recount(&mut self, total: usize) {
        self.summary = ImportSummary {
            total,
            known: self.to_mark.len() + self.to_unmark.len() + self.noop.len(),
            unknown: self.unknown.len(),
            to_mark: self.to_mark.len(),
            to_unmark: self.to_unmark.len(),
            noop: self.noop.len(),
            duplicates: self.duplicates.len(),
        };
    }
}

/// An item whose status changed between preview and apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub id: String,
    pub previewed: bool,
    pub current: bool,
    pub desired: bool,
}

/// Result of an import call
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub plan: ImportPlan,
    /// False for a dry run
    pub applied: bool,
    pub conflicts: Vec<Conflict>,
    /// Restores the pre-import status; present whenever the import applied
    pub undo: Option<Undo>,
}

impl ImportOutcome {
    pub fn summary(&self) -> ImportSummary {
        self.plan.summary
    }
}

/// Look up a field by any of `aliases`. Exact header names win over
/// case-insensitive matches.
fn field<'r>(record: &'r CsvRecord, aliases: &[&str]) -> Option<&'r str> {
    aliases
        .iter()
        .find_map(|a| record.get(*a))
        .or_else(|| {
            record
                .iter()
                .find(|(k, _)| aliases.iter().any(|a| k.eq_ignore_ascii_case(a)))
                .map(|(_, v)| v)
        })
        .map(String::as_str)
}

fn record_id(record: &CsvRecord) -> Option<&str> {
    field(record, ID_ALIASES)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

fn in_scope(index: &ItemIndex, record: &CsvRecord, scope: &str) -> bool {
    let Some(value) = field(record, SECTION_ALIASES).map(str::trim) else {
        return false;
    };
    value == scope || index.section(scope).is_some_and(|s| s.name == value)
}

/// Classify `records` against the current state of `index`.
///
/// Pure: neither the index nor any store is touched. `options.dry_run`
/// has no effect here.
pub fn classify(index: &ItemIndex, records: &[CsvRecord], options: &ImportOptions) -> ImportPlan {
    let scoped: Vec<(usize, &CsvRecord)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i + 1, r))
        .filter(|(_, r)| match &options.section_scope {
            Some(scope) => in_scope(index, r, scope),
            None => true,
        })
        .collect();

    let mut last_row: HashMap<&str, usize> = HashMap::new();
    for (row, record) in &scoped {
        if let Some(id) = record_id(record) {
            last_row.insert(id, *row);
        }
    }

    let mut plan = ImportPlan::default();
    for (row, record) in &scoped {
        let Some(id) = record_id(record) else {
            plan.unknown.push(UnknownRecord {
                row: *row,
                id: None,
                reason: UnknownReason::MissingId,
            });
            continue;
        };
        if last_row.get(id) != Some(row) {
            plan.duplicates.push(*row);
            continue;
        }
        let Some(item) = index.get(id) else {
            plan.unknown.push(UnknownRecord {
                row: *row,
                id: Some(id.to_string()),
                reason: UnknownReason::NotFound,
            });
            continue;
        };
        plan.push(DiffEntry {
            row: *row,
            id: item.id.clone(),
            section_id: item.section_id.clone(),
            title: item.title.clone(),
            current: item.read,
            desired: is_truthy(field(record, READ_ALIASES), &options.extra_truthy),
        });
    }
    plan.recount(scoped.len());
    plan
}

/// Recompute a previewed plan against the current index.
///
/// Entries keep the desired status from the file. Entries whose current
/// status moved since the preview are returned as conflicts.
pub fn revalidate(index: &ItemIndex, previewed: &ImportPlan) -> (ImportPlan, Vec<Conflict>) {
    let mut plan = ImportPlan {
        unknown: previewed.unknown.clone(),
        duplicates: previewed.duplicates.clone(),
        ..ImportPlan::default()
    };
    let mut conflicts = Vec::new();

    let mut entries: Vec<&DiffEntry> = previewed
        .to_mark
        .iter()
        .chain(&previewed.to_unmark)
        .chain(&previewed.noop)
        .collect();
    entries.sort_by_key(|e| e.row);

    for entry in entries {
        let current = index.get(&entry.id).map_or(entry.current, |i| i.read);
        if current != entry.current {
            conflicts.push(Conflict {
                id: entry.id.clone(),
                previewed: entry.current,
                current,
                desired: entry.desired,
            });
        }
        plan.push(DiffEntry {
            current,
            ..entry.clone()
        });
    }
    plan.recount(previewed.summary.total);
    (plan, conflicts)
}
