use serde::Serialize;

use crate::model::item::{Counts, Item, ReadFilter};
use crate::model::section::Section;
use crate::ops::reconcile::{Conflict, DiffEntry, ImportOutcome, ImportSummary, UnknownRecord};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ItemJson {
    pub id: String,
    pub title: String,
    pub read: bool,
}

#[derive(Serialize)]
pub struct SectionStatusJson {
    pub id: String,
    pub name: String,
    pub read: usize,
    pub total: usize,
    pub items: Vec<ItemJson>,
}

#[derive(Serialize)]
pub struct SectionStatsJson {
    pub id: String,
    pub name: String,
    pub read: usize,
    pub unread: usize,
    pub total: usize,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub sections: Vec<SectionStatsJson>,
    pub totals: Counts,
    /// Read ids in the store that no configured section lists
    pub untracked: usize,
}

#[derive(Serialize)]
pub struct ImportJson {
    pub applied: bool,
    pub summary: ImportSummary,
    pub unknown: Vec<UnknownRecord>,
    pub to_mark: Vec<DiffEntry>,
    pub to_unmark: Vec<DiffEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,
}

#[derive(Serialize)]
pub struct ChangeJson {
    pub section: String,
    pub read: usize,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn item_to_json(item: &Item) -> ItemJson {
    ItemJson {
        id: item.id.clone(),
        title: item.title.clone(),
        read: item.read,
    }
}

pub fn section_stats_to_json(section: &Section, counts: Counts) -> SectionStatsJson {
    SectionStatsJson {
        id: section.id.clone(),
        name: section.name.clone(),
        read: counts.read,
        unread: counts.unread(),
        total: counts.total,
    }
}

pub fn import_to_json(outcome: &ImportOutcome) -> ImportJson {
    ImportJson {
        applied: outcome.applied,
        summary: outcome.plan.summary,
        unknown: outcome.plan.unknown.clone(),
        to_mark: outcome.plan.to_mark.clone(),
        to_unmark: outcome.plan.to_unmark.clone(),
        duplicates: outcome.plan.duplicates.clone(),
        conflicts: outcome.conflicts.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single item as a one-line summary
pub fn format_item_line(item: &Item) -> String {
    let mark = if item.read { 'x' } else { ' ' };
    format!("[{}] {} {}", mark, item.id, item.title)
}

/// Format a section listing header
pub fn format_section_header(section: &Section, counts: Counts) -> String {
    format!("== {} ({}) {} ==", section.name, section.id, counts)
}

pub fn format_stats_line(section: &Section, counts: Counts) -> String {
    format!(
        "  {} ({})  {}  {} unread",
        section.name,
        section.id,
        counts,
        counts.unread()
    )
}

/// Format an import report: summary, then the detail lists
pub fn format_import(outcome: &ImportOutcome) -> Vec<String> {
    let plan = &outcome.plan;
    let s = plan.summary;
    let mut lines = Vec::new();

    lines.push(if outcome.applied {
        "import applied".to_string()
    } else {
        "dry run (use --apply to write changes)".to_string()
    });
    lines.push(format!(
        "total: {}  known: {}  unknown: {}  to mark: {}  to unmark: {}  unchanged: {}",
        s.total, s.known, s.unknown, s.to_mark, s.to_unmark, s.noop
    ));
    if s.duplicates > 0 {
        lines.push(format!("duplicates: {} (later rows win)", s.duplicates));
    }

    let mut list = |title: &str, entries: &[DiffEntry]| {
        if entries.is_empty() {
            return;
        }
        lines.push(String::new());
        lines.push(format!("{}:", title));
        for e in entries {
            lines.push(format!("  {} {}", e.id, e.title));
        }
    };
    list("to mark", &plan.to_mark);
    list("to unmark", &plan.to_unmark);

    if !plan.unknown.is_empty() {
        lines.push(String::new());
        lines.push("unknown:".to_string());
        for u in &plan.unknown {
            let id = u.id.as_deref().unwrap_or("-");
            lines.push(format!("  row {}: {} ({})", u.row, id, u.reason));
        }
    }

    if !outcome.conflicts.is_empty() {
        lines.push(String::new());
        lines.push("changed since preview:".to_string());
        for c in &outcome.conflicts {
            lines.push(format!("  {}", c.id));
        }
    }

    lines
}

/// Parse a filter string into ReadFilter
pub fn parse_read_filter(s: &str) -> Result<ReadFilter, String> {
    ReadFilter::parse_filter(s)
        .ok_or_else(|| format!("unknown filter '{}' (expected: all, read, unread)", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::reconcile::{ImportPlan, UnknownReason};

    fn entry(row: usize, id: &str, title: &str, desired: bool) -> DiffEntry {
        DiffEntry {
            row,
            id: id.into(),
            section_id: "hist".into(),
            title: title.into(),
            current: !desired,
            desired,
        }
    }

    #[test]
    fn item_line() {
        let mut item = Item::new("hist-plato".into(), "hist".into(), "Platão".into());
        assert_eq!(format_item_line(&item), "[ ] hist-plato Platão");
        item.read = true;
        assert_eq!(format_item_line(&item), "[x] hist-plato Platão");
    }

    #[test]
    fn import_report() {
        let plan = ImportPlan {
            summary: ImportSummary {
                total: 4,
                known: 2,
                unknown: 1,
                to_mark: 1,
                to_unmark: 1,
                noop: 0,
                duplicates: 1,
            },
            unknown: vec![UnknownRecord {
                row: 3,
                id: Some("nope".into()),
                reason: UnknownReason::NotFound,
            }],
            to_mark: vec![entry(2, "hist-plato", "Platão", true)],
            to_unmark: vec![entry(4, "hist-homer", "Homero", false)],
            noop: Vec::new(),
            duplicates: vec![1],
        };
        let outcome = ImportOutcome {
            plan,
            applied: false,
            conflicts: Vec::new(),
            undo: None,
        };
        insta::assert_snapshot!(format_import(&outcome).join("\n"), @r"
        dry run (use --apply to write changes)
        total: 4  known: 2  unknown: 1  to mark: 1  to unmark: 1  unchanged: 0
        duplicates: 1 (later rows win)

        to mark:
          hist-plato Platão

        to unmark:
          hist-homer Homero

        unknown:
          row 3: nope (not found)
        ");
    }

    #[test]
    fn import_json_omits_empty_lists() {
        let outcome = ImportOutcome {
            plan: ImportPlan::default(),
            applied: true,
            conflicts: Vec::new(),
            undo: None,
        };
        let json = serde_json::to_value(import_to_json(&outcome)).unwrap();
        assert!(json.get("duplicates").is_none());
        assert!(json.get("conflicts").is_none());
        assert_eq!(json["summary"]["total"], 0);
    }

    #[test]
    fn stats_line_shows_unread() {
        let section = Section::new("hist".into(), Some("História".into()));
        let counts = Counts { read: 1, total: 3 };
        assert_eq!(
            format_stats_line(&section, counts),
            "  História (hist)  1/3  2 unread"
        );
        let json = serde_json::to_value(section_stats_to_json(&section, counts)).unwrap();
        assert_eq!(json["unread"], 2);
    }

    #[test]
    fn filter_parse_error() {
        assert_eq!(parse_read_filter("read"), Ok(ReadFilter::Read));
        assert!(parse_read_filter("done").unwrap_err().contains("expected"));
    }
}
