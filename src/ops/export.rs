use indexmap::IndexMap;

use crate::ops::index::ItemIndex;
use crate::parse::{CsvError, CsvRecord, serialize_csv};

/// Columns of an export file, in order
pub const EXPORT_COLUMNS: [&str; 3] = ["section", "title", "id"];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export")]
    NothingToExport,
    #[error(transparent)]
    Csv(#[from] CsvError),
}

/// Render every read item as `section,title,id`, in index order.
/// The section column carries the section's display name.
pub fn export_read(index: &ItemIndex) -> Result<String, ExportError> {
    let rows: Vec<CsvRecord> = index
        .all()
        .filter(|item| item.read)
        .map(|item| {
            let section = index
                .section(&item.section_id)
                .map_or(item.section_id.as_str(), |s| s.name.as_str());
            let mut row = IndexMap::new();
            row.insert("section".to_string(), section.to_string());
            row.insert("title".to_string(), item.title.clone());
            row.insert("id".to_string(), item.id.clone());
            row
        })
        .collect();

    if rows.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    Ok(serialize_csv(&EXPORT_COLUMNS, &rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::Item;
    use crate::parse::parse_csv;

    #[test]
    fn nothing_read_is_an_error() {
        let mut index = ItemIndex::new();
        assert!(matches!(export_read(&index), Err(ExportError::NothingToExport)));
        index.register(Item::new("a".into(), "s".into(), "A".into()));
        assert!(matches!(export_read(&index), Err(ExportError::NothingToExport)));
    }

    #[test]
    fn exports_read_items_in_order() {
        let mut index = ItemIndex::new();
        index.register_section("hist", Some("História"));
        index.register(Item::new("hist-plato".into(), "hist".into(), "Platão".into()));
        index.register(Item::new("hist-homer".into(), "hist".into(), "Homero".into()));
        index.register(Item::new("geral-guerra".into(), "geral".into(), "Guerra, e Paz".into()));
        index.set_read("geral-guerra", true);
        index.set_read("hist-plato", true);

        let csv = export_read(&index).unwrap();
        insta::assert_snapshot!(csv, @r#"
        section,title,id
        História,Platão,hist-plato
        geral,"Guerra, e Paz",geral-guerra
        "#);
    }

    #[test]
    fn export_parses_back() {
        let mut index = ItemIndex::new();
        index.register(Item::new("s-a".into(), "s".into(), "A".into()));
        index.set_read("s-a", true);
        let records = parse_csv(&export_read(&index).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "s-a");
        assert_eq!(records[0]["section"], "s");
    }
}
