use indexmap::IndexMap;

use crate::model::item::Item;
use crate::model::section::{PanelState, Section};
use crate::util::slug;

/// Registry of every item discovered this session, keyed by id.
///
/// Iteration follows registration order for both items and sections.
/// Items are never removed.
#[derive(Debug, Default, Clone)]
pub struct ItemIndex {
    items: IndexMap<String, Item>,
    sections: IndexMap<String, Section>,
}

impl ItemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section. Returns false if it was already known.
    pub fn register_section(&mut self, id: &str, name: Option<&str>) -> bool {
        if self.sections.contains_key(id) {
            return false;
        }
        self.sections.insert(
            id.to_string(),
            Section::new(id.to_string(), name.map(str::to_string)),
        );
        true
    }

    /// Register an item. An already registered id is left untouched and
    /// false is returned. The item's section is created if needed.
    pub fn register(&mut self, item: Item) -> bool {
        if self.items.contains_key(&item.id) {
            return false;
        }
        self.register_section(&item.section_id, None);
        self.items.insert(item.id.clone(), item);
        true
    }

    /// Id for `title` in `section_id`.
    ///
    /// Re-discovering the same title yields its existing id. A different
    /// title whose slug is already taken gets `-2`, `-3`, ... appended.
    pub fn assign_id(&self, section_id: &str, title: &str) -> String {
        let base = slug::normalize(section_id, title);
        let mut candidate = base.clone();
        let mut n = 2;
        loop {
            match self.items.get(&candidate) {
                None => return candidate,
                Some(item) if item.section_id == section_id && item.title == title => {
                    return candidate;
                }
                Some(_) => {
                    candidate = format!("{}-{}", base, n);
                    n += 1;
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// All items in registration order
    pub fn all(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.get(id)
    }

    /// Members of a section in registration order
    pub fn items_in<'a>(&'a self, section_id: &str) -> Vec<&'a Item> {
        self.items
            .values()
            .filter(|i| i.section_id == section_id)
            .collect()
    }

    /// Set an item's status, returning the previous value.
    /// None if the id is unknown.
    pub fn set_read(&mut self, id: &str, read: bool) -> Option<bool> {
        let item = self.items.get_mut(id)?;
        let old = item.read;
        item.read = read;
        Some(old)
    }

    /// Expand one section's panel and collapse every other one.
    /// Returns false for an unknown section.
    pub fn expand_section(&mut self, id: &str) -> bool {
        if !self.sections.contains_key(id) {
            return false;
        }
        for section in self.sections.values_mut() {
            section.panel = if section.id == id {
                PanelState::Expanded
            } else {
                PanelState::Collapsed
            };
        }
        true
    }

    pub fn expanded_section(&self) -> Option<&Section> {
        self.sections.values().find(|s| s.is_expanded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(index: &mut ItemIndex, section: &str, title: &str) -> String {
        let id = index.assign_id(section, title);
        index.register(Item::new(id.clone(), section.into(), title.into()));
        id
    }

    #[test]
    fn register_is_idempotent() {
        let mut index = ItemIndex::new();
        assert!(index.register(Item::new("a".into(), "s".into(), "A".into())));
        index.set_read("a", true);
        assert!(!index.register(Item::new("a".into(), "s".into(), "Other".into())));
        let item = index.get("a").unwrap();
        assert_eq!(item.title, "A");
        assert!(item.read);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn preserves_registration_order() {
        let mut index = ItemIndex::new();
        add(&mut index, "b", "Zeta");
        add(&mut index, "a", "Alpha");
        add(&mut index, "b", "Eta");
        let titles: Vec<&str> = index.all().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Zeta", "Alpha", "Eta"]);
        let sections: Vec<&str> = index.sections().map(|s| s.id.as_str()).collect();
        assert_eq!(sections, vec!["b", "a"]);
        let in_b: Vec<&str> = index
            .items_in("b")
            .into_iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(in_b, vec!["Zeta", "Eta"]);
    }

    #[test]
    fn same_title_keeps_its_id() {
        let mut index = ItemIndex::new();
        let first = add(&mut index, "geral", "O Príncipe");
        let again = index.assign_id("geral", "O Príncipe");
        assert_eq!(first, again);
        assert_eq!(first, "geral-o-principe");
    }

    #[test]
    fn colliding_slugs_get_suffixes() {
        let mut index = ItemIndex::new();
        let a = add(&mut index, "geral", "O Príncipe");
        let b = add(&mut index, "geral", "O principe!");
        let c = add(&mut index, "geral", "o PRÍNCIPE");
        assert_eq!(a, "geral-o-principe");
        assert_eq!(b, "geral-o-principe-2");
        assert_eq!(c, "geral-o-principe-3");
        // Stable on re-discovery
        assert_eq!(index.assign_id("geral", "O principe!"), b);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn set_read_unknown_id() {
        let mut index = ItemIndex::new();
        assert_eq!(index.set_read("nope", true), None);
    }

    #[test]
    fn register_section_keeps_first_name() {
        let mut index = ItemIndex::new();
        assert!(index.register_section("historia", Some("História")));
        assert!(!index.register_section("historia", Some("Other")));
        assert_eq!(index.section("historia").unwrap().name, "História");
        index.register_section("guia", None);
        assert_eq!(index.section("guia").unwrap().name, "guia");
    }

    #[test]
    fn expanding_collapses_others() {
        let mut index = ItemIndex::new();
        index.register_section("a", None);
        index.register_section("b", None);
        assert!(index.expanded_section().is_none());

        assert!(index.expand_section("a"));
        assert_eq!(index.expanded_section().unwrap().id, "a");
        assert!(index.expand_section("b"));
        assert_eq!(index.expanded_section().unwrap().id, "b");
        assert!(!index.section("a").unwrap().is_expanded());

        assert!(!index.expand_section("missing"));
        assert_eq!(index.expanded_section().unwrap().id, "b");
    }
}
