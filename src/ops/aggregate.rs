use crate::io::store::StatusChange;
use crate::model::item::{Counts, Item, ReadFilter};
use crate::ops::index::ItemIndex;

/// Read/total counts for one section. Unknown sections count as empty.
pub fn section_counts(index: &ItemIndex, section_id: &str) -> Counts {
    index
        .items_in(section_id)
        .into_iter()
        .fold(Counts::default(), |acc, item| Counts {
            read: acc.read + usize::from(item.read),
            total: acc.total + 1,
        })
}

/// Counts for every section, in section registration order
pub fn all_section_counts(index: &ItemIndex) -> Vec<(&str, Counts)> {
    index
        .sections()
        .map(|s| (s.id.as_str(), section_counts(index, &s.id)))
        .collect()
}

/// Element-wise sum over all sections
pub fn global_totals(index: &ItemIndex) -> Counts {
    all_section_counts(index)
        .into_iter()
        .fold(Counts::default(), |acc, (_, c)| acc + c)
}

/// Members of `section_id` passing `read_filter`, in registration order
pub fn filter<'a>(
    index: &'a ItemIndex,
    section_id: &str,
    read_filter: ReadFilter,
) -> Vec<&'a Item> {
    index
        .items_in(section_id)
        .into_iter()
        .filter(|item| read_filter.matches(item.read))
        .collect()
}

/// Changes that bring every member of `section_id` to `value`.
/// Members already at `value` are left out.
pub fn mark_all_changes(index: &ItemIndex, section_id: &str, value: bool) -> Vec<StatusChange> {
    index
        .items_in(section_id)
        .into_iter()
        .filter(|item| item.read != value)
        .map(|item| StatusChange::new(item.id.clone(), value))
        .collect()
}
