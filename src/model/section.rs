use serde::Serialize;

/// Open/closed state of a section's content panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    #[default]
    Collapsed,
    Expanded,
}

/// A named group of items. Counts are always derived from the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: String,
    /// Display name (falls back to the id)
    pub name: String,
    pub panel: PanelState,
}

impl Section {
    pub fn new(id: String, name: Option<String>) -> Self {
        let name = name.unwrap_or_else(|| id.clone());
        Section {
            id,
            name,
            panel: PanelState::Collapsed,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.panel == PanelState::Expanded
    }
}
