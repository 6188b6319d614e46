use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// One trackable entry with a read/unread status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Stable id, derived once from section and title
    pub id: String,
    /// Owning section
    pub section_id: String,
    /// Display text
    pub title: String,
    /// Read status (absent from the store means unread)
    pub read: bool,
}

impl Item {
    /// Create a new unread item
    pub fn new(id: String, section_id: String, title: String) -> Self {
        Item {
            id,
            section_id,
            title,
            read: false,
        }
    }
}

/// Which items a section view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFilter {
    #[default]
    All,
    Read,
    Unread,
}

impl ReadFilter {
    pub fn matches(self, read: bool) -> bool {
        match self {
            ReadFilter::All => true,
            ReadFilter::Read => read,
            ReadFilter::Unread => !read,
        }
    }

    pub fn parse_filter(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Some(ReadFilter::All),
            "read" => Some(ReadFilter::Read),
            "unread" => Some(ReadFilter::Unread),
            _ => None,
        }
    }
}

/// Read and total counts for a section or the whole index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counts {
    pub read: usize,
    pub total: usize,
}

impl Counts {
    pub fn unread(self) -> usize {
        self.total - self.read
    }
}

impl Add for Counts {
    type Output = Counts;

    fn add(self, other: Counts) -> Counts {
        Counts {
            read: self.read + other.read,
            total: self.total + other.total,
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, other: Counts) {
        *self = *self + other;
    }
}

impl std::fmt::Display for Counts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.read, self.total)
    }
}
