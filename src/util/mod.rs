pub mod slug;

pub use slug::{normalize, slugify};
