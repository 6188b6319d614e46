pub mod config;
pub mod item;
pub mod section;

pub use config::*;
pub use item::*;
pub use section::*;
