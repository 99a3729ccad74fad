pub mod identity;
pub mod merge;

pub use identity::{resolve_key, RegionIndex, UNKNOWN_REGION};
pub use merge::{merge_districts, parent_city, MERGE_CITIES};
