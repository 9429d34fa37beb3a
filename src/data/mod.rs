//! Loading and selecting the clustering result table.

pub mod cache;
pub mod filter;
pub mod loader;
pub mod normalize;

pub use cache::DatasetCache;
pub use filter::filter_records;
pub use loader::{default_indicators, LoadOptions};
