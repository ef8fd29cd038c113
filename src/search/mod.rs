pub mod aggregator;
pub mod shaping;

pub use aggregator::{Aggregator, SearchRequest};
