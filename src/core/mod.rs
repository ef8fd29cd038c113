//! Core contracts: error model and the per-source search seam.

pub mod error;
pub mod source;

pub use error::{SearchError, SourceError};
pub use source::SourceClient;
