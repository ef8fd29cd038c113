use std::sync::Arc;

use async_trait::async_trait;

use crate::core::error::SourceError;
use crate::domain::PostSummary;

/// Keyword search against one newsletter. The aggregator only depends on this
/// seam, so a remote client and an in-process fake are interchangeable.
#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn search_keyword(
        &self,
        source: &str,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<PostSummary>, SourceError>;
}

#[async_trait]
impl<T: SourceClient + ?Sized> SourceClient for Arc<T> {
    async fn search_keyword(
        &self,
        source: &str,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<PostSummary>, SourceError> {
        (**self).search_keyword(source, keyword, limit).await
    }
}
