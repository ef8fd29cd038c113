//! Cross-newsletter keyword search.
//!
//! Fans one keyword out to every resolved source with bounded concurrency,
//! captures each source's outcome independently, and reassembles results in
//! source-list order.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Deserialize;

use crate::catalog::resolve_sources;
use crate::core::error::{SearchError, SourceError};
use crate::core::source::SourceClient;
use crate::domain::{AggregateResponse, SourceResult};
use crate::infra::config::SearchConfig;
use crate::infra::logging::{count, record_metric};

/// Caller input for an aggregated search, as received at the tool boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchRequest {
    pub keyword: String,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub limit_per_source: Option<i64>,
}

#[derive(Clone)]
pub struct Aggregator<C> {
    client: C,
    cfg: SearchConfig,
}

impl<C: SourceClient> Aggregator<C> {
    pub fn new(client: C, cfg: SearchConfig) -> Self {
        Self { client, cfg }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.cfg
    }

    /// Validate, resolve sources, then aggregate.
    pub async fn search(&self, req: &SearchRequest) -> Result<AggregateResponse, SearchError> {
        if req.keyword.trim().is_empty() {
            return Err(SearchError::InvalidQuery);
        }
        let sources = resolve_sources(req.sources.as_deref(), req.category.as_deref())?;
        self.aggregate_search(&req.keyword, &sources, req.limit_per_source).await
    }

    /// Query every source for `keyword`. Never fails once validation passes:
    /// per-source errors are recorded as `Failure` entries. Sources see the
    /// trimmed keyword; the response echoes it as given.
    pub async fn aggregate_search(
        &self,
        keyword: &str,
        sources: &[String],
        limit_per_source: Option<i64>,
    ) -> Result<AggregateResponse, SearchError> {
        let query = keyword;
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SearchError::InvalidQuery);
        }
        if sources.is_empty() {
            return Err(SearchError::EmptySourceSet);
        }

        let limit = self.cfg.effective_limit(limit_per_source);
        let in_flight = self.cfg.max_in_flight.max(1);
        let started = Instant::now();
        tracing::info!(keyword, sources = sources.len(), limit, in_flight, "aggregate search");

        let mut slots: Vec<Option<SourceResult>> = std::iter::repeat_with(|| None).take(sources.len()).collect();
        let mut outcomes = stream::iter(0..sources.len())
            .map(|idx| async move { (idx, self.query_one(&sources[idx], keyword, limit).await) })
            .buffer_unordered(in_flight);
        while let Some((idx, result)) = outcomes.next().await {
            slots[idx] = Some(result);
        }

        let results: Vec<SourceResult> = slots.into_iter().flatten().collect();
        debug_assert_eq!(results.len(), sources.len());

        let response = AggregateResponse::new(query, results);
        record_metric("aggregate_search", "aggregate_latency_ms", started.elapsed().as_millis() as f64);
        tracing::info!(
            keyword,
            successes = response.counts.successes,
            failures = response.counts.failures,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "aggregate search finished"
        );
        Ok(response)
    }

    async fn query_one(&self, source: &str, keyword: &str, limit: usize) -> SourceResult {
        let timeout = self.cfg.source_timeout();
        let outcome = match tokio::time::timeout(timeout, self.client.search_keyword(source, keyword, limit)).await {
            Ok(res) => res,
            Err(_) => Err(SourceError::Timeout(timeout)),
        };
        match outcome {
            Ok(mut posts) => {
                posts.truncate(limit);
                tracing::debug!(source, matches = posts.len(), "source ok");
                SourceResult::success(source, posts)
            }
            Err(e) => {
                count("aggregate_search", "source_failure_total");
                tracing::warn!(source, error = %e, "source failed");
                SourceResult::failure(source, e.to_string())
            }
        }
    }
}
