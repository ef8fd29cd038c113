//! Request-scoped value types shared by the client, aggregator and tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as returned by a newsletter's archive or search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub excerpt: Option<String>,
}

impl PostSummary {
    /// `YYYY-MM-DD`, or `Unknown date` when the upstream omitted it.
    pub fn published_label(&self) -> String {
        self.published
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Unknown date".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub title: String,
    pub url: String,
    pub published: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub subtitle: Option<String>,
    pub body_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterAuthor {
    pub name: String,
    pub handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub name: String,
    pub handle: String,
    pub bio: Option<String>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

/// Outcome of querying one source within an aggregate search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Success { posts: Vec<PostSummary> },
    Failure { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceResult {
    pub source: String,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceResult {
    pub fn success(source: impl Into<String>, posts: Vec<PostSummary>) -> Self {
        Self { source: source.into(), status: SourceStatus::Success { posts } }
    }

    pub fn failure(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { source: source.into(), status: SourceStatus::Failure { reason: reason.into() } }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, SourceStatus::Success { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub successes: usize,
    pub failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResponse {
    pub query: String,
    pub results: Vec<SourceResult>,
    pub counts: Counts,
}

impl AggregateResponse {
    /// Builds the response and tallies counts from `results`.
    pub fn new(query: impl Into<String>, results: Vec<SourceResult>) -> Self {
        let successes = results.iter().filter(|r| r.is_success()).count();
        let failures = results.len() - successes;
        Self { query: query.into(), results, counts: Counts { successes, failures } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(title: &str) -> PostSummary {
        PostSummary { title: title.into(), url: format!("https://x.example/p/{title}"), published: None, excerpt: None }
    }

    #[test]
    fn counts_are_tallied_from_results() {
        let resp = AggregateResponse::new(
            "rust",
            vec![
                SourceResult::success("a", vec![post("one")]),
                SourceResult::failure("b", "timed out"),
                SourceResult::success("c", vec![]),
            ],
        );
        assert_eq!(resp.counts, Counts { successes: 2, failures: 1 });
    }

    #[test]
    fn published_label_formats_date_or_falls_back() {
        let mut p = post("dated");
        assert_eq!(p.published_label(), "Unknown date");
        p.published = Some(Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap());
        assert_eq!(p.published_label(), "2024-03-09");
    }

    #[test]
    fn source_result_serializes_with_status_tag() {
        let v = serde_json::to_value(SourceResult::failure("b", "not found")).unwrap();
        assert_eq!(v["source"], "b");
        assert_eq!(v["status"], "failure");
        assert_eq!(v["reason"], "not found");
    }
}
