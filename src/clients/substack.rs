use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::error::SourceError;
use crate::core::source::SourceClient;
use crate::domain::{
    AuthorProfile, NewsletterAuthor, PostDetail, PostSummary, Recommendation, Subscription,
};
use crate::infra::config::ClientConfig;
use crate::infra::http::headers::{add_standard_headers, generate_request_id};
use crate::infra::logging::{count, record_metric};
use crate::infra::runtime::limits::{make_http_client_with, retry_async};

/// The archive endpoint refuses page sizes above this.
pub const MAX_ARCHIVE_PAGE: usize = 50;
const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sorting {
    New,
    Top,
}

impl Sorting {
    pub fn as_str(self) -> &'static str {
        match self {
            Sorting::New => "new",
            Sorting::Top => "top",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Some(Sorting::New),
            "top" => Some(Sorting::Top),
            _ => None,
        }
    }
}

/// Read-only client for Substack's public JSON API. Newsletters are addressed
/// by base URL, so one client serves every newsletter.
#[derive(Clone)]
pub struct SubstackClient {
    http: Client,
    retries: u32,
    timeout: Duration,
    profile_base: String,
}

impl SubstackClient {
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&ClientConfig::default())
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self, SourceError> {
        let http = make_http_client_with(cfg).map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(Self {
            http,
            retries: cfg.retries,
            timeout: Duration::from_millis(cfg.timeout_ms),
            profile_base: cfg.profile_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Recent or top posts from one newsletter.
    pub async fn get_posts(
        &self,
        newsletter: &str,
        sorting: Sorting,
        limit: usize,
    ) -> Result<Vec<PostSummary>, SourceError> {
        self.archive(newsletter, sorting, None, limit).await
    }

    /// Posts in one newsletter matching `query`.
    pub async fn search_posts(
        &self,
        newsletter: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PostSummary>, SourceError> {
        self.archive(newsletter, Sorting::New, Some(query), limit).await
    }

    pub async fn get_post(&self, post_url: &str) -> Result<PostDetail, SourceError> {
        let (origin, slug) = split_post_url(post_url)?;
        let url = format!("{origin}/api/v1/posts/{slug}");
        let wire: PostWire = self.get_json("post", &url, &[]).await?;
        Ok(PostDetail {
            title: wire.title.unwrap_or_else(|| "Untitled".to_string()),
            url: wire.canonical_url.unwrap_or_else(|| post_url.to_string()),
            published: parse_date(wire.post_date.as_deref()),
            author: wire.published_bylines.into_iter().find_map(|b| b.name),
            subtitle: wire.subtitle.filter(|s| !s.trim().is_empty()),
            body_html: wire.body_html.filter(|s| !s.trim().is_empty()),
        })
    }

    pub async fn get_authors(&self, newsletter: &str) -> Result<Vec<NewsletterAuthor>, SourceError> {
        let url = format!("{}/api/v1/publication/users/ranked", base(newsletter));
        let users: Vec<UserWire> = self.get_json("authors", &url, &[("public", "true".into())]).await?;
        Ok(users
            .into_iter()
            .map(|u| NewsletterAuthor {
                name: u.name.unwrap_or_else(|| "Unknown".to_string()),
                handle: u.handle,
            })
            .collect())
    }

    /// Newsletters this publication recommends. The recommendations endpoint is
    /// keyed by publication id, which only the archive exposes.
    pub async fn get_recommendations(&self, newsletter: &str) -> Result<Vec<Recommendation>, SourceError> {
        let base = base(newsletter);
        let url = format!("{base}/api/v1/archive");
        let posts: Vec<ArchiveWire> = self
            .get_json("recommendations", &url, &archive_params(Sorting::New, None, 1))
            .await?;
        let Some(publication_id) = posts.into_iter().find_map(|p| p.publication_id) else {
            return Ok(Vec::new());
        };

        let url = format!("{base}/api/v1/recommendations/from/{publication_id}");
        let recs: Vec<RecommendationWire> = self.get_json("recommendations", &url, &[]).await?;
        Ok(recs
            .into_iter()
            .filter_map(|r| r.recommended_publication)
            .filter_map(|p| {
                let url = publication_url(p.custom_domain.as_deref(), p.subdomain.as_deref())?;
                Some(Recommendation { name: p.name, url })
            })
            .collect())
    }

    pub async fn get_author_profile(&self, username: &str) -> Result<AuthorProfile, SourceError> {
        let handle = username.trim().trim_start_matches('@');
        if handle.is_empty() {
            return Err(SourceError::InvalidUrl("empty author username".into()));
        }
        let url = format!("{}/api/v1/user/{handle}/public_profile", self.profile_base);
        let wire: ProfileWire = self.get_json("author", &url, &[]).await?;
        Ok(AuthorProfile {
            name: wire.name.unwrap_or_else(|| "Unknown".to_string()),
            handle: wire.handle.unwrap_or_else(|| handle.to_string()),
            bio: wire.bio.filter(|b| !b.trim().is_empty()),
            subscriptions: wire
                .subscriptions
                .into_iter()
                .filter_map(|s| s.publication)
                .map(|p| Subscription {
                    url: publication_url(p.custom_domain.as_deref(), p.subdomain.as_deref()),
                    name: p.name.unwrap_or_else(|| "Unknown".to_string()),
                })
                .collect(),
        })
    }

    async fn archive(
        &self,
        newsletter: &str,
        sorting: Sorting,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PostSummary>, SourceError> {
        let base = base(newsletter);
        let url = format!("{base}/api/v1/archive");
        let limit = limit.clamp(1, MAX_ARCHIVE_PAGE);
        let posts: Vec<ArchiveWire> = self
            .get_json("archive", &url, &archive_params(sorting, query, limit))
            .await?;
        Ok(posts
            .into_iter()
            .take(limit)
            .map(|p| p.into_summary(base))
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = Url::parse_with_params(url, query).map_err(|e| SourceError::InvalidUrl(format!("{url}: {e}")))?;
        tracing::debug!(op, endpoint = %url, "substack request");
        let req_id = generate_request_id();
        let start = Instant::now();
        let timeout = self.timeout;

        let res: Result<T, SourceError> = retry_async(self.retries, SourceError::is_retryable, |_| {
            let (builder, _rid) = add_standard_headers(self.http.get(url.clone()), Some(req_id.clone()));
            let url = url.clone();
            async move {
                let resp = builder
                    .send()
                    .await
                    .map_err(|e| SourceError::from_reqwest(e, timeout))?;
                match resp.status() {
                    s if s.is_success() => {}
                    StatusCode::NOT_FOUND => return Err(SourceError::NotFound(url.to_string())),
                    s => return Err(SourceError::Status(s.as_u16())),
                }
                let bytes = resp
                    .bytes()
                    .await
                    .map_err(|e| SourceError::from_reqwest(e, timeout))?;
                serde_json::from_slice::<T>(&bytes).map_err(|e| SourceError::Parse(e.to_string()))
            }
        })
        .await;

        match &res {
            Ok(_) => record_metric(op, "substack_latency_ms", start.elapsed().as_millis() as f64),
            Err(e) => {
                count(op, "substack_error_total");
                tracing::debug!(op, error = %e, "substack request failed");
            }
        }
        res
    }
}

#[async_trait]
impl SourceClient for SubstackClient {
    async fn search_keyword(
        &self,
        source: &str,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<PostSummary>, SourceError> {
        self.search_posts(source, keyword, limit).await
    }
}

fn base(newsletter: &str) -> &str {
    newsletter.trim().trim_end_matches('/')
}

fn archive_params(sorting: Sorting, query: Option<&str>, limit: usize) -> Vec<(&'static str, String)> {
    vec![
        ("sort", sorting.as_str().to_string()),
        ("search", query.unwrap_or_default().to_string()),
        ("offset", "0".to_string()),
        ("limit", limit.to_string()),
    ]
}

/// `https://x.substack.com/p/slug?utm=..` -> (`https://x.substack.com`, `slug`)
fn split_post_url(post_url: &str) -> Result<(String, String), SourceError> {
    let url = Url::parse(post_url.trim()).map_err(|e| SourceError::InvalidUrl(format!("{post_url}: {e}")))?;
    let mut segments = url.path_segments().into_iter().flatten();
    let slug = segments
        .by_ref()
        .skip_while(|s| *s != "p")
        .nth(1)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SourceError::InvalidUrl(format!("{post_url}: expected a /p/<slug> post URL")))?
        .to_string();
    let origin = url.origin().ascii_serialization();
    Ok((origin, slug))
}

fn publication_url(custom_domain: Option<&str>, subdomain: Option<&str>) -> Option<String> {
    match (custom_domain.filter(|d| !d.is_empty()), subdomain.filter(|s| !s.is_empty())) {
        (Some(domain), _) => Some(format!("https://{domain}")),
        (None, Some(sub)) => Some(format!("https://{sub}.substack.com")),
        (None, None) => None,
    }
}

fn parse_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

fn excerpt(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= EXCERPT_CHARS {
        return Some(text.to_string());
    }
    let cut: String = text.chars().take(EXCERPT_CHARS).collect();
    Some(format!("{}...", cut.trim_end()))
}

#[derive(Deserialize)]
struct ArchiveWire {
    title: Option<String>,
    slug: Option<String>,
    canonical_url: Option<String>,
    post_date: Option<String>,
    subtitle: Option<String>,
    description: Option<String>,
    truncated_body_text: Option<String>,
    publication_id: Option<u64>,
}

impl ArchiveWire {
    fn into_summary(self, base: &str) -> PostSummary {
        let url = self
            .canonical_url
            .filter(|u| !u.is_empty())
            .or_else(|| self.slug.as_ref().map(|s| format!("{base}/p/{s}")))
            .unwrap_or_else(|| base.to_string());
        let excerpt = [self.subtitle, self.description, self.truncated_body_text]
            .into_iter()
            .flatten()
            .find_map(|t| excerpt(&t));
        PostSummary {
            title: self.title.filter(|t| !t.is_empty()).unwrap_or_else(|| "Untitled".to_string()),
            url,
            published: parse_date(self.post_date.as_deref()),
            excerpt,
        }
    }
}

#[derive(Deserialize)]
struct PostWire {
    title: Option<String>,
    canonical_url: Option<String>,
    post_date: Option<String>,
    subtitle: Option<String>,
    body_html: Option<String>,
    #[serde(default, rename = "publishedBylines")]
    published_bylines: Vec<BylineWire>,
}

#[derive(Deserialize)]
struct BylineWire {
    name: Option<String>,
}

#[derive(Deserialize)]
struct UserWire {
    name: Option<String>,
    handle: Option<String>,
}

#[derive(Deserialize)]
struct RecommendationWire {
    #[serde(rename = "recommendedPublication")]
    recommended_publication: Option<PublicationWire>,
}

#[derive(Deserialize)]
struct PublicationWire {
    name: Option<String>,
    subdomain: Option<String>,
    custom_domain: Option<String>,
}

#[derive(Deserialize)]
struct ProfileWire {
    name: Option<String>,
    handle: Option<String>,
    bio: Option<String>,
    #[serde(default)]
    subscriptions: Vec<SubscriptionWire>,
}

#[derive(Deserialize)]
struct SubscriptionWire {
    publication: Option<PublicationWire>,
}
