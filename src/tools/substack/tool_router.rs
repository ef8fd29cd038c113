use std::fmt::Write as _;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, GetPromptRequestParam, GetPromptResult, JsonObject, ListPromptsResult,
    ListResourceTemplatesResult, ListResourcesResult, PaginatedRequestParam, ReadResourceRequestParam,
    ReadResourceResult, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::catalog::Category;
use crate::clients::substack::{Sorting, SubstackClient};
use crate::core::error::{SearchError, SourceError};
use crate::infra::config::{Config, SearchConfig};
use crate::infra::runtime::mcp_transport::ServerHandler;
use crate::search::shaping::{render, write_post};
use crate::search::{Aggregator, SearchRequest};
use crate::tools::substack::{prompts, resources};

const DEFAULT_POST_LIMIT: usize = 5;
const MAX_SUBSCRIPTIONS_SHOWN: usize = 10;

/// MCP handler exposing Substack's public data as tools.
#[derive(Clone)]
pub struct SubstackSvc {
    pub client: SubstackClient,
    pub aggregator: Aggregator<SubstackClient>,
}

impl SubstackSvc {
    pub fn new(client: SubstackClient, search: SearchConfig) -> Self {
        Self { aggregator: Aggregator::new(client.clone(), search), client }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let client = SubstackClient::from_config(&cfg.client)?;
        Ok(Self::new(client, cfg.search.clone()))
    }
}

impl ServerHandler for SubstackSvc {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Read-only access to public Substack newsletters: posts, post content, authors, \
                 recommendations, per-newsletter search and search across many newsletters. \
                 Post bodies are also readable as substack://post/<post url> resources."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult { prompts: prompts::list(), next_cursor: None })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        prompts::get(&request.name, request.arguments.as_ref())
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult { resources: Vec::new(), next_cursor: None })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult { resource_templates: resources::templates(), next_cursor: None })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        tracing::debug!(uri = %request.uri, "read_resource");
        resources::read(&self.client, &request.uri).await
    }
}

#[derive(Deserialize)]
struct NewsletterPostsArgs {
    newsletter_url: String,
    limit: Option<i64>,
    sorting: Option<String>,
}

#[derive(Deserialize)]
struct PostContentArgs {
    post_url: String,
}

#[derive(Deserialize)]
struct SearchNewsletterArgs {
    newsletter_url: String,
    search_query: String,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct AuthorArgs {
    author_username: String,
}

#[derive(Deserialize)]
struct NewsletterArgs {
    newsletter_url: String,
}

#[derive(Deserialize, Default)]
struct CatalogArgs {
    category: Option<String>,
}

fn parse_args<T: DeserializeOwned>(params: JsonObject) -> Result<T, McpError> {
    serde_json::from_value(serde_json::Value::Object(params))
        .map_err(|e| McpError::invalid_params(format!("invalid arguments: {e}"), None))
}

fn text(body: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(body)])
}

fn post_limit(requested: Option<i64>) -> usize {
    requested.map_or(DEFAULT_POST_LIMIT, |n| n.max(1) as usize)
}

fn upstream(e: SourceError) -> McpError {
    match e {
        SourceError::InvalidUrl(_) => McpError::invalid_params(e.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn rejected(e: SearchError) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

#[rmcp::tool_router]
impl SubstackSvc {
    #[rmcp::tool(
        name = "search_across_substacks",
        description = "Search many Substack newsletters for a keyword at once. Arguments: keyword (required), sources (optional list of newsletter URLs), category (optional: technology, politics, science, culture, economics; used when sources is omitted), limit_per_source (optional, default 5, max 10). Results are grouped by newsletter; newsletters that fail are reported, not fatal."
    )]
    async fn search_across_substacks(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let req: SearchRequest = parse_args(params.0)?;
        tracing::debug!(keyword = %req.keyword, category = ?req.category, "search_across_substacks invoked");
        let resp = self.aggregator.search(&req).await.map_err(rejected)?;
        Ok(text(render(&resp)))
    }

    #[rmcp::tool(
        name = "get_newsletter_posts",
        description = "Get recent posts from a Substack newsletter. Arguments: newsletter_url, limit (default 5), sorting (\"new\" or \"top\", default \"new\")."
    )]
    async fn get_newsletter_posts(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let args: NewsletterPostsArgs = parse_args(params.0)?;
        let sorting = match args.sorting.as_deref() {
            None => Sorting::New,
            Some(s) => Sorting::parse(s).ok_or_else(|| {
                McpError::invalid_params(format!("invalid sorting '{s}': expected \"new\" or \"top\""), None)
            })?,
        };
        let posts = self
            .client
            .get_posts(&args.newsletter_url, sorting, post_limit(args.limit))
            .await
            .map_err(upstream)?;
        if posts.is_empty() {
            return Ok(text("No posts found for this newsletter.".into()));
        }
        let mut out = format!("Posts from {}:\n\n", args.newsletter_url);
        for (i, post) in posts.iter().enumerate() {
            write_post(&mut out, i + 1, post);
            out.push('\n');
        }
        Ok(text(out))
    }

    #[rmcp::tool(
        name = "get_post_content",
        description = "Get the full content of a Substack post. Arguments: post_url (e.g. https://example.substack.com/p/post-slug)."
    )]
    async fn get_post_content(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let args: PostContentArgs = parse_args(params.0)?;
        let post = self.client.get_post(&args.post_url).await.map_err(upstream)?;
        let Some(body) = post.body_html.as_deref() else {
            return Ok(text(format!("Could not retrieve content for post: {}", args.post_url)));
        };
        let published = post
            .published
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Unknown date".into());
        let mut out = format!("# {}\n\n", post.title);
        if let Some(subtitle) = &post.subtitle {
            let _ = writeln!(out, "_{subtitle}_\n");
        }
        let _ = writeln!(out, "By: {}", post.author.as_deref().unwrap_or("Unknown author"));
        let _ = writeln!(out, "Published: {published}\n");
        out.push_str(body);
        Ok(text(out))
    }

    #[rmcp::tool(
        name = "search_newsletter",
        description = "Search for posts within one Substack newsletter. Arguments: newsletter_url, search_query, limit (default 5)."
    )]
    async fn search_newsletter(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let args: SearchNewsletterArgs = parse_args(params.0)?;
        if args.search_query.trim().is_empty() {
            return Err(rejected(SearchError::InvalidQuery));
        }
        let posts = self
            .client
            .search_posts(&args.newsletter_url, args.search_query.trim(), post_limit(args.limit))
            .await
            .map_err(upstream)?;
        if posts.is_empty() {
            return Ok(text(format!(
                "No results found for '{}' in {}",
                args.search_query, args.newsletter_url
            )));
        }
        let mut out = format!("Search results for '{}' in {}:\n\n", args.search_query, args.newsletter_url);
        for (i, post) in posts.iter().enumerate() {
            write_post(&mut out, i + 1, post);
            out.push('\n');
        }
        Ok(text(out))
    }

    #[rmcp::tool(
        name = "get_author_info",
        description = "Get a Substack author's public profile and subscriptions. Arguments: author_username."
    )]
    async fn get_author_info(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let args: AuthorArgs = parse_args(params.0)?;
        let profile = self
            .client
            .get_author_profile(&args.author_username)
            .await
            .map_err(upstream)?;
        let mut out = String::new();
        let _ = writeln!(out, "Author: {}", profile.name);
        let _ = writeln!(out, "Username: {}", profile.handle);
        let _ = writeln!(out, "Bio: {}\n", profile.bio.as_deref().unwrap_or("No biography available"));
        if !profile.subscriptions.is_empty() {
            out.push_str("Subscriptions:\n");
            for sub in profile.subscriptions.iter().take(MAX_SUBSCRIPTIONS_SHOWN) {
                match &sub.url {
                    Some(url) => {
                        let _ = writeln!(out, "- {} ({url})", sub.name);
                    }
                    None => {
                        let _ = writeln!(out, "- {}", sub.name);
                    }
                }
            }
        }
        Ok(text(out))
    }

    #[rmcp::tool(
        name = "get_newsletter_recommendations",
        description = "Get the newsletters a Substack publication recommends. Arguments: newsletter_url."
    )]
    async fn get_newsletter_recommendations(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let args: NewsletterArgs = parse_args(params.0)?;
        let recs = self
            .client
            .get_recommendations(&args.newsletter_url)
            .await
            .map_err(upstream)?;
        if recs.is_empty() {
            return Ok(text(format!("No recommendations found for {}", args.newsletter_url)));
        }
        let mut out = format!("Recommended newsletters for {}:\n\n", args.newsletter_url);
        for (i, rec) in recs.iter().enumerate() {
            match &rec.name {
                Some(name) => {
                    let _ = writeln!(out, "{}. {name} - {}", i + 1, rec.url);
                }
                None => {
                    let _ = writeln!(out, "{}. {}", i + 1, rec.url);
                }
            }
        }
        Ok(text(out))
    }

    #[rmcp::tool(
        name = "get_newsletter_authors",
        description = "Get the authors of a Substack newsletter. Arguments: newsletter_url."
    )]
    async fn get_newsletter_authors(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let args: NewsletterArgs = parse_args(params.0)?;
        let authors = self
            .client
            .get_authors(&args.newsletter_url)
            .await
            .map_err(upstream)?;
        if authors.is_empty() {
            return Ok(text(format!("No authors found for {}", args.newsletter_url)));
        }
        let mut out = format!("Authors of {}:\n\n", args.newsletter_url);
        for (i, author) in authors.iter().enumerate() {
            match &author.handle {
                Some(handle) => {
                    let _ = writeln!(out, "{}. {} (@{handle})", i + 1, author.name);
                }
                None => {
                    let _ = writeln!(out, "{}. {}", i + 1, author.name);
                }
            }
        }
        Ok(text(out))
    }

    #[rmcp::tool(
        name = "list_newsletter_catalog",
        description = "List the curated newsletters used by search_across_substacks when no sources are given. Arguments: category (optional)."
    )]
    async fn list_newsletter_catalog(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let args: CatalogArgs = parse_args(params.0)?;
        let categories = match args.category.as_deref() {
            Some(name) => vec![name.parse::<Category>().map_err(rejected)?],
            None => Category::ALL.to_vec(),
        };
        Ok(text(render_catalog(&categories)))
    }
}

pub fn render_catalog(categories: &[Category]) -> String {
    let mut out = String::from("Newsletter catalog:\n");
    for category in categories {
        let _ = writeln!(out, "\n{category}:");
        for newsletter in category.newsletters() {
            let _ = writeln!(out, "- {newsletter}");
        }
    }
    out
}

pub type SubstackRouter = ToolRouter<SubstackSvc>;

impl SubstackSvc {
    pub fn router() -> SubstackRouter {
        // Expose the macro-generated private tool_router
        Self::tool_router()
    }
}
