//! MCP resources: post bodies addressed as `substack://post/<post url>`.

use rmcp::model::{
    AnnotateAble, RawResourceTemplate, ReadResourceResult, ResourceContents, ResourceTemplate,
};
use rmcp::ErrorData as McpError;

use crate::clients::substack::SubstackClient;
use crate::core::error::SourceError;

pub const POST_CONTENT_PREFIX: &str = "substack://post/";
const NO_CONTENT: &str = "No content available";

pub fn templates() -> Vec<ResourceTemplate> {
    vec![RawResourceTemplate {
        uri_template: format!("{POST_CONTENT_PREFIX}{{post_url}}"),
        name: "post_content".to_string(),
        title: None,
        description: Some("Body of a Substack post, addressed by its full post URL.".to_string()),
        mime_type: Some("text/html".to_string()),
    }
    .no_annotation()]
}

pub async fn read(client: &SubstackClient, uri: &str) -> Result<ReadResourceResult, McpError> {
    let post_url = uri
        .strip_prefix(POST_CONTENT_PREFIX)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| {
            McpError::resource_not_found(
                format!("unknown resource '{uri}'; expected {POST_CONTENT_PREFIX}<post url>"),
                None,
            )
        })?;

    let post = client.get_post(post_url).await.map_err(|e| match e {
        SourceError::NotFound(_) => McpError::resource_not_found(e.to_string(), None),
        SourceError::InvalidUrl(_) => McpError::invalid_params(e.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    })?;
    let body = post.body_html.unwrap_or_else(|| NO_CONTENT.to_string());

    Ok(ReadResourceResult { contents: vec![ResourceContents::text(body, uri)] })
}
