//! MCP prompts offered next to the tools.

use rmcp::model::{
    GetPromptResult, JsonObject, Prompt, PromptArgument, PromptMessage, PromptMessageContent,
    PromptMessageRole,
};
use rmcp::ErrorData as McpError;

pub const NEWSLETTER_SUMMARY: &str = "newsletter_summary";

pub fn list() -> Vec<Prompt> {
    vec![Prompt::new(
        NEWSLETTER_SUMMARY,
        Some("Summarise a Substack newsletter from its most recent posts."),
        Some(vec![PromptArgument {
            name: "newsletter_url".to_string(),
            title: None,
            description: Some("Newsletter URL, e.g. https://example.substack.com".to_string()),
            required: Some(true),
        }]),
    )]
}

pub fn get(name: &str, arguments: Option<&JsonObject>) -> Result<GetPromptResult, McpError> {
    if name != NEWSLETTER_SUMMARY {
        return Err(McpError::invalid_params(format!("unknown prompt '{name}'"), None));
    }
    let url = arguments
        .and_then(|args| args.get("newsletter_url"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| McpError::invalid_params("missing required argument 'newsletter_url'", None))?;

    Ok(GetPromptResult {
        description: Some(format!("Summary of {url}")),
        messages: vec![PromptMessage {
            role: PromptMessageRole::User,
            content: PromptMessageContent::text(summary_request(url)),
        }],
    })
}

fn summary_request(url: &str) -> String {
    format!(
        "I need to create a summary of the Substack newsletter at {url}.\n\
         Please gather the most recent posts, identify the main themes, and create a concise summary."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_prompt_is_listed_with_required_url() {
        let prompts = list();
        assert_eq!(prompts.len(), 1);
        let v = serde_json::to_value(&prompts[0]).unwrap();
        assert_eq!(v["name"], "newsletter_summary");
        assert_eq!(v["arguments"][0]["name"], "newsletter_url");
        assert_eq!(v["arguments"][0]["required"], true);
    }

    #[test]
    fn summary_prompt_mentions_the_newsletter() {
        let args = json!({"newsletter_url": " https://a.substack.com "});
        let result = get(NEWSLETTER_SUMMARY, args.as_object()).unwrap();
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["messages"][0]["role"], "user");
        let text = v["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.starts_with("I need to create a summary of the Substack newsletter at https://a.substack.com."));
    }

    #[test]
    fn missing_url_or_unknown_prompt_is_invalid_params() {
        let err = get(NEWSLETTER_SUMMARY, None).unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert!(err.message.contains("newsletter_url"));

        let blank = json!({"newsletter_url": "  "});
        assert!(get(NEWSLETTER_SUMMARY, blank.as_object()).is_err());

        let err = get("weekly_digest", None).unwrap_err();
        assert!(err.message.contains("unknown prompt 'weekly_digest'"));
    }
}
