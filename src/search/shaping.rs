use std::fmt::Write as _;

use crate::domain::{AggregateResponse, PostSummary, SourceStatus};

/// Render an aggregate search as one text reply, grouped by source.
///
/// Sources with matches are listed first. Sources that answered with nothing
/// and sources that could not be queried get separate summaries after them.
pub fn render(resp: &AggregateResponse) -> String {
    let total = resp.results.len();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Search results for '{}' across {} newsletter{} ({} searched, {} failed):",
        resp.query,
        total,
        if total == 1 { "" } else { "s" },
        resp.counts.successes,
        resp.counts.failures,
    );

    let mut empty: Vec<&str> = Vec::new();
    let mut failed: Vec<(&str, &str)> = Vec::new();
    let mut found = 0usize;

    for result in &resp.results {
        match &result.status {
            SourceStatus::Success { posts } if posts.is_empty() => empty.push(result.source.as_str()),
            SourceStatus::Success { posts } => {
                found += posts.len();
                let _ = writeln!(
                    out,
                    "\n## {} ({} result{})",
                    result.source,
                    posts.len(),
                    if posts.len() == 1 { "" } else { "s" }
                );
                for (i, post) in posts.iter().enumerate() {
                    write_post(&mut out, i + 1, post);
                }
            }
            SourceStatus::Failure { reason } => failed.push((result.source.as_str(), reason.as_str())),
        }
    }

    if found == 0 {
        let line = match (resp.counts.successes, resp.counts.failures) {
            (0, _) if total == 1 => "\nThe newsletter could not be searched.".to_string(),
            (0, _) => format!("\nNone of the {total} newsletters could be searched."),
            (_, 0) => format!("\nNo newsletters had posts matching '{}'.", resp.query),
            _ => format!(
                "\nNo posts matching '{}' in the newsletters that could be searched.",
                resp.query
            ),
        };
        out.push_str(&line);
        out.push('\n');
    }

    if !empty.is_empty() {
        let _ = writeln!(out, "\nNo matches in: {}", empty.join(", "));
    }

    if !failed.is_empty() {
        let _ = writeln!(
            out,
            "\nCould not search {} newsletter{}:",
            failed.len(),
            if failed.len() == 1 { "" } else { "s" }
        );
        for (source, reason) in failed {
            let _ = writeln!(out, "- {source}: {reason}");
        }
    }

    out
}

/// Numbered post entry shared with the single-newsletter tools.
pub fn write_post(out: &mut String, n: usize, post: &PostSummary) {
    let _ = writeln!(out, "{n}. {} - {}", post.title, post.published_label());
    let _ = writeln!(out, "   URL: {}", post.url);
    if let Some(excerpt) = &post.excerpt {
        let _ = writeln!(out, "   {excerpt}");
    }
}
