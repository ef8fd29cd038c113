use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::catalog::Category;
use crate::clients::substack::SubstackClient;
use crate::infra::config::Config;
use crate::search::shaping::render;
use crate::search::{Aggregator, SearchRequest};
use crate::tools::substack::tool_router::render_catalog;

#[derive(Parser)]
#[command(name = "substack-mcp-gateway")]
#[command(about = "Substack MCP Gateway - Admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Health check the service
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Show service status
    Status {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Print the curated newsletter catalog
    Catalog {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Search several newsletters for a keyword and print the grouped result
    Search {
        keyword: String,
        /// Newsletter URL to search (repeatable); defaults to the catalog
        #[arg(short, long = "source")]
        sources: Vec<String>,
        /// Catalog category used when no sources are given
        #[arg(short, long)]
        category: Option<String>,
        /// Maximum posts per newsletter
        #[arg(short, long)]
        limit: Option<i64>,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Status check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Catalog { category } => match catalog(category.as_deref()) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Search { keyword, sources, category, limit } => {
            let req = SearchRequest {
                keyword,
                sources: (!sources.is_empty()).then_some(sources),
                category,
                limit_per_source: limit,
            };
            match search(&req).await {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("❌ Search failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn health_check(url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("HTTP {}", response.status())
    }
}

fn validate_config() -> anyhow::Result<Config> {
    let cfg = Config::from_env_and_toml()?;
    cfg.validate()?;
    Ok(cfg)
}

async fn show_status(url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    let health_response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?;

    println!(
        "🏥 Health Status: {}",
        if health_response.status().is_success() {
            "✅ Healthy"
        } else {
            "❌ Unhealthy"
        }
    );

    let tools_response = client
        .post(format!("{}/mcp", url))
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream")
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "substack-mcp-gateway-cli", "version": env!("CARGO_PKG_VERSION") }
            }
        }))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await;

    match tools_response {
        Ok(resp) if resp.status().is_success() => println!("🔧 MCP: ✅ Available"),
        Ok(resp) => println!("🔧 MCP: ❌ HTTP {}", resp.status()),
        Err(_) => println!("🔧 MCP: ❌ Unavailable"),
    }

    let cfg = Config::from_env_and_toml()?;
    println!("\n📋 Configuration:");
    println!("  Mode: {}", cfg.mode);
    println!("  Port: {}", cfg.port);
    println!(
        "  Search limits: default {} / max {} per source, {} in flight, {}ms per source",
        cfg.search.default_limit, cfg.search.max_limit, cfg.search.max_in_flight, cfg.search.source_timeout_ms
    );
    println!(
        "  Log Level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    );

    Ok(())
}

fn catalog(category: Option<&str>) -> anyhow::Result<String> {
    let categories = match category {
        Some(name) => vec![name.parse::<Category>()?],
        None => Category::ALL.to_vec(),
    };
    Ok(render_catalog(&categories))
}

async fn search(req: &SearchRequest) -> anyhow::Result<String> {
    let cfg = validate_config()?;
    let client = SubstackClient::from_config(&cfg.client)?;
    let aggregator = Aggregator::new(client, cfg.search);
    let resp = aggregator.search(req).await?;
    Ok(render(&resp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[tokio::test]
    async fn health_check_fails_without_service() {
        let result = health_check("http://localhost:9999").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn health_check_ok_and_error_paths() {
        use httpmock::prelude::*;
        let server = MockServer::start();
        server.mock(|when, then| { when.method(GET).path("/healthz"); then.status(200).body("ok"); });
        assert!(health_check(&server.base_url()).await.is_ok());

        let bad = MockServer::start();
        bad.mock(|when, then| { when.method(GET).path("/healthz"); then.status(500); });
        assert!(health_check(&bad.base_url()).await.is_err());
    }

    #[test]
    #[serial]
    fn validate_config_valid() {
        env::remove_var("SUBSTACK_MCP_CONFIG");
        env::set_var("MODE", "server");
        env::set_var("PORT", "8080");

        assert!(validate_config().is_ok());

        env::remove_var("MODE");
        env::remove_var("PORT");
    }

    #[test]
    #[serial]
    fn validate_config_invalid_mode() {
        env::set_var("MODE", "invalid");

        let result = validate_config();
        assert!(result.unwrap_err().to_string().contains("Invalid MODE"));

        env::remove_var("MODE");
    }

    #[test]
    #[serial]
    fn validate_config_invalid_port() {
        env::set_var("MODE", "server");
        env::set_var("PORT", "0");

        let result = validate_config();
        assert!(result.unwrap_err().to_string().contains("PORT cannot be 0"));

        env::remove_var("MODE");
        env::remove_var("PORT");
    }

    #[test]
    #[serial]
    fn validate_config_rejects_default_above_max() {
        env::set_var("SEARCH_DEFAULT_LIMIT", "20");
        env::set_var("SEARCH_MAX_LIMIT", "10");

        let result = validate_config();
        assert!(result.unwrap_err().to_string().contains("default_limit"));

        env::remove_var("SEARCH_DEFAULT_LIMIT");
        env::remove_var("SEARCH_MAX_LIMIT");
    }

    #[tokio::test]
    async fn status_handles_non_200_health_and_mcp() {
        use httpmock::prelude::*;
        let server = MockServer::start();
        server.mock(|when, then| { when.method(GET).path("/healthz"); then.status(500).body("boom"); });
        server.mock(|when, then| { when.method(POST).path("/mcp"); then.status(500).body("boom"); });

        assert!(show_status(&server.base_url()).await.is_ok());
    }

    #[tokio::test]
    async fn status_fails_when_service_is_down() {
        assert!(show_status("http://localhost:9999").await.is_err());
    }

    #[test]
    fn catalog_renders_known_category_and_rejects_unknown() {
        let text = catalog(Some("culture")).unwrap();
        assert!(text.contains("culture:"));
        let err = catalog(Some("sports")).unwrap_err();
        assert!(err.to_string().contains("unknown category"));
    }

    #[tokio::test]
    #[serial]
    async fn search_prints_grouped_results() {
        use httpmock::prelude::*;
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/archive").query_param("search", "rust");
            then.status(200).json_body(serde_json::json!([{ "title": "Rust in 2024", "slug": "rust-2024" }]));
        });
        let req = SearchRequest {
            keyword: "rust".into(),
            sources: Some(vec![server.base_url()]),
            ..Default::default()
        };
        let text = search(&req).await.unwrap();
        assert!(text.contains("1. Rust in 2024"));
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_exit_codes() {
        let code = run_commands(Commands::Config { validate: true }).await;
        assert_eq!(code, ExitCode::SUCCESS);

        env::set_var("MODE", "nope");
        let code = run_commands(Commands::Config { validate: true }).await;
        assert_eq!(code, ExitCode::FAILURE);
        env::remove_var("MODE");

        let code = run_commands(Commands::Health { url: "http://localhost:9".into() }).await;
        assert_eq!(code, ExitCode::FAILURE);

        let code = run_commands(Commands::Catalog { category: None }).await;
        assert_eq!(code, ExitCode::SUCCESS);

        let code = run_commands(Commands::Search {
            keyword: "   ".into(),
            sources: vec![],
            category: None,
            limit: None,
        })
        .await;
        assert_eq!(code, ExitCode::FAILURE);
    }
}
