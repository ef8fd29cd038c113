use crate::infra::config::Config;
use crate::tools::substack::tool_router::SubstackSvc;
use std::net::SocketAddr;

pub async fn run_server() -> anyhow::Result<()> {
    let cfg = Config::from_env_and_toml()?;
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        max_limit = cfg.search.max_limit,
        max_in_flight = cfg.search.max_in_flight,
        "BOOT substack-mcp-gateway"
    );

    let svc = SubstackSvc::from_config(&cfg)?;

    // Stdio mode: run MCP over stdio ONLY (no HTTP).
    if cfg.mode == "stdio" {
        crate::infra::runtime::mcp_transport::serve_stdio(move || (svc, SubstackSvc::router()))
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = crate::infra::http_app::build_app(svc);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn invalid_mode_fails_before_binding() {
        std::env::set_var("MODE", "bogus");
        std::env::remove_var("SUBSTACK_MCP_CONFIG");
        let err = run_server().await.unwrap_err();
        assert!(err.to_string().contains("Invalid MODE"));
        std::env::remove_var("MODE");
    }
}
