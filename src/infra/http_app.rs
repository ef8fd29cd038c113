use axum::{
    routing::{any_service, get},
    Router,
};
use std::sync::Arc;

use crate::infra::runtime::mcp_transport::{make_streamable_http_service, LocalSessionManager};
use crate::tools::substack::tool_router::SubstackSvc;

/// `/healthz` + streamable MCP at `/mcp`. Each MCP session gets its own
/// handler clone; the underlying HTTP client pool is shared.
pub fn build_app(svc: SubstackSvc) -> Router {
    let session_mgr = Arc::new(LocalSessionManager::default());
    let factory = move || (svc.clone(), SubstackSvc::router());
    let mcp_service = make_streamable_http_service(factory, session_mgr);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route_service("/mcp", any_service(mcp_service))
}
