use std::process::ExitCode;

use substack_mcp_gateway::{cli, infra};

#[tokio::main]
async fn main() -> ExitCode {
    infra::logging::init();

    // Admin subcommands when given, otherwise boot the MCP server.
    if std::env::args_os().len() > 1 {
        return cli::run().await;
    }

    match infra::boot::run_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server exited with error");
            ExitCode::FAILURE
        }
    }
}
