//! itunes-mcp: JSON-RPC 2.0-over-stdio tool/resource server front-end over
//! `itunes-core`, for use by AI assistants.

use itunes_core::config::Config;
use itunes_core::Library;
use itunes_mcp::rpc::{self, Response, CODE_INVALID_PARAMS, CODE_METHOD_NOT_FOUND, CODE_PARSE_ERROR};
use itunes_mcp::server::{self, Server};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

/// How often the lookup cache's disk tier sweeps stale entries while this
/// process is running, per the design's "purged on a background sweep
/// (once per hour)" requirement.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging MUST go to stderr only: stdout is reserved for the JSON-RPC
    // wire, matching the stdio-transport convention.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ITUNES_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::resolve(None)?;
    info!(db_path = %config.db_path.display(), "opening library store");
    let library = Library::open(config).await?;
    let server = Arc::new(Server::new(library));

    server.sweep_cache();
    tokio::spawn({
        let server = Arc::clone(&server);
        async move {
            let mut ticker = tokio::time::interval(CACHE_SWEEP_INTERVAL);
            ticker.tick().await; // first tick fires immediately; skip it, we already swept above
            loop {
                ticker.tick().await;
                server.sweep_cache();
            }
        }
    });

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(&server, &line).await;
        let serialized = serde_json::to_string(&response)?;
        stdout.write_all(serialized.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}

async fn handle_line(server: &Server, line: &str) -> Response {
    let request: rpc::Request = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "malformed JSON-RPC request");
            return Response::failure(
                Value::Null,
                rpc::RpcError {
                    code: CODE_PARSE_ERROR,
                    message: format!("parse error: {e}"),
                    data: None,
                },
            );
        }
    };

    let id = request.id.clone().unwrap_or(Value::Null);

    match request.method.as_str() {
        "tools/list" => Response::success(id, server::Server::list_tools()),
        "resources/list" => Response::success(id, server::Server::list_resources()),
        "tools/call" => dispatch_tool_call(server, id, &request.params).await,
        "resources/read" => dispatch_resource_read(server, id, &request.params).await,
        other => Response::failure(
            id,
            rpc::RpcError {
                code: CODE_METHOD_NOT_FOUND,
                message: format!("unknown method: {other}"),
                data: None,
            },
        ),
    }
}

async fn dispatch_tool_call(server: &Server, id: Value, params: &Value) -> Response {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Response::failure(
            id,
            rpc::RpcError {
                code: CODE_INVALID_PARAMS,
                message: "tools/call requires a string \"name\"".to_string(),
                data: None,
            },
        );
    };
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    match server.call_tool(name, &arguments).await {
        Ok(result) => Response::success(id, result),
        Err(e) => Response::failure(id, e),
    }
}

async fn dispatch_resource_read(server: &Server, id: Value, params: &Value) -> Response {
    let Some(uri) = params.get("uri").and_then(Value::as_str) else {
        return Response::failure(
            id,
            rpc::RpcError {
                code: CODE_INVALID_PARAMS,
                message: "resources/read requires a string \"uri\"".to_string(),
                data: None,
            },
        );
    };

    match server.read_resource(uri).await {
        Ok(result) => Response::success(id, result),
        Err(e) => Response::failure(id, e),
    }
}
