//! Tool servers and the transports they are served over.

pub mod train;
pub mod weather;

use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::{ServerHandler, ServiceExt};
use std::net::SocketAddr;
use thiserror::Error;
use tracing::info;

pub use train::TrainServer;
pub use weather::WeatherServer;

/// Path the streamable HTTP endpoint is mounted on.
pub const HTTP_PATH: &str = "/mcp";

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("MCP initialization failed: {0}")]
    Init(String),
    #[error("Server task failed: {0}")]
    Task(String),
}

/// Transport a tool server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeMode {
    /// MCP over stdin/stdout, for servers launched by the client.
    Stdio,
    /// Streamable HTTP on the given address.
    Http(SocketAddr),
}

/// Run a tool server until its client disconnects (stdio) or Ctrl-C (HTTP).
pub async fn serve<S>(server: S, mode: ServeMode) -> Result<(), ServeError>
where
    S: ServerHandler + Clone,
{
    match mode {
        ServeMode::Stdio => {
            info!("Serving over stdio");
            let service = server
                .serve(rmcp::transport::stdio())
                .await
                .map_err(|e| ServeError::Init(e.to_string()))?;
            let reason = service
                .waiting()
                .await
                .map_err(|e| ServeError::Task(e.to_string()))?;
            info!("Stdio session ended: {:?}", reason);
        }
        ServeMode::Http(addr) => {
            let service = StreamableHttpService::new(
                move || Ok(server.clone()),
                LocalSessionManager::default().into(),
                Default::default(),
            );
            let router = axum::Router::new().nest_service(HTTP_PATH, service);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("Serving streamable HTTP on http://{}{}", listener.local_addr()?, HTTP_PATH);

            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
    }
    Ok(())
}
