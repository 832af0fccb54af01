//! Development server for Hotdeploy
//!
//! Serves the deployment directory with resource sync in front of it, so an
//! edited file in the source tree is picked up on the next request.

use std::net::SocketAddr;

use axum::Router;
use hotdeploy_core::{FilterConfig, HotdeployError};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::layer::ResourceSyncLayer;

/// Settings for the development server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Filter configuration; its destination root is the served directory
    pub filter: FilterConfig,
}

impl ServerConfig {
    /// Creates server settings bound to localhost on port 8080.
    pub fn new(filter: FilterConfig) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            filter,
        }
    }

    /// Address string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builds the router: deployment directory behind resource sync.
pub fn router(filter: FilterConfig) -> Router {
    let deploy_dir = ServeDir::new(filter.destination_root());

    Router::new()
        .fallback_service(deploy_dir)
        .layer(ResourceSyncLayer::new(filter))
        .layer(TraceLayer::new_for_http())
}

/// Runs the development server until the process is stopped.
///
/// # Errors
/// - `HotdeployError::Configuration` - Deployment directory does not exist
/// - `HotdeployError::Io` - Failed to bind or serve
pub async fn run_server(config: ServerConfig) -> Result<(), HotdeployError> {
    let deploy_dir = config.filter.destination_root().to_path_buf();
    if !deploy_dir.is_dir() {
        return Err(HotdeployError::Configuration {
            reason: format!("deployment directory {} does not exist", deploy_dir.display()),
        });
    }

    if config.filter.enabled {
        info!(
            "Resource sync enabled: {} -> {} ({} filter variables)",
            config.filter.source_root.display(),
            deploy_dir.display(),
            config.filter.variables.len()
        );
    } else {
        info!("Resource sync disabled, serving {} as-is", deploy_dir.display());
    }

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    let address: SocketAddr = listener.local_addr()?;
    info!("Hotdeploy server running on http://{address}");

    axum::serve(listener, router(config.filter)).await?;
    Ok(())
}
