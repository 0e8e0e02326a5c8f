use anyhow::Result;
use axum::Router;
use log::{info, warn};
use std::{net::SocketAddr, path::PathBuf};
use tower_http::services::ServeDir;

/// Configuration for the preview server
#[derive(Debug, Clone)]
pub struct PreviewServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Built site to serve
    pub root: PathBuf,
    /// Auto-open browser
    pub open: bool,
}

impl Default for PreviewServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            root: PathBuf::from("dist"),
            open: false,
        }
    }
}

impl PreviewServerConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

/// Serves the output directory read-only. Directory requests resolve to
/// their `index.html`.
pub struct PreviewServer {
    config: PreviewServerConfig,
}

impl PreviewServer {
    pub fn new(config: PreviewServerConfig) -> Self {
        Self { config }
    }

    pub fn router(&self) -> Router {
        Router::new().fallback_service(ServeDir::new(&self.config.root))
    }

    pub async fn run(self) -> Result<()> {
        if !self.config.root.is_dir() {
            return Err(anyhow::anyhow!(
                "Output directory does not exist: {} (run a build first)",
                self.config.root.display()
            ));
        }

        let listener = tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr: SocketAddr = listener.local_addr()?;

        info!("Serving {} at http://{}", self.config.root.display(), addr);

        if self.config.open {
            if let Err(e) = open::that(self.config.url()) {
                warn!("Failed to open browser: {}", e);
            }
        }

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
