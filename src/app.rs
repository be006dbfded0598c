use crate::config::Config;
use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

pub struct AppStateInner {
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateBuilder {
    pub config: Option<Config>,
    pub http_client: Option<reqwest::Client>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            http_client: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> AppState {
        Arc::new(AppStateInner {
            config: Arc::new(self.config.unwrap_or_default()),
            http_client: self.http_client.unwrap_or_default(),
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn run(state: AppState) -> Result<()> {
    let app = create_router(state.clone());
    let addr: SocketAddr = state.config.http_addr.parse()?;
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            return Err(anyhow::anyhow!("Failed to bind to {}: {}", addr, e));
        }
    };

    match axum::serve(listener, app).await {
        Ok(_) => info!("Server shut down gracefully"),
        Err(e) => {
            tracing::error!("Server error: {}", e);
            return Err(anyhow::anyhow!("Server error: {}", e));
        }
    }
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration to allow cross-origin requests
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
            axum::http::header::ORIGIN,
        ]);

    crate::handler::router().with_state(state).layer(cors)
}
