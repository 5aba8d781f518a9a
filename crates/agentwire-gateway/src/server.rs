use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use agentwire_agent::graph::standard_graph;
use agentwire_core::config::AppConfig;
use agentwire_core::error::Result;
use agentwire_tools::ToolRegistry;

use crate::directory;
use crate::registry::ConnectionRegistry;
use crate::routes;
use crate::state::AppState;

/// WebSocket + HTTP gateway server built on axum.
pub struct GatewayServer {
    state: Arc<AppState>,
}

impl GatewayServer {
    /// Build the workflow graph, collaborator registry, and session registry.
    pub fn new(config: AppConfig) -> Result<Self> {
        let executor = standard_graph(&config.workflow)?;
        let tools = ToolRegistry::with_builtins(&config.tools)?;
        let registry = ConnectionRegistry::new(config.sessions.retain_closed);

        Ok(Self {
            state: Arc::new(AppState {
                config,
                registry: Arc::new(registry),
                executor: Arc::new(executor),
                tools: Arc::new(tools),
            }),
        })
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        self.state.registry.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(routes::health))
            // Streaming
            .route("/api/v1/ws", get(routes::ws_new_session))
            .route("/api/v1/ws/{session_id}", get(routes::ws_session))
            // Session directory
            .route("/api/v1/streaming/sessions", get(directory::list_sessions))
            .route(
                "/api/v1/streaming/sessions/{id}",
                get(directory::get_session).delete(directory::close_session),
            )
            .route(
                "/api/v1/streaming/broadcast",
                axum::routing::post(directory::broadcast),
            )
            // Collaborator dispatch
            .route(
                "/api/v1/actions",
                get(routes::list_actions).post(routes::dispatch_action),
            )
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let bind = &self.state.config.gateway.bind;
        let listener = TcpListener::bind(bind).await?;
        info!(bind = %bind, "Gateway listening");
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` fires.
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> anyhow::Result<()> {
        // Upgraded sockets outlive graceful shutdown unless closed explicitly.
        let registry = self.registry();
        let closer = shutdown.clone();
        tokio::spawn(async move {
            closer.cancelled().await;
            let closed = registry.close_all();
            info!(closed, "Closed live sessions for shutdown");
        });

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Gateway shut down");
        Ok(())
    }
}
