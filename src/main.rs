//! Workflow chat - streaming client for a multi-agent research workflow
//!
//! Submits user turns to the workflow orchestrator, folds the streamed agent
//! output into per-thread conversation state, and serves that state to the UI.

mod api;
mod config;
mod conversation;
mod projector;
mod session;
mod store;
mod stream;
mod topology;

use api::{create_router, AppState};
use config::AppConfig;
use session::{HttpTransport, SessionManager};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use store::ThreadStore;
use topology::GraphTopology;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workflow_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;
    tracing::info!(
        orchestrator = %config.orchestrator_url,
        terminal_agent = %config.terminal.agent,
        stop_reason = %config.terminal.finish_reason,
        "Configuration loaded"
    );

    let transport = Arc::new(HttpTransport::new(&config)?);

    // The graph is fetched once; the built-in workflow stands in when the
    // orchestrator is unreachable
    let topology = match transport.fetch_topology().await {
        Ok(topology) => {
            tracing::info!(nodes = topology.nodes.len(), "Workflow graph loaded");
            topology
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch workflow graph, using built-in research workflow");
            GraphTopology::research_workflow()
        }
    };

    // Create application state
    let store = Arc::new(ThreadStore::new());
    let sessions = Arc::new(SessionManager::new(
        store,
        transport,
        config.workflow.clone(),
        config.terminal.clone(),
    ));
    let state = AppState::new(sessions.clone(), topology);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Workflow chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // SSE subscribers never close on their own, so stop serving outright
    // instead of draining connections
    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        () = shutdown_signal() => {}
    }

    // Leave no controller holding an orchestrator connection
    sessions.cancel_all().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
