use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::routes::{admin, dynamic, health};
use crate::state::AppState;

pub struct TablegateServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    Router::new()
        // Health endpoint
        .route("/healthz", get(health::healthz))
        // Dynamic data API
        .route(
            "/api/dynamic/{table_name}",
            get(dynamic::get_table)
                .put(dynamic::put_table)
                .delete(dynamic::delete_table),
        )
        // Token endpoint
        .route("/oauth2/token", post(tablegate_auth::token_handler))
        // Dynamically generated GraphQL schema
        .route("/graphql", post(tablegate_graphql::graphql_handler))
        // Admin CRUD surface
        .merge(admin::admin_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

impl TablegateServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            app: build_app(state),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
