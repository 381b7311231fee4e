//! Admin JSON API: the operator-facing CRUD surface over connections, API
//! definitions, organizations and clients. The admin UI consuming these
//! endpoints lives outside this service.

pub mod connections;
pub mod definitions;
pub mod organizations;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/connections",
            get(connections::list).post(connections::create),
        )
        .route(
            "/api/admin/connections/{id}",
            put(connections::update).delete(connections::remove),
        )
        .route("/api/admin/connections/{id}/test", post(connections::test))
        .route("/api/admin/connections/{id}/tables", get(connections::tables))
        .route(
            "/api/admin/connections/{id}/tables/{table}/columns",
            get(connections::columns),
        )
        .route(
            "/api/admin/definitions",
            get(definitions::list).post(definitions::create),
        )
        .route(
            "/api/admin/definitions/{id}",
            put(definitions::update).delete(definitions::remove),
        )
        .route(
            "/api/admin/organizations",
            get(organizations::list).post(organizations::create),
        )
        .route(
            "/api/admin/organizations/{id}",
            put(organizations::update).delete(organizations::remove),
        )
        .route(
            "/api/admin/organizations/{id}/clients",
            get(organizations::list_clients).post(organizations::create_client),
        )
        .route("/api/admin/clients/{id}", delete(organizations::remove_client))
}
