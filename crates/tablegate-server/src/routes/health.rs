use axum::Json;
use serde_json::json;

/// Liveness probe.
pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
