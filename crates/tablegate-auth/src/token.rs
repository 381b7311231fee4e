//! OAuth 2.0 token endpoint handler.
//!
//! Supports the `client_credentials` grant only:
//!
//! ```ignore
//! POST /oauth2/token
//! Content-Type: application/x-www-form-urlencoded
//!
//! grant_type=client_credentials&client_id=...&client_secret=...
//! ```
//!
//! Validation order is fixed: grant type first, then client lookup, then
//! secret match.

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clients::ClientDirectory;
use crate::error::AuthError;
use crate::jwt::JwtService;

/// State required for the token endpoint.
#[derive(Clone)]
pub struct TokenState {
    pub directory: Arc<ClientDirectory>,
    pub jwt: Arc<JwtService>,
}

/// Form body of a token request. Missing fields default to empty strings
/// so validation order stays deterministic.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub grant_type: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

#[derive(Debug, Serialize)]
struct TokenErrorBody {
    error: &'static str,
}

/// OAuth 2.0 token endpoint handler.
pub async fn token_handler(
    State(state): State<TokenState>,
    Form(request): Form<TokenRequest>,
) -> Response {
    match process(&state, &request).await {
        Ok(response) => {
            info!(client_id = %request.client_id, "Token issued");
            (
                StatusCode::OK,
                [
                    ("Cache-Control", "no-store"),
                    ("Pragma", "no-cache"),
                ],
                Json(response),
            )
                .into_response()
        }
        Err(e) => {
            warn!(
                client_id = %request.client_id,
                grant_type = %request.grant_type,
                error = %e,
                "Token request failed"
            );
            token_error_response(&e)
        }
    }
}

async fn process(state: &TokenState, request: &TokenRequest) -> Result<TokenResponse, AuthError> {
    // Grant type is checked before any client lookup.
    if request.grant_type != "client_credentials" {
        return Err(AuthError::unsupported_grant_type(&request.grant_type));
    }

    let client = state
        .directory
        .authenticate(&request.client_id, &request.client_secret)
        .await?;

    let (access_token, expires_in) = state
        .jwt
        .issue(&client.client_id)
        .map_err(|e| AuthError::internal(e.to_string()))?;

    Ok(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in,
    })
}

fn token_error_response(error: &AuthError) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [("Cache-Control", "no-store"), ("Pragma", "no-cache")],
        Json(TokenErrorBody {
            error: error.error_code(),
        }),
    )
        .into_response()
}
