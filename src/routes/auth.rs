// SPDX-License-Identifier: MIT

//! Token issuance and revocation.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ApiError, Result};
use crate::services::passwords::{generate_token_key, verify_password};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/token/login/", post(login))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/token/logout/", post(logout))
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

fn bad_credentials() -> ApiError {
    ApiError::field(
        "non_field_errors",
        "Невозможно войти с предоставленными учетными данными.",
    )
}

/// Issue (or re-issue) the caller's auth token.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<TokenResponse>> {
    let email = payload.get("email").and_then(Value::as_str);
    let password = payload.get("password").and_then(Value::as_str);
    let (Some(email), Some(password)) = (email, password) else {
        return Err(bad_credentials());
    };

    let user = state
        .db
        .get_user_by_email(email)
        .await?
        .ok_or_else(bad_credentials)?;
    if !verify_password(password, &user.password_hash) {
        return Err(bad_credentials());
    }

    let auth_token = state
        .db
        .get_or_create_token(user.id, &generate_token_key())
        .await?;

    tracing::info!(user_id = user.id, "Issued auth token");
    Ok(Json(TokenResponse { auth_token }))
}

/// Revoke the presented token.
async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<StatusCode> {
    // The protected layer guarantees a valid `Token <key>` header here
    let key = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Token "))
        .ok_or(ApiError::Unauthorized)?;

    state.db.delete_token(key.trim()).await?;
    Ok(StatusCode::NO_CONTENT)
}
