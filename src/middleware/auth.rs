// SPDX-License-Identifier: MIT

//! Token authentication middleware.
//!
//! Every request passes through [`identify`], which resolves the
//! `Authorization: Token <key>` header against the store into an explicit
//! [`RequestContext`] extension. Handlers read the context as a parameter;
//! there is no ambient "current user".

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::{ApiError, Result};
use crate::AppState;

/// Authenticated user attached to the request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i64,
}

/// Per-request identity. `actor` is `None` for anonymous requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    pub actor: Option<AuthUser>,
}

impl RequestContext {
    /// The authenticated actor, or the 401 this endpoint must answer with.
    pub fn require(&self) -> Result<AuthUser> {
        self.actor.ok_or(ApiError::Unauthorized)
    }
}

/// Resolve the token header into a [`RequestContext`].
///
/// An absent header (or a non-`Token` scheme) means anonymous; a present
/// but unknown key fails the request outright, public endpoints included.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let actor = match authorization.and_then(|value| value.strip_prefix("Token ")) {
        Some(key) => {
            let user = state
                .db
                .user_by_token(key.trim())
                .await?
                .ok_or(ApiError::InvalidToken)?;
            Some(AuthUser { id: user.id })
        }
        None => None,
    };

    request.extensions_mut().insert(RequestContext { actor });
    Ok(next.run(request).await)
}

/// Reject anonymous requests before the handler runs.
///
/// Layered onto the fully protected sub-router; `identify` has already run
/// by the time this executes, so the credential check happens before any
/// target-existence check in the handler.
pub async fn require_auth(request: Request, next: Next) -> Result<Response> {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .copied()
        .unwrap_or_default();
    ctx.require()?;
    Ok(next.run(request).await)
}
