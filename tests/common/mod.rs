// SPDX-License-Identifier: MIT

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use recipebox::config::Config;
use recipebox::db::Db;
use recipebox::models::{Ingredient, Tag, User};
use recipebox::routes::create_router;
use recipebox::services::passwords::{generate_token_key, hash_password};
use recipebox::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// 1x1 transparent PNG, the canonical valid image payload.
#[allow(dead_code)]
pub const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "password123";

/// Create a test app over a fresh in-memory store and an isolated media
/// directory. Returns the router and the shared state.
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config {
        media_root: std::env::temp_dir().join(format!("recipebox-test-{}", uuid::Uuid::new_v4())),
        ..Config::default()
    };
    let db = Db::open_in_memory()
        .await
        .expect("Failed to open in-memory database");

    let state = Arc::new(AppState { config, db });
    (create_router(state.clone()), state)
}

/// Seed a user directly in the store and issue an auth token for them.
#[allow(dead_code)]
pub async fn seed_user(state: &Arc<AppState>, username: &str) -> (User, String) {
    let password_hash = hash_password(TEST_PASSWORD).unwrap();
    let user = state
        .db
        .create_user(
            &format!("{username}@example.org"),
            username,
            "Имя",
            "Фамилия",
            &password_hash,
        )
        .await
        .expect("Failed to seed user");
    let token = state
        .db
        .get_or_create_token(user.id, &generate_token_key())
        .await
        .expect("Failed to seed token");
    (user, token)
}

#[allow(dead_code)]
pub async fn seed_tag(state: &Arc<AppState>, name: &str, slug: &str) -> Tag {
    state
        .db
        .create_tag(name, slug)
        .await
        .expect("Failed to seed tag")
}

#[allow(dead_code)]
pub async fn seed_ingredient(state: &Arc<AppState>, name: &str, unit: &str) -> Ingredient {
    state
        .db
        .create_ingredient(name, unit)
        .await
        .expect("Failed to seed ingredient")
}

/// Seed a recipe directly in the store, bypassing the HTTP layer.
#[allow(dead_code)]
pub async fn seed_recipe(
    state: &Arc<AppState>,
    author: &User,
    name: &str,
    tags: &[i64],
    ingredients: &[(i64, i64)],
) -> i64 {
    state
        .db
        .create_recipe(
            author.id,
            name,
            "recipes/images/seed.png",
            "Описание рецепта",
            10,
            tags,
            ingredients,
        )
        .await
        .expect("Failed to seed recipe")
}

/// Build a request. `token` adds the `Authorization: Token` header, `body`
/// is sent as JSON.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn send(app: &axum::Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
