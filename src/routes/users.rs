// SPDX-License-Identifier: MIT

//! User routes: registration, profiles, avatar, password, subscriptions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::{ApiError, FieldErrors, Result};
use crate::middleware::auth::RequestContext;
use crate::models::{SubscriptionProfile, UserProfile};
use crate::pagination::{build_page, Page, PageQuery};
use crate::services::images::{decode_data_uri, media_url, MediaStore};
use crate::services::passwords::{hash_password, verify_password};
use crate::services::recipe_read::{subscription_model, user_profile};
use crate::AppState;

const REQUIRED: &str = "Обязательное поле.";
const BLANK: &str = "Это поле не может быть пустым.";
const NOT_A_STRING: &str = "Не валидная строка.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/", get(list_users).post(register))
        .route("/api/users/{id}/", get(get_user))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/me/", get(me))
        .route("/api/users/me/avatar/", put(set_avatar).delete(delete_avatar))
        .route("/api/users/set_password/", post(set_password))
        .route("/api/users/subscriptions/", get(subscriptions))
        .route(
            "/api/users/{id}/subscribe/",
            post(subscribe).delete(unsubscribe),
        )
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("Пользователь не найден.".to_string())
}

/// Pull a required string field out of a raw JSON payload, recording the
/// error when it is missing, blank or not a string.
fn required_str(payload: &Value, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match payload.get(field) {
        None | Some(Value::Null) => {
            errors.insert(field.to_string(), vec![REQUIRED.to_string()]);
            None
        }
        Some(Value::String(text)) if text.trim().is_empty() => {
            errors.insert(field.to_string(), vec![BLANK.to_string()]);
            None
        }
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            errors.insert(field.to_string(), vec![NOT_A_STRING.to_string()]);
            None
        }
    }
}

/// Fold `validator` output into the field-keyed map, keeping any error the
/// manual pass already recorded for a field.
fn merge_validator_errors(errors: &mut FieldErrors, validation: ValidationErrors) {
    for (field, kind) in validation.into_errors() {
        let key = field.to_string();
        if errors.contains_key(&key) {
            continue;
        }
        if let ValidationErrorsKind::Field(field_errors) = kind {
            let messages = field_errors
                .into_iter()
                .map(|error| {
                    error
                        .message
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| "Введите правильное значение.".to_string())
                })
                .collect();
            errors.insert(key, messages);
        }
    }
}

fn validate_username_chars(username: &str) -> std::result::Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_username");
        error.message = Some("Имя пользователя содержит недопустимые символы.".into());
        Err(error)
    }
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Validate)]
struct NewUser {
    #[validate(
        length(
            max = 254,
            message = "Убедитесь, что это значение содержит не более 254 символов."
        ),
        email(message = "Введите правильный адрес электронной почты.")
    )]
    email: String,
    #[validate(
        length(
            max = 150,
            message = "Убедитесь, что это значение содержит не более 150 символов."
        ),
        custom(function = validate_username_chars)
    )]
    username: String,
    #[validate(length(
        max = 150,
        message = "Убедитесь, что это значение содержит не более 150 символов."
    ))]
    first_name: String,
    #[validate(length(
        max = 150,
        message = "Убедитесь, что это значение содержит не более 150 символов."
    ))]
    last_name: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let mut errors = FieldErrors::new();
    let email = required_str(&payload, "email", &mut errors);
    let username = required_str(&payload, "username", &mut errors);
    let first_name = required_str(&payload, "first_name", &mut errors);
    let last_name = required_str(&payload, "last_name", &mut errors);
    let password = required_str(&payload, "password", &mut errors);

    let new_user = NewUser {
        email: email.unwrap_or_default(),
        username: username.unwrap_or_default(),
        first_name: first_name.unwrap_or_default(),
        last_name: last_name.unwrap_or_default(),
    };
    if let Err(validation) = new_user.validate() {
        merge_validator_errors(&mut errors, validation);
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let password_hash = hash_password(&password.expect("validated"))?;
    let user = state
        .db
        .create_user(
            &new_user.email,
            &new_user.username,
            &new_user.first_name,
            &new_user.last_name,
            &password_hash,
        )
        .await?;

    tracing::info!(user_id = user.id, "Registered user");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}

// ─── Profiles ────────────────────────────────────────────────

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserProfile>>> {
    let (users, count) = state
        .db
        .list_users(query.page_size(), query.offset()?)
        .await?;

    let actor = ctx.actor.map(|user| user.id);
    let mut profiles = Vec::with_capacity(users.len());
    for user in &users {
        profiles.push(user_profile(&state.db, &state.config, user, actor).await?);
    }

    Ok(Json(build_page(
        profiles,
        count,
        &query,
        &state.config.site_url,
        "/api/users/",
    )?))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    let id: i64 = id.parse().map_err(|_| user_not_found())?;
    let user = state.db.get_user(id).await?.ok_or_else(user_not_found)?;
    let profile =
        user_profile(&state.db, &state.config, &user, ctx.actor.map(|a| a.id)).await?;
    Ok(Json(profile))
}

async fn me(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<UserProfile>> {
    let actor = ctx.require()?;
    let user = state
        .db
        .get_user(actor.id)
        .await?
        .ok_or_else(user_not_found)?;
    let profile = user_profile(&state.db, &state.config, &user, Some(actor.id)).await?;
    Ok(Json(profile))
}

// ─── Avatar ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

async fn set_avatar(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<Value>,
) -> Result<Json<AvatarResponse>> {
    let actor = ctx.require()?;

    let Some(value) = payload.get("avatar") else {
        return Err(ApiError::field("avatar", REQUIRED));
    };
    let data = value
        .as_str()
        .ok_or_else(|| ApiError::field("avatar", "Неверный формат изображения."))?;
    let decoded =
        decode_data_uri(data).map_err(|err| ApiError::field("avatar", err.to_string()))?;

    let media = MediaStore::new(&state.config.media_root);
    let path = media
        .save("users", &decoded)
        .map_err(|err| ApiError::Internal(err.into()))?;
    state.db.set_avatar(actor.id, Some(&path)).await?;

    Ok(Json(AvatarResponse {
        avatar: media_url(&state.config.site_url, &path),
    }))
}

async fn delete_avatar(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<StatusCode> {
    let actor = ctx.require()?;
    let user = state
        .db
        .get_user(actor.id)
        .await?
        .ok_or_else(user_not_found)?;

    if let Some(avatar) = &user.avatar {
        MediaStore::new(&state.config.media_root).remove(avatar);
        state.db.set_avatar(actor.id, None).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ─── Password ────────────────────────────────────────────────

async fn set_password(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<Value>,
) -> Result<StatusCode> {
    let actor = ctx.require()?;

    let mut errors = FieldErrors::new();
    let current_password = required_str(&payload, "current_password", &mut errors);
    let new_password = required_str(&payload, "new_password", &mut errors);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = state
        .db
        .get_user(actor.id)
        .await?
        .ok_or_else(user_not_found)?;
    if !verify_password(&current_password.expect("validated"), &user.password_hash) {
        return Err(ApiError::field("current_password", "Неверный текущий пароль."));
    }

    let password_hash = hash_password(&new_password.expect("validated"))?;
    state.db.set_password(actor.id, &password_hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Subscriptions ───────────────────────────────────────────

/// `recipes_limit` caps the nested recipe list, and only applies when it
/// parses as a non-negative integer; anything else is ignored.
fn parse_recipes_limit(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.parse::<i64>().ok())
        .filter(|limit| *limit >= 0)
}

#[derive(Deserialize)]
struct SubscribeQuery {
    recipes_limit: Option<String>,
}

async fn subscribe(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(query): Query<SubscribeQuery>,
) -> Result<impl IntoResponse> {
    let actor = ctx.require()?;
    let author_id: i64 = id.parse().map_err(|_| user_not_found())?;
    let author = state
        .db
        .get_user(author_id)
        .await?
        .ok_or_else(user_not_found)?;

    // Rejected before the membership-state check, whatever the state is
    if author.id == actor.id {
        return Err(ApiError::BadRequest(
            "Нельзя подписаться на самого себя.".to_string(),
        ));
    }
    if !state.db.subscribe(actor.id, author.id).await? {
        return Err(ApiError::BadRequest(
            "Вы уже подписаны на этого пользователя.".to_string(),
        ));
    }

    tracing::info!(user_id = actor.id, author_id = author.id, "Subscribed");
    let model = subscription_model(
        &state.db,
        &state.config,
        &author,
        Some(actor.id),
        parse_recipes_limit(query.recipes_limit.as_deref()),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(model)))
}

async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let actor = ctx.require()?;
    let author_id: i64 = id.parse().map_err(|_| user_not_found())?;
    let author = state
        .db
        .get_user(author_id)
        .await?
        .ok_or_else(user_not_found)?;

    if !state.db.unsubscribe(actor.id, author.id).await? {
        return Err(ApiError::BadRequest("Подписка не найдена.".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct SubscriptionsQuery {
    page: Option<String>,
    limit: Option<String>,
    recipes_limit: Option<String>,
}

async fn subscriptions(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<SubscriptionsQuery>,
) -> Result<Json<Page<SubscriptionProfile>>> {
    let actor = ctx.require()?;
    let page_query = PageQuery {
        page: query.page.clone(),
        limit: query.limit.clone(),
    };

    let (authors, count) = state
        .db
        .subscribed_authors(actor.id, page_query.page_size(), page_query.offset()?)
        .await?;

    let recipes_limit = parse_recipes_limit(query.recipes_limit.as_deref());
    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        results.push(
            subscription_model(&state.db, &state.config, author, Some(actor.id), recipes_limit)
                .await?,
        );
    }

    Ok(Json(build_page(
        results,
        count,
        &page_query,
        &state.config.site_url,
        "/api/users/subscriptions/",
    )?))
}
