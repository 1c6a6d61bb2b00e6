// SPDX-License-Identifier: MIT

//! Recipe routes: CRUD, membership toggles, short links and the
//! shopping-list export.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db::{MembershipKind, RecipeFilter};
use crate::error::{ApiError, Result};
use crate::middleware::auth::RequestContext;
use crate::models::{RecipeRead, RecipeRow};
use crate::pagination::{build_page, Page, PageQuery};
use crate::services::images::MediaStore;
use crate::services::recipe_read::{recipe_read_model, recipe_short};
use crate::services::recipe_write::validate_and_apply;
use crate::services::shopping_list::render_shopping_list;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipes/{id}/",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route("/api/recipes/{id}/get-link/", get(get_link))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/recipes/download_shopping_cart/",
            get(download_shopping_cart),
        )
        .route(
            "/api/recipes/{id}/favorite/",
            axum::routing::post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/api/recipes/{id}/shopping_cart/",
            axum::routing::post(add_to_cart).delete(remove_from_cart),
        )
}

fn recipe_not_found() -> ApiError {
    ApiError::NotFound("Рецепт не найден.".to_string())
}

async fn find_recipe(state: &AppState, raw_id: &str) -> Result<RecipeRow> {
    let id: i64 = raw_id.parse().map_err(|_| recipe_not_found())?;
    state
        .db
        .get_recipe(id)
        .await?
        .ok_or_else(recipe_not_found)
}

// ─── Listing & filtering ─────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RecipesQuery {
    page: Option<String>,
    limit: Option<String>,
    author: Option<String>,
    /// Multi-value tag slugs, OR-ed together
    #[serde(default)]
    tags: Vec<String>,
    is_favorited: Option<String>,
    is_in_shopping_cart: Option<String>,
}

fn parse_bool_param(raw: Option<&str>) -> Option<bool> {
    match raw {
        Some("1") | Some("true") | Some("True") => Some(true),
        Some("0") | Some("false") | Some("False") => Some(false),
        _ => None,
    }
}

async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<RecipesQuery>,
) -> Result<Json<Page<RecipeRead>>> {
    let page_query = PageQuery {
        page: query.page.clone(),
        limit: query.limit.clone(),
    };
    let actor = ctx.actor.map(|user| user.id);

    let mut filter = RecipeFilter {
        author: query.author.as_deref().and_then(|raw| raw.parse().ok()),
        tag_slugs: query.tags.clone(),
        ..RecipeFilter::default()
    };

    // Membership filters depend on who is asking: anonymous-and-true is an
    // empty set, anonymous-and-false a no-op.
    let mut empty_result = false;
    match parse_bool_param(query.is_favorited.as_deref()) {
        Some(true) => match actor {
            Some(user) => filter.favorited_by = Some(user),
            None => empty_result = true,
        },
        Some(false) => filter.not_favorited_by = actor,
        None => {}
    }
    match parse_bool_param(query.is_in_shopping_cart.as_deref()) {
        Some(true) => match actor {
            Some(user) => filter.in_cart_of = Some(user),
            None => empty_result = true,
        },
        Some(false) => filter.not_in_cart_of = actor,
        None => {}
    }

    let (recipes, count) = if empty_result {
        (Vec::new(), 0)
    } else {
        state
            .db
            .list_recipes(&filter, page_query.page_size(), page_query.offset()?)
            .await?
    };

    let mut results = Vec::with_capacity(recipes.len());
    for recipe in &recipes {
        results.push(recipe_read_model(&state.db, &state.config, recipe, actor).await?);
    }

    Ok(Json(build_page(
        results,
        count,
        &page_query,
        &state.config.site_url,
        "/api/recipes/",
    )?))
}

// ─── CRUD ────────────────────────────────────────────────────

async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let actor = ctx.require()?;
    let media = MediaStore::new(&state.config.media_root);

    let recipe_id = validate_and_apply(&state.db, &media, &payload, actor.id, None).await?;
    let recipe = state
        .db
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(recipe_not_found)?;

    tracing::info!(recipe_id, author_id = actor.id, "Created recipe");
    let model = recipe_read_model(&state.db, &state.config, &recipe, Some(actor.id)).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<RecipeRead>> {
    let recipe = find_recipe(&state, &id).await?;
    let model =
        recipe_read_model(&state.db, &state.config, &recipe, ctx.actor.map(|a| a.id)).await?;
    Ok(Json(model))
}

async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<RecipeRead>> {
    let actor = ctx.require()?;
    let recipe = find_recipe(&state, &id).await?;
    if recipe.author_id != actor.id {
        return Err(ApiError::PermissionDenied);
    }

    let media = MediaStore::new(&state.config.media_root);
    validate_and_apply(&state.db, &media, &payload, actor.id, Some(&recipe)).await?;

    let recipe = state
        .db
        .get_recipe(recipe.id)
        .await?
        .ok_or_else(recipe_not_found)?;
    let model = recipe_read_model(&state.db, &state.config, &recipe, Some(actor.id)).await?;
    Ok(Json(model))
}

async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let actor = ctx.require()?;
    let recipe = find_recipe(&state, &id).await?;
    if recipe.author_id != actor.id {
        return Err(ApiError::PermissionDenied);
    }

    state.db.delete_recipe(recipe.id).await?;
    // Post-delete hook: the stored image file goes with the row
    MediaStore::new(&state.config.media_root).remove(&recipe.image);

    tracing::info!(recipe_id = recipe.id, "Deleted recipe");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Short link ──────────────────────────────────────────────

/// Deterministic short link; nothing is stored.
async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let recipe = find_recipe(&state, &id).await?;
    Ok(Json(json!({
        "short-link": format!("{}/s/{}", state.config.site_url, recipe.id)
    })))
}

// ─── Favorites & shopping cart ───────────────────────────────

struct MembershipCase {
    kind: MembershipKind,
    already: &'static str,
    was_not: &'static str,
}

const FAVORITE_CASE: MembershipCase = MembershipCase {
    kind: MembershipKind::Favorite,
    already: "Рецепт уже в избранном.",
    was_not: "Рецепта не было в избранном.",
};

const CART_CASE: MembershipCase = MembershipCase {
    kind: MembershipKind::ShoppingCart,
    already: "Рецепт уже в списке покупок.",
    was_not: "Рецепта не было в списке покупок.",
};

async fn add_membership(
    state: &AppState,
    ctx: RequestContext,
    raw_id: &str,
    case: MembershipCase,
) -> Result<impl IntoResponse> {
    let actor = ctx.require()?;
    let recipe = find_recipe(state, raw_id).await?;

    if !state
        .db
        .add_membership(case.kind, actor.id, recipe.id)
        .await?
    {
        return Err(ApiError::BadRequest(case.already.to_string()));
    }
    Ok((
        StatusCode::CREATED,
        Json(recipe_short(&state.config, &recipe)),
    ))
}

async fn remove_membership(
    state: &AppState,
    ctx: RequestContext,
    raw_id: &str,
    case: MembershipCase,
) -> Result<StatusCode> {
    let actor = ctx.require()?;
    let recipe = find_recipe(state, raw_id).await?;

    if !state
        .db
        .remove_membership(case.kind, actor.id, recipe.id)
        .await?
    {
        return Err(ApiError::BadRequest(case.was_not.to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    add_membership(&state, ctx, &id, FAVORITE_CASE).await
}

async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    remove_membership(&state, ctx, &id, FAVORITE_CASE).await
}

async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    add_membership(&state, ctx, &id, CART_CASE).await
}

async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    remove_membership(&state, ctx, &id, CART_CASE).await
}

// ─── Shopping list export ────────────────────────────────────

async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse> {
    let actor = ctx.require()?;
    let rows = state.db.shopping_list_rows(actor.id).await?;
    let document = render_shopping_list(&rows);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart.txt\"",
            ),
        ],
        document,
    ))
}
