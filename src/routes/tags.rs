// SPDX-License-Identifier: MIT

//! Tag and ingredient reference data.
//!
//! Both listings are unpaginated raw arrays, readable by anyone.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{ApiError, Result};
use crate::models::{Ingredient, Tag};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tags/", get(list_tags))
        .route("/api/tags/{id}/", get(get_tag))
        .route("/api/ingredients/", get(list_ingredients))
        .route("/api/ingredients/{id}/", get(get_ingredient))
}

async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tag>>> {
    Ok(Json(state.db.list_tags().await?))
}

async fn get_tag(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Tag>> {
    let not_found = || ApiError::NotFound("Тег не найден.".to_string());
    let id: i64 = id.parse().map_err(|_| not_found())?;
    let tag = state.db.get_tag(id).await?.ok_or_else(not_found)?;
    Ok(Json(tag))
}

#[derive(Deserialize)]
struct IngredientsQuery {
    name: Option<String>,
}

/// Rank the name filter: prefix matches ahead of substring matches, both
/// groups alphabetical, non-matches dropped. Case-insensitivity must cover
/// non-ASCII names, so the match runs on Unicode-lowercased strings here
/// rather than in SQL.
fn rank_by_name(ingredients: Vec<Ingredient>, query: &str) -> Vec<Ingredient> {
    let needle = query.to_lowercase();
    let mut ranked: Vec<(u8, Ingredient)> = ingredients
        .into_iter()
        .filter_map(|ingredient| {
            let name = ingredient.name.to_lowercase();
            if name.starts_with(&needle) {
                Some((0, ingredient))
            } else if name.contains(&needle) {
                Some((1, ingredient))
            } else {
                None
            }
        })
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
    ranked.into_iter().map(|(_, ingredient)| ingredient).collect()
}

async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngredientsQuery>,
) -> Result<Json<Vec<Ingredient>>> {
    let ingredients = state.db.list_ingredients().await?;
    let ingredients = match query.name.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => rank_by_name(ingredients, name),
        None => ingredients,
    };
    Ok(Json(ingredients))
}

async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Ingredient>> {
    let not_found = || ApiError::NotFound("Ингредиент не найден.".to_string());
    let id: i64 = id.parse().map_err(|_| not_found())?;
    let ingredient = state.db.get_ingredient(id).await?.ok_or_else(not_found)?;
    Ok(Json(ingredient))
}
