//! Recipe, tag and ingredient models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::user::UserProfile;

/// Recipe row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    /// Media-relative image path
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub created_at: DateTime<Utc>,
}

/// Tag reference data.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Ingredient reference data. The name alone is not unique: the same name
/// may exist with several measurement units.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// Ingredient as it appears inside a recipe representation.
///
/// `id`, `name` and `measurement_unit` come from the ingredient master
/// record, `amount` from the join row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecipeIngredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Full recipe read representation.
#[derive(Debug, Serialize)]
pub struct RecipeRead {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserProfile,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    /// Absolute image URL
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

/// Short recipe representation used by membership responses and
/// subscription listings.
#[derive(Debug, Serialize)]
pub struct RecipeShort {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

/// One shopping-cart join row, input to the shopping-list aggregation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}
