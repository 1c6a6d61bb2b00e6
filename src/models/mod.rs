// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod recipe;
pub mod user;

pub use recipe::{
    Ingredient, RecipeIngredient, RecipeRead, RecipeRow, RecipeShort, ShoppingListRow, Tag,
};
pub use user::{SubscriptionProfile, User, UserProfile};
