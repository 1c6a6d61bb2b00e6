//! User model for storage and API.

use serde::Serialize;

use crate::models::recipe::RecipeShort;

/// User row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Email address, the authentication identifier
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 PHC hash
    pub password_hash: String,
    /// Media-relative avatar path, if one is set
    pub avatar: Option<String>,
}

/// User profile representation.
///
/// `is_subscribed` is computed against the requesting user and is always
/// false for anonymous requests.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    /// Absolute avatar URL or null
    pub avatar: Option<String>,
}

/// Subscription representation: the author's profile plus their recipes.
#[derive(Debug, Serialize)]
pub struct SubscriptionProfile {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShort>,
    /// Uncapped total, independent of any `recipes_limit`
    pub recipes_count: i64,
    pub avatar: Option<String>,
}
