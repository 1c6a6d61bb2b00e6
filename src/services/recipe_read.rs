// SPDX-License-Identifier: MIT

//! The recipe aggregation serializer: read representations assembled from
//! the normalized rows, as seen by an optional requesting user.

use anyhow::anyhow;

use crate::config::Config;
use crate::db::{Db, MembershipKind};
use crate::error::{ApiError, Result};
use crate::models::{RecipeRead, RecipeRow, RecipeShort, SubscriptionProfile, User, UserProfile};
use crate::services::images::media_url;

/// Profile representation of `user` as seen by `actor`.
pub async fn user_profile(
    db: &Db,
    config: &Config,
    user: &User,
    actor: Option<i64>,
) -> Result<UserProfile> {
    let is_subscribed = match actor {
        Some(viewer) => db.is_subscribed(viewer, user.id).await?,
        None => false,
    };
    Ok(UserProfile {
        email: user.email.clone(),
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
        avatar: user
            .avatar
            .as_deref()
            .map(|path| media_url(&config.site_url, path)),
    })
}

/// Full read representation of a recipe.
///
/// Read-only; an anonymous `actor` just defaults both membership flags to
/// false.
pub async fn recipe_read_model(
    db: &Db,
    config: &Config,
    recipe: &RecipeRow,
    actor: Option<i64>,
) -> Result<RecipeRead> {
    let author = db
        .get_user(recipe.author_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow!("recipe {} has no author row", recipe.id)))?;

    let (is_favorited, is_in_shopping_cart) = match actor {
        Some(user) => (
            db.has_membership(MembershipKind::Favorite, user, recipe.id)
                .await?,
            db.has_membership(MembershipKind::ShoppingCart, user, recipe.id)
                .await?,
        ),
        None => (false, false),
    };

    Ok(RecipeRead {
        id: recipe.id,
        tags: db.recipe_tags(recipe.id).await?,
        author: user_profile(db, config, &author, actor).await?,
        ingredients: db.recipe_ingredients(recipe.id).await?,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name.clone(),
        image: media_url(&config.site_url, &recipe.image),
        text: recipe.text.clone(),
        cooking_time: recipe.cooking_time,
    })
}

/// Short representation used by membership responses and subscriptions.
pub fn recipe_short(config: &Config, recipe: &RecipeRow) -> RecipeShort {
    RecipeShort {
        id: recipe.id,
        name: recipe.name.clone(),
        image: media_url(&config.site_url, &recipe.image),
        cooking_time: recipe.cooking_time,
    }
}

/// Subscription representation: the author's profile plus their recipes,
/// newest first, capped by `recipes_limit` when one was given.
pub async fn subscription_model(
    db: &Db,
    config: &Config,
    author: &User,
    actor: Option<i64>,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionProfile> {
    let profile = user_profile(db, config, author, actor).await?;
    let recipes = db
        .recipes_by_author(author.id, recipes_limit)
        .await?
        .iter()
        .map(|recipe| recipe_short(config, recipe))
        .collect();
    let recipes_count = db.count_recipes_by_author(author.id).await?;

    Ok(SubscriptionProfile {
        email: profile.email,
        id: profile.id,
        username: profile.username,
        first_name: profile.first_name,
        last_name: profile.last_name,
        is_subscribed: profile.is_subscribed,
        recipes,
        recipes_count,
        avatar: profile.avatar,
    })
}
