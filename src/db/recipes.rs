// SPDX-License-Identifier: MIT

//! Recipe graph, reference data and membership operations.

use std::collections::HashSet;

use sqlx::{QueryBuilder, Sqlite};

use crate::db::Db;
use crate::error::Result;
use crate::models::{Ingredient, RecipeIngredient, RecipeRow, ShoppingListRow, Tag};

/// Filter set for the recipe listing. Every predicate is optional and they
/// compose with AND; `tag_slugs` is OR within itself.
#[derive(Debug, Default)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<i64>,
    pub not_favorited_by: Option<i64>,
    pub in_cart_of: Option<i64>,
    pub not_in_cart_of: Option<i64>,
}

/// The two per-user recipe membership tables share one shape; the kind
/// picks the table.
#[derive(Debug, Clone, Copy)]
pub enum MembershipKind {
    Favorite,
    ShoppingCart,
}

impl MembershipKind {
    fn table(self) -> &'static str {
        match self {
            MembershipKind::Favorite => "favorites",
            MembershipKind::ShoppingCart => "shopping_cart",
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &RecipeFilter) {
    if let Some(author) = filter.author {
        qb.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tag_slugs.is_empty() {
        qb.push(
            " AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt \
             JOIN tags t ON t.id = rt.tag_id WHERE t.slug IN (",
        );
        let mut separated = qb.separated(", ");
        for slug in &filter.tag_slugs {
            separated.push_bind(slug.clone());
        }
        qb.push("))");
    }
    if let Some(user) = filter.favorited_by {
        qb.push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(user)
            .push(")");
    }
    if let Some(user) = filter.not_favorited_by {
        qb.push(
            " AND NOT EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ",
        )
        .push_bind(user)
        .push(")");
    }
    if let Some(user) = filter.in_cart_of {
        qb.push(
            " AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ",
        )
        .push_bind(user)
        .push(")");
    }
    if let Some(user) = filter.not_in_cart_of {
        qb.push(
            " AND NOT EXISTS \
             (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ",
        )
        .push_bind(user)
        .push(")");
    }
}

impl Db {
    // ─── Tags ────────────────────────────────────────────────────

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY id")
            .fetch_all(self.pool())
            .await?;
        Ok(tags)
    }

    pub async fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(tag)
    }

    pub async fn create_tag(&self, name: &str, slug: &str) -> Result<Tag> {
        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, slug) VALUES (?, ?) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool())
        .await?;
        Ok(tag)
    }

    pub async fn existing_tag_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM tags WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        qb.push(")");
        let found: Vec<i64> = qb.build_query_scalar().fetch_all(self.pool()).await?;
        Ok(found.into_iter().collect())
    }

    // ─── Ingredients ─────────────────────────────────────────────

    pub async fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(ingredients)
    }

    pub async fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(ingredient)
    }

    pub async fn create_ingredient(&self, name: &str, measurement_unit: &str) -> Result<Ingredient> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?) \
             RETURNING id, name, measurement_unit",
        )
        .bind(name)
        .bind(measurement_unit)
        .fetch_one(self.pool())
        .await?;
        Ok(ingredient)
    }

    pub async fn existing_ingredient_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM ingredients WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        qb.push(")");
        let found: Vec<i64> = qb.build_query_scalar().fetch_all(self.pool()).await?;
        Ok(found.into_iter().collect())
    }

    // ─── Recipes ─────────────────────────────────────────────────

    pub async fn get_recipe(&self, id: i64) -> Result<Option<RecipeRow>> {
        let recipe = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(recipe)
    }

    /// Filtered recipe page, newest first, plus the total match count.
    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RecipeRow>, i64)> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT r.* FROM recipes r WHERE 1 = 1");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY r.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let recipes = qb
            .build_query_as::<RecipeRow>()
            .fetch_all(self.pool())
            .await?;

        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM recipes r WHERE 1 = 1");
        push_filters(&mut count_qb, filter);
        let count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await?;

        Ok((recipes, count))
    }

    /// An author's recipes, newest first. `limit` of `None` returns all.
    pub async fn recipes_by_author(
        &self,
        author_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<RecipeRow>> {
        let recipes = sqlx::query_as::<_, RecipeRow>(
            "SELECT * FROM recipes WHERE author_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(author_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(self.pool())
        .await?;
        Ok(recipes)
    }

    pub async fn count_recipes_by_author(&self, author_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    /// Insert a recipe with its tag links and ingredient rows in one
    /// transaction.
    pub async fn create_recipe(
        &self,
        author_id: i64,
        name: &str,
        image: &str,
        text: &str,
        cooking_time: i64,
        tags: &[i64],
        ingredients: &[(i64, i64)],
    ) -> Result<i64> {
        let mut tx = self.pool().begin().await?;

        let recipe_id: i64 = sqlx::query_scalar(
            "INSERT INTO recipes (author_id, name, image, text, cooking_time, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(author_id)
        .bind(name)
        .bind(image)
        .bind(text)
        .bind(cooking_time)
        .bind(chrono::Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for tag_id in tags {
            sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?, ?)")
                .bind(recipe_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }
        for (ingredient_id, amount) in ingredients {
            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) \
                 VALUES (?, ?, ?)",
            )
            .bind(recipe_id)
            .bind(ingredient_id)
            .bind(amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(recipe_id)
    }

    /// Update scalar fields and fully replace both association sets in one
    /// transaction, so a reader never observes tags from one version and
    /// ingredients from another.
    pub async fn update_recipe(
        &self,
        recipe_id: i64,
        name: &str,
        image: &str,
        text: &str,
        cooking_time: i64,
        tags: &[i64],
        ingredients: &[(i64, i64)],
    ) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("UPDATE recipes SET name = ?, image = ?, text = ?, cooking_time = ? WHERE id = ?")
            .bind(name)
            .bind(image)
            .bind(text)
            .bind(cooking_time)
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        for tag_id in tags {
            sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?, ?)")
                .bind(recipe_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        for (ingredient_id, amount) in ingredients {
            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) \
                 VALUES (?, ?, ?)",
            )
            .bind(recipe_id)
            .bind(ingredient_id)
            .bind(amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a recipe; join rows and membership rows cascade.
    pub async fn delete_recipe(&self, recipe_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    pub async fn recipe_tags(&self, recipe_id: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name, t.slug FROM recipe_tags rt \
             JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = ? ORDER BY t.id",
        )
        .bind(recipe_id)
        .fetch_all(self.pool())
        .await?;
        Ok(tags)
    }

    pub async fn recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
        let ingredients = sqlx::query_as::<_, RecipeIngredient>(
            "SELECT i.id, i.name, i.measurement_unit, ri.amount \
             FROM recipe_ingredients ri \
             JOIN ingredients i ON i.id = ri.ingredient_id \
             WHERE ri.recipe_id = ? ORDER BY ri.id",
        )
        .bind(recipe_id)
        .fetch_all(self.pool())
        .await?;
        Ok(ingredients)
    }

    // ─── Favorites & shopping cart ───────────────────────────────

    pub async fn has_membership(
        &self,
        kind: MembershipKind,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = ? AND recipe_id = ?)",
            kind.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(self.pool())
        .await?;
        Ok(exists != 0)
    }

    /// Create the membership row. Returns false when it already existed;
    /// a concurrent duplicate loses on the UNIQUE constraint and lands in
    /// the same branch.
    pub async fn add_membership(
        &self,
        kind: MembershipKind,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES (?, ?) \
             ON CONFLICT (user_id, recipe_id) DO NOTHING",
            kind.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the membership row. Returns false when there was none.
    pub async fn remove_membership(
        &self,
        kind: MembershipKind,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = ? AND recipe_id = ?",
            kind.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every ingredient row of every recipe in the user's cart, newest
    /// recipe first, join rows in insertion order. Input to the
    /// shopping-list aggregation.
    pub async fn shopping_list_rows(&self, user_id: i64) -> Result<Vec<ShoppingListRow>> {
        let rows = sqlx::query_as::<_, ShoppingListRow>(
            "SELECT i.name, i.measurement_unit, ri.amount \
             FROM shopping_cart sc \
             JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id \
             JOIN ingredients i ON i.id = ri.ingredient_id \
             WHERE sc.user_id = ? \
             ORDER BY sc.recipe_id DESC, ri.id",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
