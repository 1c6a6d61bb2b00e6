// SPDX-License-Identifier: MIT

//! User, auth-token and subscription operations.

use crate::db::{unique_violation, Db};
use crate::error::{ApiError, Result};
use crate::models::User;

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, password_hash, avatar";

impl Db {
    // ─── Users ───────────────────────────────────────────────────

    /// Insert a new user. Duplicate email/username surfaces as a
    /// field-keyed validation error, backed by the UNIQUE constraints.
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<User> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, username, first_name, last_name, password_hash) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, email, username, first_name, last_name, password_hash, avatar",
        )
        .bind(email)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .fetch_one(self.pool())
        .await;

        result.map_err(|err| match unique_violation(&err) {
            Some(message) if message.contains("users.email") => ApiError::field(
                "email",
                "Пользователь с таким адресом электронной почты уже существует.",
            ),
            Some(_) => ApiError::field(
                "username",
                "Пользователь с таким именем пользователя уже существует.",
            ),
            None => err.into(),
        })
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(email)
                .fetch_optional(self.pool())
                .await?;
        Ok(user)
    }

    /// Registered users, oldest first, one page.
    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;

        Ok((users, count))
    }

    pub async fn set_avatar(&self, user_id: i64, avatar: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
            .bind(avatar)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    pub async fn set_password(&self, user_id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    // ─── Auth tokens ─────────────────────────────────────────────

    /// Return the user's auth token, creating one from `fresh_key` if none
    /// exists yet. Repeated logins reuse the stored key.
    pub async fn get_or_create_token(&self, user_id: i64, fresh_key: &str) -> Result<String> {
        if let Some(key) =
            sqlx::query_scalar::<_, String>("SELECT key FROM auth_tokens WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?
        {
            return Ok(key);
        }

        sqlx::query("INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?, ?, ?)")
            .bind(fresh_key)
            .bind(user_id)
            .bind(chrono::Utc::now())
            .execute(self.pool())
            .await?;

        Ok(fresh_key.to_string())
    }

    pub async fn user_by_token(&self, key: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.email, u.username, u.first_name, u.last_name, \
                    u.password_hash, u.avatar \
             FROM auth_tokens t JOIN users u ON u.id = t.user_id \
             WHERE t.key = ?",
        )
        .bind(key)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    pub async fn delete_token(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM auth_tokens WHERE key = ?")
            .bind(key)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    // ─── Subscriptions ───────────────────────────────────────────

    /// Create the (user, author) subscription row. Returns false when it
    /// already existed; a concurrent duplicate loses on the UNIQUE
    /// constraint and lands in the same branch.
    pub async fn subscribe(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO subscriptions (user_id, author_id) VALUES (?, ?) \
             ON CONFLICT (user_id, author_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(author_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the subscription row. Returns false when there was none.
    pub async fn unsubscribe(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_subscribed(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM subscriptions WHERE user_id = ? AND author_id = ?)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.pool())
        .await?;
        Ok(exists != 0)
    }

    /// Authors the user follows, in subscription order, one page.
    pub async fn subscribed_authors(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64)> {
        let authors = sqlx::query_as::<_, User>(
            "SELECT u.id, u.email, u.username, u.first_name, u.last_name, \
                    u.password_hash, u.avatar \
             FROM subscriptions s JOIN users u ON u.id = s.author_id \
             WHERE s.user_id = ? ORDER BY s.id LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(self.pool())
                .await?;

        Ok((authors, count))
    }
}
