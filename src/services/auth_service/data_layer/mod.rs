use axum::async_trait;
use chrono::{NaiveDateTime, Utc};
use derive_more::Constructor;
use sqlx::SqlitePool;

use crate::{data_layer_error::Result, models::auth_models::{RefrTokenModel, UserModel}};

const REFR_TOKEN_COLUMNS: &str = "id, user_id, token, expires_on, replacement_id, revoked_on";

#[async_trait]
pub trait AuthDataLayer: Send + Sync {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserModel>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>>;
    ///
    /// Creates a new user, returning its ID. Returns None if the email is
    /// already taken, including when a concurrent sign-up claimed it first
    ///
    async fn create_user(&self, email: &str, pwd_hash: &str) -> Result<Option<i64>>;

    async fn get_refr_token_by_token(&self, token: &str) -> Result<Option<RefrTokenModel>>;
    async fn get_refr_token_by_id(&self, id: i64) -> Result<Option<RefrTokenModel>>;
    async fn create_refr_token(&self, user_id: i64, token: &str, expires_on: NaiveDateTime) -> Result<i64>;
    ///
    /// Marks the refresh token as revoked, recording who revoked it and
    /// (if rotated) the ID of the token replacing it
    ///
    async fn revoke_refr_token(&self, id: i64, repl_id: Option<i64>, revoked_by: &str) -> Result<()>;
}

#[derive(Constructor)]
pub struct DbAuthDataLayer {
    db: SqlitePool,
}

#[async_trait]
impl AuthDataLayer for DbAuthDataLayer {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserModel>> {
        Ok(sqlx::query_as::<_, UserModel>("SELECT id, email, pwd_hash FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.db).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>> {
        Ok(sqlx::query_as::<_, UserModel>("SELECT id, email, pwd_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.db).await?)
    }

    async fn create_user(&self, email: &str, pwd_hash: &str) -> Result<Option<i64>> {
        Ok(sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (email, pwd_hash) VALUES (?, ?) ON CONFLICT (email) DO NOTHING RETURNING id"
        )
            .bind(email).bind(pwd_hash)
            .fetch_optional(&self.db).await?)
    }

    async fn get_refr_token_by_token(&self, token: &str) -> Result<Option<RefrTokenModel>> {
        Ok(sqlx::query_as::<_, RefrTokenModel>(&format!("SELECT {REFR_TOKEN_COLUMNS} FROM refresh_tokens WHERE token = ?"))
            .bind(token)
            .fetch_optional(&self.db).await?)
    }

    async fn get_refr_token_by_id(&self, id: i64) -> Result<Option<RefrTokenModel>> {
        Ok(sqlx::query_as::<_, RefrTokenModel>(&format!("SELECT {REFR_TOKEN_COLUMNS} FROM refresh_tokens WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.db).await?)
    }

    async fn create_refr_token(&self, user_id: i64, token: &str, expires_on: NaiveDateTime) -> Result<i64> {
        let refr_token = sqlx::query("INSERT INTO refresh_tokens (user_id, token, expires_on) VALUES (?, ?, ?)")
            .bind(user_id).bind(token).bind(expires_on)
            .execute(&self.db).await?;

        Ok(refr_token.last_insert_rowid())
    }

    async fn revoke_refr_token(&self, id: i64, repl_id: Option<i64>, revoked_by: &str) -> Result<()> {
        let now = Utc::now().naive_utc();
        sqlx::query("UPDATE refresh_tokens SET revoked_on = ?, revoked_by = ?, replacement_id = ? WHERE id = ?")
            .bind(now).bind(revoked_by).bind(repl_id)
            .bind(id)
            .execute(&self.db).await?;

        Ok(())
    }
}
