pub mod entities;

use axum::async_trait;
use derive_more::Constructor;
use sqlx::SqlitePool;

use crate::{data_layer_error::Result, models::clan_models::{ClanPatchModel, NewClanModel}};

use self::entities::ClanEntity;

#[async_trait]
pub trait ClanDataLayer: Send + Sync {
    async fn get_clans(&self) -> Result<Vec<ClanEntity>>;
    async fn get_clan(&self, clan_id: i64) -> Result<Option<ClanEntity>>;
    async fn create_clan(&self, clan: &NewClanModel) -> Result<ClanEntity>;
    async fn update_clan(&self, clan_id: i64, patch: &ClanPatchModel) -> Result<Option<ClanEntity>>;
    ///
    /// Deletes the clan, clearing `clan_id` on all of its members.
    /// Returns whether a clan was deleted
    ///
    async fn delete_clan(&self, clan_id: i64) -> Result<bool>;
}

#[derive(Constructor)]
pub struct DbClanDataLayer {
    db: SqlitePool,
}

#[async_trait]
impl ClanDataLayer for DbClanDataLayer {
    async fn get_clans(&self) -> Result<Vec<ClanEntity>> {
        Ok(sqlx::query_as::<_, ClanEntity>("SELECT id, name, description, capacity, image FROM clans ORDER BY id")
            .fetch_all(&self.db).await?)
    }

    async fn get_clan(&self, clan_id: i64) -> Result<Option<ClanEntity>> {
        Ok(sqlx::query_as::<_, ClanEntity>("SELECT id, name, description, capacity, image FROM clans WHERE id = ?")
            .bind(clan_id)
            .fetch_optional(&self.db).await?)
    }

    async fn create_clan(&self, clan: &NewClanModel) -> Result<ClanEntity> {
        Ok(sqlx::query_as::<_, ClanEntity>(
            r"INSERT INTO clans (name, description, capacity, image) VALUES (?, ?, ?, ?)
            RETURNING id, name, description, capacity, image"
        )
            .bind(&clan.name).bind(&clan.description).bind(clan.capacity).bind(&clan.image)
            .fetch_one(&self.db).await?)
    }

    async fn update_clan(&self, clan_id: i64, patch: &ClanPatchModel) -> Result<Option<ClanEntity>> {
        Ok(sqlx::query_as::<_, ClanEntity>(
            r"UPDATE clans SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                capacity = COALESCE(?, capacity),
                image = COALESCE(?, image)
            WHERE id = ?
            RETURNING id, name, description, capacity, image"
        )
            .bind(&patch.name).bind(&patch.description).bind(patch.capacity).bind(&patch.image)
            .bind(clan_id)
            .fetch_optional(&self.db).await?)
    }

    async fn delete_clan(&self, clan_id: i64) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE players SET clan_id = NULL WHERE clan_id = ?")
            .bind(clan_id)
            .execute(&mut *tx).await?;
        let deleted = sqlx::query("DELETE FROM clans WHERE id = ?")
            .bind(clan_id)
            .execute(&mut *tx).await?
            .rows_affected() > 0;

        tx.commit().await?;
        Ok(deleted)
    }
}
