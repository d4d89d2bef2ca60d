use axum::async_trait;
use derive_more::Constructor;
use sqlx::SqlitePool;

use crate::{data_layer_error::Result, models::quest_models::{NewQuestModel, QuestModel, QuestPatchModel}};

#[async_trait]
pub trait QuestDataLayer: Send + Sync {
    async fn get_quests(&self) -> Result<Vec<QuestModel>>;
    async fn get_quest(&self, quest_id: i64) -> Result<Option<QuestModel>>;
    async fn create_quest(&self, quest: &NewQuestModel) -> Result<QuestModel>;
    ///
    /// Applies the non-empty fields of `patch` to the quest.
    /// Returns None if the quest doesn't exist
    ///
    async fn update_quest(&self, quest_id: i64, patch: &QuestPatchModel) -> Result<Option<QuestModel>>;
    ///
    /// Deletes the quest along with every player's progress on it.
    /// Returns whether a quest was deleted
    ///
    async fn delete_quest(&self, quest_id: i64) -> Result<bool>;
}

#[derive(Constructor)]
pub struct DbQuestDataLayer {
    db: SqlitePool,
}

#[async_trait]
impl QuestDataLayer for DbQuestDataLayer {
    async fn get_quests(&self) -> Result<Vec<QuestModel>> {
        Ok(sqlx::query_as::<_, QuestModel>("SELECT id, title, description, xp, image FROM quests ORDER BY id")
            .fetch_all(&self.db).await?)
    }

    async fn get_quest(&self, quest_id: i64) -> Result<Option<QuestModel>> {
        Ok(sqlx::query_as::<_, QuestModel>("SELECT id, title, description, xp, image FROM quests WHERE id = ?")
            .bind(quest_id)
            .fetch_optional(&self.db).await?)
    }

    async fn create_quest(&self, quest: &NewQuestModel) -> Result<QuestModel> {
        Ok(sqlx::query_as::<_, QuestModel>(
            r"INSERT INTO quests (title, description, xp, image) VALUES (?, ?, ?, ?)
            RETURNING id, title, description, xp, image"
        )
            .bind(&quest.title).bind(&quest.description).bind(quest.xp).bind(&quest.image)
            .fetch_one(&self.db).await?)
    }

    async fn update_quest(&self, quest_id: i64, patch: &QuestPatchModel) -> Result<Option<QuestModel>> {
        Ok(sqlx::query_as::<_, QuestModel>(
            r"UPDATE quests SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                xp = COALESCE(?, xp),
                image = COALESCE(?, image)
            WHERE id = ?
            RETURNING id, title, description, xp, image"
        )
            .bind(&patch.title).bind(&patch.description).bind(patch.xp).bind(&patch.image)
            .bind(quest_id)
            .fetch_optional(&self.db).await?)
    }

    async fn delete_quest(&self, quest_id: i64) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        // Clear the quest from every player's assigned and completed lists
        sqlx::query("DELETE FROM player_quests WHERE quest_id = ?")
            .bind(quest_id)
            .execute(&mut *tx).await?;
        let deleted = sqlx::query("DELETE FROM quests WHERE id = ?")
            .bind(quest_id)
            .execute(&mut *tx).await?
            .rows_affected() > 0;

        tx.commit().await?;
        Ok(deleted)
    }
}
