pub mod entities;

use axum::async_trait;
use derive_more::Constructor;
use sqlx::SqlitePool;

use crate::{data_layer_error::Result, models::player_models::{NewPlayerModel, PlayerPatchModel}};

use self::entities::{PlayerEntity, PlayerRow, ProgressRow};

const PLAYER_COLUMNS: &str = "id, nickname, xp, clan_id, avatar, sound, uid";

#[async_trait]
pub trait PlayerDataLayer: Send + Sync {
    async fn get_players(&self) -> Result<Vec<PlayerEntity>>;
    async fn get_player(&self, player_id: i64) -> Result<Option<PlayerEntity>>;
    ///
    /// Retrieves the player linked to the authentication identity `uid`
    ///
    async fn get_player_by_uid(&self, uid: &str) -> Result<Option<PlayerEntity>>;
    ///
    /// Retrieves all players whose `clan_id` equals the given `clan_id`
    ///
    async fn get_clan_members(&self, clan_id: i64) -> Result<Vec<PlayerEntity>>;
    async fn create_player(&self, player: &NewPlayerModel) -> Result<PlayerEntity>;
    async fn update_player(&self, player_id: i64, patch: &PlayerPatchModel) -> Result<Option<PlayerEntity>>;
    ///
    /// Deletes the player and their quest progress.
    /// Returns whether a player was deleted
    ///
    async fn delete_player(&self, player_id: i64) -> Result<bool>;
    async fn set_player_clan(&self, player_id: i64, clan_id: Option<i64>) -> Result<()>;
    ///
    /// Adds `quest_id` to the player's assigned quests, if it isn't
    /// already tracked for them
    ///
    async fn assign_quest(&self, player_id: i64, quest_id: i64) -> Result<()>;
    async fn unassign_quest(&self, player_id: i64, quest_id: i64) -> Result<()>;
    ///
    /// Moves `quest_id` to the end of the completed (or, with `completed`
    /// false, assigned) list and sets the player's xp, as a single update
    ///
    async fn set_quest_completed(&self, player_id: i64, quest_id: i64, completed: bool, xp: i64) -> Result<()>;
}

#[derive(Constructor)]
pub struct DbPlayerDataLayer {
    db: SqlitePool,
}

impl DbPlayerDataLayer {
    async fn with_progress(&self, row: Option<PlayerRow>) -> Result<Option<PlayerEntity>> {
        let Some(row) = row else { return Ok(None) };

        let progress = sqlx::query_as::<_, ProgressRow>(
            "SELECT player_id, quest_id, completed FROM player_quests WHERE player_id = ? ORDER BY rowid"
        )
            .bind(row.id)
            .fetch_all(&self.db).await?;

        Ok(PlayerEntity::from_rows(vec![row], progress).pop())
    }
}

#[async_trait]
impl PlayerDataLayer for DbPlayerDataLayer {
    async fn get_players(&self) -> Result<Vec<PlayerEntity>> {
        let rows = sqlx::query_as::<_, PlayerRow>(&format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY id"))
            .fetch_all(&self.db).await?;
        let progress = sqlx::query_as::<_, ProgressRow>(
            "SELECT player_id, quest_id, completed FROM player_quests ORDER BY rowid"
        )
            .fetch_all(&self.db).await?;

        Ok(PlayerEntity::from_rows(rows, progress))
    }

    async fn get_player(&self, player_id: i64) -> Result<Option<PlayerEntity>> {
        let row = sqlx::query_as::<_, PlayerRow>(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?"))
            .bind(player_id)
            .fetch_optional(&self.db).await?;

        self.with_progress(row).await
    }

    async fn get_player_by_uid(&self, uid: &str) -> Result<Option<PlayerEntity>> {
        let row = sqlx::query_as::<_, PlayerRow>(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE uid = ?"))
            .bind(uid)
            .fetch_optional(&self.db).await?;

        self.with_progress(row).await
    }

    async fn get_clan_members(&self, clan_id: i64) -> Result<Vec<PlayerEntity>> {
        let rows = sqlx::query_as::<_, PlayerRow>(
            &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE clan_id = ? ORDER BY id")
        )
            .bind(clan_id)
            .fetch_all(&self.db).await?;
        let progress = sqlx::query_as::<_, ProgressRow>(
            r"SELECT pq.player_id, pq.quest_id, pq.completed FROM player_quests pq
            JOIN players p ON p.id = pq.player_id
            WHERE p.clan_id = ? ORDER BY pq.rowid"
        )
            .bind(clan_id)
            .fetch_all(&self.db).await?;

        Ok(PlayerEntity::from_rows(rows, progress))
    }

    async fn create_player(&self, player: &NewPlayerModel) -> Result<PlayerEntity> {
        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            "INSERT INTO players (nickname, xp, avatar, uid) VALUES (?, 0, ?, ?) RETURNING {PLAYER_COLUMNS}"
        ))
            .bind(&player.nickname).bind(&player.avatar).bind(&player.uid)
            .fetch_one(&self.db).await?;

        Ok(row.into())
    }

    async fn update_player(&self, player_id: i64, patch: &PlayerPatchModel) -> Result<Option<PlayerEntity>> {
        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            r"UPDATE players SET
                nickname = COALESCE(?, nickname),
                avatar = COALESCE(?, avatar),
                sound = COALESCE(?, sound)
            WHERE id = ?
            RETURNING {PLAYER_COLUMNS}"
        ))
            .bind(&patch.nickname).bind(&patch.avatar).bind(&patch.sound)
            .bind(player_id)
            .fetch_optional(&self.db).await?;

        self.with_progress(row).await
    }

    async fn delete_player(&self, player_id: i64) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM player_quests WHERE player_id = ?")
            .bind(player_id)
            .execute(&mut *tx).await?;
        let deleted = sqlx::query("DELETE FROM players WHERE id = ?")
            .bind(player_id)
            .execute(&mut *tx).await?
            .rows_affected() > 0;

        tx.commit().await?;
        Ok(deleted)
    }

    async fn set_player_clan(&self, player_id: i64, clan_id: Option<i64>) -> Result<()> {
        sqlx::query("UPDATE players SET clan_id = ? WHERE id = ?")
            .bind(clan_id).bind(player_id)
            .execute(&self.db).await?;

        Ok(())
    }

    async fn assign_quest(&self, player_id: i64, quest_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO player_quests (player_id, quest_id, completed) VALUES (?, ?, FALSE)")
            .bind(player_id).bind(quest_id)
            .execute(&self.db).await?;

        Ok(())
    }

    async fn unassign_quest(&self, player_id: i64, quest_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM player_quests WHERE player_id = ? AND quest_id = ? AND completed = FALSE")
            .bind(player_id).bind(quest_id)
            .execute(&self.db).await?;

        Ok(())
    }

    async fn set_quest_completed(&self, player_id: i64, quest_id: i64, completed: bool, xp: i64) -> Result<()> {
        let mut tx = self.db.begin().await?;

        // Re-insert rather than update, so the quest lands at the end of its new list
        sqlx::query("DELETE FROM player_quests WHERE player_id = ? AND quest_id = ?")
            .bind(player_id).bind(quest_id)
            .execute(&mut *tx).await?;
        sqlx::query("INSERT INTO player_quests (player_id, quest_id, completed) VALUES (?, ?, ?)")
            .bind(player_id).bind(quest_id).bind(completed)
            .execute(&mut *tx).await?;
        sqlx::query("UPDATE players SET xp = ? WHERE id = ?")
            .bind(xp).bind(player_id)
            .execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }
}
