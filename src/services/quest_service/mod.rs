pub mod data_layer;
pub mod error;

use std::sync::Arc;

use axum::async_trait;
use derive_more::Constructor;
use log::info;

use crate::models::quest_models::{NewQuestModel, QuestModel, QuestPatchModel};

use self::{data_layer::QuestDataLayer, error::{QuestServiceError, Result}};

#[async_trait]
pub trait QuestService: Send + Sync {
    ///
    /// Lists all quests. If `search` is given, only quests whose title or
    /// description contain it (case-insensitive) are returned.
    ///
    async fn list_quests(&self, search: Option<String>) -> Result<Vec<QuestModel>>;
    ///
    /// Retrieves the quest with the given `quest_id`.
    /// Returns `QuestServiceError::QuestNotFound` if it doesn't exist
    ///
    async fn get_quest(&self, quest_id: i64) -> Result<QuestModel>;
    async fn add_quest(&self, quest: NewQuestModel) -> Result<QuestModel>;
    async fn update_quest(&self, quest_id: i64, patch: QuestPatchModel) -> Result<QuestModel>;
    ///
    /// Deletes the quest, and clears its id from every player's
    /// assigned and completed quest lists
    ///
    async fn delete_quest(&self, quest_id: i64) -> Result<()>;
}

#[derive(Constructor)]
pub struct CoreQuestService {
    data_layer: Arc<dyn QuestDataLayer>,
}

#[async_trait]
impl QuestService for CoreQuestService {
    async fn list_quests(&self, search: Option<String>) -> Result<Vec<QuestModel>> {
        let quests = self.data_layer.get_quests().await?;

        Ok(match search.as_deref().map(str::trim) {
            Some(search) if !search.is_empty() => quests.into_iter().filter(|q| q.matches(search)).collect(),
            _ => quests,
        })
    }

    async fn get_quest(&self, quest_id: i64) -> Result<QuestModel> {
        self.data_layer.get_quest(quest_id).await?
            .ok_or(QuestServiceError::QuestNotFound(quest_id))
    }

    async fn add_quest(&self, quest: NewQuestModel) -> Result<QuestModel> {
        validate(Some(&quest.title), Some(quest.xp))?;

        let quest = self.data_layer.create_quest(&quest).await?;
        info!("Quest added with ID: {}", quest.id);

        Ok(quest)
    }

    async fn update_quest(&self, quest_id: i64, patch: QuestPatchModel) -> Result<QuestModel> {
        validate(patch.title.as_ref(), patch.xp)?;

        let quest = self.data_layer.update_quest(quest_id, &patch).await?
            .ok_or(QuestServiceError::QuestNotFound(quest_id))?;
        info!("Quest updated with ID: {}", quest_id);

        Ok(quest)
    }

    async fn delete_quest(&self, quest_id: i64) -> Result<()> {
        if !self.data_layer.delete_quest(quest_id).await? {
            return Err(QuestServiceError::QuestNotFound(quest_id));
        }
        info!("Quest deleted with ID: {}", quest_id);

        Ok(())
    }
}

fn validate(title: Option<&String>, xp: Option<i64>) -> Result<()> {
    if title.is_some_and(|t| t.trim().is_empty()) {
        return Err(QuestServiceError::EmptyTitle);
    }
    if let Some(xp) = xp.filter(|xp| *xp < 0) {
        return Err(QuestServiceError::NegativeXp(xp));
    }
    Ok(())
}
