pub mod data_layer;
pub mod error;

use std::sync::Arc;

use axum::async_trait;
use derive_more::Constructor;
use log::info;

use crate::{
    models::player_models::{NewPlayerModel, PlayerModel, PlayerPatchModel},
    resources::levels::LevelTable,
};

use self::{data_layer::{PlayerDataLayer, entities::PlayerEntity}, error::{PlayerServiceError, Result}};

use super::quest_service::QuestService;

pub const DEFAULT_AVATAR: &str = "⚔️";

///
/// Service managing players, their quest progress and
/// the xp it earns them.
///
#[async_trait]
pub trait PlayerService: Send + Sync {
    ///
    /// Lists all players. If `search` is given, only players whose
    /// nickname contains it (case-insensitive) are returned.
    ///
    async fn list_players(&self, search: Option<String>) -> Result<Vec<PlayerModel>>;
    async fn get_player(&self, player_id: i64) -> Result<PlayerModel>;
    ///
    /// Returns the player linked to the authentication identity `uid`, if any
    ///
    async fn find_by_uid(&self, uid: &str) -> Result<Option<PlayerModel>>;
    async fn add_player(&self, player: NewPlayerModel) -> Result<PlayerModel>;
    async fn update_player(&self, player_id: i64, patch: PlayerPatchModel) -> Result<PlayerModel>;
    async fn delete_player(&self, player_id: i64) -> Result<()>;
    ///
    /// Returns the players whose `clan_id` equals `clan_id`
    ///
    async fn clan_members(&self, clan_id: i64) -> Result<Vec<PlayerModel>>;
    ///
    /// Sets (or with `None`, clears) the player's clan. Does not check the
    /// clan itself; capacity is the clan service's concern.
    ///
    async fn set_clan(&self, player_id: i64, clan_id: Option<i64>) -> Result<PlayerModel>;
    ///
    /// Adds the quest to the player's assigned quests. Assigning a quest
    /// twice is a no-op. Returns `PlayerServiceError::QuestAlreadyCompleted`
    /// if the player already completed it
    ///
    async fn assign_quest(&self, player_id: i64, quest_id: i64) -> Result<PlayerModel>;
    async fn unassign_quest(&self, player_id: i64, quest_id: i64) -> Result<PlayerModel>;
    ///
    /// Moves an assigned quest to the completed quests, crediting its xp
    ///
    async fn complete_quest(&self, player_id: i64, quest_id: i64) -> Result<PlayerModel>;
    ///
    /// Reverses `complete_quest`: the quest's xp is subtracted (never below
    /// zero) and the quest is assigned again
    ///
    async fn uncomplete_quest(&self, player_id: i64, quest_id: i64) -> Result<PlayerModel>;
}

#[derive(Constructor)]
pub struct CorePlayerService {
    data_layer: Arc<dyn PlayerDataLayer>,
    quest_service: Arc<dyn QuestService>,
    levels: Arc<LevelTable>,
    cap_xp_at_max_level: bool,
}

#[async_trait]
impl PlayerService for CorePlayerService {
    async fn list_players(&self, search: Option<String>) -> Result<Vec<PlayerModel>> {
        let search = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

        Ok(self.data_layer.get_players().await?
            .into_iter()
            .filter(|p| search.as_ref().map_or(true, |s| p.nickname.to_lowercase().contains(s)))
            .map(|p| self.to_model(p))
            .collect())
    }

    async fn get_player(&self, player_id: i64) -> Result<PlayerModel> {
        Ok(self.to_model(self.entity(player_id).await?))
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<PlayerModel>> {
        Ok(self.data_layer.get_player_by_uid(uid).await?.map(|p| self.to_model(p)))
    }

    async fn add_player(&self, mut player: NewPlayerModel) -> Result<PlayerModel> {
        if player.nickname.trim().is_empty() {
            return Err(PlayerServiceError::EmptyNickname);
        }
        if player.avatar.as_deref().map_or(true, |a| a.trim().is_empty()) {
            player.avatar = Some(DEFAULT_AVATAR.to_string());
        }

        let player = self.data_layer.create_player(&player).await?;
        info!("Player added with ID: {}", player.id);

        Ok(self.to_model(player))
    }

    async fn update_player(&self, player_id: i64, patch: PlayerPatchModel) -> Result<PlayerModel> {
        if patch.nickname.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(PlayerServiceError::EmptyNickname);
        }

        let player = self.data_layer.update_player(player_id, &patch).await?
            .ok_or(PlayerServiceError::PlayerNotFound(player_id))?;
        info!("Player updated with ID: {}", player_id);

        Ok(self.to_model(player))
    }

    async fn delete_player(&self, player_id: i64) -> Result<()> {
        if !self.data_layer.delete_player(player_id).await? {
            return Err(PlayerServiceError::PlayerNotFound(player_id));
        }
        info!("Player deleted with ID: {}", player_id);

        Ok(())
    }

    async fn clan_members(&self, clan_id: i64) -> Result<Vec<PlayerModel>> {
        Ok(self.data_layer.get_clan_members(clan_id).await?
            .into_iter()
            .map(|p| self.to_model(p))
            .collect())
    }

    async fn set_clan(&self, player_id: i64, clan_id: Option<i64>) -> Result<PlayerModel> {
        let mut player = self.entity(player_id).await?;

        self.data_layer.set_player_clan(player_id, clan_id).await?;
        player.clan_id = clan_id;

        Ok(self.to_model(player))
    }

    async fn assign_quest(&self, player_id: i64, quest_id: i64) -> Result<PlayerModel> {
        let player = self.entity(player_id).await?;
        // Ensure the quest exists
        self.quest_service.get_quest(quest_id).await?;

        if player.completed_quests.contains(&quest_id) {
            return Err(PlayerServiceError::QuestAlreadyCompleted { player_id, quest_id });
        }
        if !player.assigned_quests.contains(&quest_id) {
            self.data_layer.assign_quest(player_id, quest_id).await?;
        }

        self.get_player(player_id).await
    }

    async fn unassign_quest(&self, player_id: i64, quest_id: i64) -> Result<PlayerModel> {
        let player = self.entity(player_id).await?;
        if !player.assigned_quests.contains(&quest_id) {
            return Err(PlayerServiceError::QuestNotAssigned { player_id, quest_id });
        }

        self.data_layer.unassign_quest(player_id, quest_id).await?;
        self.get_player(player_id).await
    }

    async fn complete_quest(&self, player_id: i64, quest_id: i64) -> Result<PlayerModel> {
        let player = self.entity(player_id).await?;
        if !player.assigned_quests.contains(&quest_id) {
            return Err(PlayerServiceError::QuestNotAssigned { player_id, quest_id });
        }
        let quest = self.quest_service.get_quest(quest_id).await?;

        let mut xp = player.xp.saturating_add(quest.xp);
        if self.cap_xp_at_max_level {
            xp = xp.min(self.levels.max_xp().max(player.xp));
        }

        self.data_layer.set_quest_completed(player_id, quest_id, true, xp).await?;
        info!("Player {} completed quest {} (xp {} -> {})", player_id, quest_id, player.xp, xp);

        self.get_player(player_id).await
    }

    async fn uncomplete_quest(&self, player_id: i64, quest_id: i64) -> Result<PlayerModel> {
        let player = self.entity(player_id).await?;
        if !player.completed_quests.contains(&quest_id) {
            return Err(PlayerServiceError::QuestNotCompleted { player_id, quest_id });
        }
        let quest = self.quest_service.get_quest(quest_id).await?;

        let xp = player.xp.saturating_sub(quest.xp).max(0);

        self.data_layer.set_quest_completed(player_id, quest_id, false, xp).await?;
        info!("Player {} uncompleted quest {} (xp {} -> {})", player_id, quest_id, player.xp, xp);

        self.get_player(player_id).await
    }
}

impl CorePlayerService {
    async fn entity(&self, player_id: i64) -> Result<PlayerEntity> {
        self.data_layer.get_player(player_id).await?
            .ok_or(PlayerServiceError::PlayerNotFound(player_id))
    }

    fn to_model(&self, player: PlayerEntity) -> PlayerModel {
        PlayerModel {
            level: self.levels.level_of(player.xp),
            id: player.id,
            nickname: player.nickname,
            xp: player.xp,
            assigned_quests: player.assigned_quests,
            completed_quests: player.completed_quests,
            clan_id: player.clan_id,
            avatar: player.avatar,
            sound: player.sound,
            uid: player.uid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mem_store::MemStore,
        models::quest_models::NewQuestModel,
        services::quest_service::{CoreQuestService, error::QuestServiceError},
    };

    struct Fixture {
        players: CorePlayerService,
        quests: Arc<CoreQuestService>,
    }

    fn fixture(cap_xp_at_max_level: bool) -> Fixture {
        let store = Arc::new(MemStore::default());
        let quests = Arc::new(CoreQuestService::new(store.clone()));
        let players = CorePlayerService::new(store, quests.clone(), Arc::new(LevelTable::default()), cap_xp_at_max_level);
        Fixture { players, quests }
    }

    fn new_player(nickname: &str) -> NewPlayerModel {
        NewPlayerModel { nickname: nickname.to_string(), avatar: None, uid: None }
    }

    async fn add_quest(fx: &Fixture, xp: i64) -> i64 {
        fx.quests.add_quest(NewQuestModel {
            title: format!("Quest worth {xp}"), description: String::new(), xp, image: None,
        }).await.unwrap().id
    }

    #[tokio::test]
    async fn test_add_player_defaults() {
        let fx = fixture(true);
        let player = fx.players.add_player(new_player("Knightmare")).await.unwrap();

        assert_eq!(player.xp, 0);
        assert_eq!(player.avatar.as_deref(), Some(DEFAULT_AVATAR));
        assert!(player.assigned_quests.is_empty());
        assert_eq!(player.level.level, 1);
        assert_eq!(player.level.title, "Novice");
    }

    #[tokio::test]
    async fn test_rejects_empty_nickname() {
        let fx = fixture(true);

        assert!(matches!(fx.players.add_player(new_player(" ")).await, Err(PlayerServiceError::EmptyNickname)));
    }

    #[tokio::test]
    async fn test_assign_is_idempotent() {
        let fx = fixture(true);
        let player = fx.players.add_player(new_player("Herbalist")).await.unwrap();
        let quest_id = add_quest(&fx, 30).await;

        fx.players.assign_quest(player.id, quest_id).await.unwrap();
        let player = fx.players.assign_quest(player.id, quest_id).await.unwrap();

        assert_eq!(player.assigned_quests, vec![quest_id]);
    }

    #[tokio::test]
    async fn test_assign_unknown_quest() {
        let fx = fixture(true);
        let player = fx.players.add_player(new_player("Herbalist")).await.unwrap();

        assert!(matches!(
            fx.players.assign_quest(player.id, 99).await,
            Err(PlayerServiceError::QuestServiceError(QuestServiceError::QuestNotFound(99)))
        ));
    }

    #[tokio::test]
    async fn test_complete_then_uncomplete_round_trip() {
        let fx = fixture(true);
        let player = fx.players.add_player(new_player("TreasureHunter")).await.unwrap();
        let warmup = add_quest(&fx, 50).await;
        let quest_id = add_quest(&fx, 120).await;

        fx.players.assign_quest(player.id, warmup).await.unwrap();
        fx.players.complete_quest(player.id, warmup).await.unwrap();
        let before = fx.players.assign_quest(player.id, quest_id).await.unwrap();
        assert_eq!(before.xp, 50);

        let completed = fx.players.complete_quest(player.id, quest_id).await.unwrap();
        assert_eq!(completed.xp, 170);
        assert!(completed.assigned_quests.is_empty());
        assert_eq!(completed.completed_quests, vec![warmup, quest_id]);
        assert_eq!(completed.level.level, 2);

        let after = fx.players.uncomplete_quest(player.id, quest_id).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_complete_requires_assignment() {
        let fx = fixture(true);
        let player = fx.players.add_player(new_player("Knightmare")).await.unwrap();
        let quest_id = add_quest(&fx, 10).await;

        assert!(matches!(
            fx.players.complete_quest(player.id, quest_id).await,
            Err(PlayerServiceError::QuestNotAssigned { .. })
        ));
        assert!(matches!(
            fx.players.uncomplete_quest(player.id, quest_id).await,
            Err(PlayerServiceError::QuestNotCompleted { .. })
        ));
    }

    #[tokio::test]
    async fn test_completed_quest_cannot_be_reassigned() {
        let fx = fixture(true);
        let player = fx.players.add_player(new_player("Knightmare")).await.unwrap();
        let quest_id = add_quest(&fx, 10).await;

        fx.players.assign_quest(player.id, quest_id).await.unwrap();
        fx.players.complete_quest(player.id, quest_id).await.unwrap();

        assert!(matches!(
            fx.players.assign_quest(player.id, quest_id).await,
            Err(PlayerServiceError::QuestAlreadyCompleted { .. })
        ));
    }

    #[tokio::test]
    async fn test_xp_cap() {
        let capped = fixture(true);
        let uncapped = fixture(false);

        for (fx, expected) in [(&capped, 12000), (&uncapped, 20000)] {
            let player = fx.players.add_player(new_player("Grinder")).await.unwrap();
            let quest_id = add_quest(fx, 20000).await;
            fx.players.assign_quest(player.id, quest_id).await.unwrap();

            let player = fx.players.complete_quest(player.id, quest_id).await.unwrap();
            assert_eq!(player.xp, expected);
            assert_eq!(player.level.level, 10);
            assert_eq!(player.level.progress, 100.0);
        }
    }

    #[tokio::test]
    async fn test_huge_quest_xp_saturates() {
        let capped = fixture(true);
        let uncapped = fixture(false);

        for (fx, expected) in [(&capped, 12000), (&uncapped, i64::MAX)] {
            let player = fx.players.add_player(new_player("Grinder")).await.unwrap();
            let small = add_quest(fx, 1).await;
            let huge = add_quest(fx, i64::MAX).await;

            fx.players.assign_quest(player.id, small).await.unwrap();
            fx.players.complete_quest(player.id, small).await.unwrap();
            fx.players.assign_quest(player.id, huge).await.unwrap();

            let player = fx.players.complete_quest(player.id, huge).await.unwrap();
            assert_eq!(player.xp, expected);
            assert_eq!(player.level.level, 10);
        }
    }

    #[tokio::test]
    async fn test_uncomplete_floors_xp_at_zero() {
        let fx = fixture(true);
        let player = fx.players.add_player(new_player("Knightmare")).await.unwrap();
        let quest_id = add_quest(&fx, 100).await;
        fx.players.assign_quest(player.id, quest_id).await.unwrap();
        fx.players.complete_quest(player.id, quest_id).await.unwrap();

        // The reward grew after completion
        fx.quests.update_quest(quest_id, crate::models::quest_models::QuestPatchModel {
            xp: Some(500), ..Default::default()
        }).await.unwrap();

        let player = fx.players.uncomplete_quest(player.id, quest_id).await.unwrap();
        assert_eq!(player.xp, 0);
        assert_eq!(player.assigned_quests, vec![quest_id]);
    }

    #[tokio::test]
    async fn test_deleting_quest_clears_player_lists() {
        let fx = fixture(true);
        let a = fx.players.add_player(new_player("A")).await.unwrap();
        let b = fx.players.add_player(new_player("B")).await.unwrap();
        let quest_id = add_quest(&fx, 10).await;
        let other = add_quest(&fx, 10).await;

        fx.players.assign_quest(a.id, quest_id).await.unwrap();
        fx.players.assign_quest(a.id, other).await.unwrap();
        fx.players.assign_quest(b.id, quest_id).await.unwrap();
        fx.players.complete_quest(b.id, quest_id).await.unwrap();

        fx.quests.delete_quest(quest_id).await.unwrap();

        let a = fx.players.get_player(a.id).await.unwrap();
        let b = fx.players.get_player(b.id).await.unwrap();
        assert_eq!(a.assigned_quests, vec![other]);
        assert!(b.completed_quests.is_empty());
        assert!(b.assigned_quests.is_empty());
    }

    #[tokio::test]
    async fn test_search_and_uid_lookup() {
        let fx = fixture(true);
        fx.players.add_player(new_player("DragonSlayer")).await.unwrap();
        fx.players.add_player(NewPlayerModel { uid: Some("7".to_string()), ..new_player("MoonShadow") }).await.unwrap();

        let found = fx.players.list_players(Some("moon".to_string())).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(fx.players.find_by_uid("7").await.unwrap().unwrap().nickname, "MoonShadow");
        assert!(fx.players.find_by_uid("8").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_player() {
        let fx = fixture(true);

        assert!(matches!(fx.players.get_player(3).await, Err(PlayerServiceError::PlayerNotFound(3))));
        assert!(matches!(fx.players.delete_player(3).await, Err(PlayerServiceError::PlayerNotFound(3))));
        assert!(matches!(fx.players.set_clan(3, Some(1)).await, Err(PlayerServiceError::PlayerNotFound(3))));
    }
}
