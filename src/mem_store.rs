use axum::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    data_layer_error::Result,
    models::{
        auth_models::{RefrTokenModel, UserModel},
        clan_models::{ClanPatchModel, NewClanModel},
        player_models::{NewPlayerModel, PlayerPatchModel},
        quest_models::{NewQuestModel, QuestModel, QuestPatchModel},
    },
    services::{
        auth_service::data_layer::AuthDataLayer,
        clan_service::data_layer::{ClanDataLayer, entities::ClanEntity},
        player_service::data_layer::{PlayerDataLayer, entities::PlayerEntity},
        quest_service::data_layer::QuestDataLayer,
    },
};

///
/// In-memory store implementing every data layer. Used when no database
/// is reachable, and in tests. IDs are generated as one past the highest
/// existing ID of the collection.
///
#[derive(Default)]
pub struct MemStore {
    state: RwLock<MemState>,
}

#[derive(Default)]
struct MemState {
    quests: Vec<QuestModel>,
    players: Vec<PlayerEntity>,
    clans: Vec<ClanEntity>,
    users: Vec<UserModel>,
    refr_tokens: Vec<RefrTokenModel>,
}

fn next_id<T>(items: &[T], id: impl Fn(&T) -> i64) -> i64 {
    items.iter().map(id).max().unwrap_or(0) + 1
}

impl MemStore {
    ///
    /// A store pre-populated with a few quests, clans and players
    ///
    pub fn seeded() -> Self {
        let quest = |id, title: &str, description: &str, xp| QuestModel {
            id, title: title.to_string(), description: description.to_string(), xp, image: None,
        };
        let clan = |id, name: &str, description: &str, capacity| ClanEntity {
            id, name: name.to_string(), description: description.to_string(), capacity, image: None,
        };
        let player = |id, nickname: &str, avatar: &str| PlayerEntity {
            id, nickname: nickname.to_string(), avatar: Some(avatar.to_string()), ..Default::default()
        };

        let state = MemState {
            quests: vec![
                quest(1, "Find the Lost Sword", "Retrieve the legendary sword from the ancient ruins.", 120),
                quest(2, "Rescue the Villagers", "Save the villagers captured by goblins.", 60),
                quest(3, "Collect Herbs", "Gather 10 healing herbs for the village healer.", 30),
            ],
            clans: vec![
                clan(1, "Dragon Knights", "Elite slayers of dragons", 10),
                clan(2, "Moon Order", "Secretive moonlight clan", 5),
            ],
            players: vec![
                PlayerEntity {
                    xp: 60, assigned_quests: vec![1], completed_quests: vec![2], clan_id: Some(1),
                    ..player(1, "Knightmare", "🤺")
                },
                PlayerEntity { assigned_quests: vec![2], ..player(2, "Herbalist", "🌿") },
                PlayerEntity { assigned_quests: vec![3], clan_id: Some(2), ..player(3, "TreasureHunter", "💎") },
            ],
            ..Default::default()
        };

        Self { state: RwLock::new(state) }
    }
}

#[async_trait]
impl QuestDataLayer for MemStore {
    async fn get_quests(&self) -> Result<Vec<QuestModel>> {
        Ok(self.state.read().await.quests.clone())
    }

    async fn get_quest(&self, quest_id: i64) -> Result<Option<QuestModel>> {
        Ok(self.state.read().await.quests.iter().find(|q| q.id == quest_id).cloned())
    }

    async fn create_quest(&self, quest: &NewQuestModel) -> Result<QuestModel> {
        let mut state = self.state.write().await;
        let quest = QuestModel {
            id: next_id(&state.quests, |q| q.id),
            title: quest.title.clone(),
            description: quest.description.clone(),
            xp: quest.xp,
            image: quest.image.clone(),
        };
        state.quests.push(quest.clone());

        Ok(quest)
    }

    async fn update_quest(&self, quest_id: i64, patch: &QuestPatchModel) -> Result<Option<QuestModel>> {
        let mut state = self.state.write().await;
        let Some(quest) = state.quests.iter_mut().find(|q| q.id == quest_id) else { return Ok(None) };

        if let Some(title) = &patch.title { quest.title = title.clone(); }
        if let Some(description) = &patch.description { quest.description = description.clone(); }
        if let Some(xp) = patch.xp { quest.xp = xp; }
        if let Some(image) = &patch.image { quest.image = Some(image.clone()); }

        Ok(Some(quest.clone()))
    }

    async fn delete_quest(&self, quest_id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let count = state.quests.len();
        state.quests.retain(|q| q.id != quest_id);

        for player in state.players.iter_mut() {
            player.assigned_quests.retain(|id| *id != quest_id);
            player.completed_quests.retain(|id| *id != quest_id);
        }

        Ok(state.quests.len() < count)
    }
}

#[async_trait]
impl PlayerDataLayer for MemStore {
    async fn get_players(&self) -> Result<Vec<PlayerEntity>> {
        Ok(self.state.read().await.players.clone())
    }

    async fn get_player(&self, player_id: i64) -> Result<Option<PlayerEntity>> {
        Ok(self.state.read().await.players.iter().find(|p| p.id == player_id).cloned())
    }

    async fn get_player_by_uid(&self, uid: &str) -> Result<Option<PlayerEntity>> {
        Ok(self.state.read().await.players.iter().find(|p| p.uid.as_deref() == Some(uid)).cloned())
    }

    async fn get_clan_members(&self, clan_id: i64) -> Result<Vec<PlayerEntity>> {
        Ok(self.state.read().await.players.iter().filter(|p| p.clan_id == Some(clan_id)).cloned().collect())
    }

    async fn create_player(&self, player: &NewPlayerModel) -> Result<PlayerEntity> {
        let mut state = self.state.write().await;
        let player = PlayerEntity {
            id: next_id(&state.players, |p| p.id),
            nickname: player.nickname.clone(),
            avatar: player.avatar.clone(),
            uid: player.uid.clone(),
            ..Default::default()
        };
        state.players.push(player.clone());

        Ok(player)
    }

    async fn update_player(&self, player_id: i64, patch: &PlayerPatchModel) -> Result<Option<PlayerEntity>> {
        let mut state = self.state.write().await;
        let Some(player) = state.players.iter_mut().find(|p| p.id == player_id) else { return Ok(None) };

        if let Some(nickname) = &patch.nickname { player.nickname = nickname.clone(); }
        if let Some(avatar) = &patch.avatar { player.avatar = Some(avatar.clone()); }
        if let Some(sound) = &patch.sound { player.sound = Some(sound.clone()); }

        Ok(Some(player.clone()))
    }

    async fn delete_player(&self, player_id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let count = state.players.len();
        state.players.retain(|p| p.id != player_id);

        Ok(state.players.len() < count)
    }

    async fn set_player_clan(&self, player_id: i64, clan_id: Option<i64>) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(player) = state.players.iter_mut().find(|p| p.id == player_id) {
            player.clan_id = clan_id;
        }
        Ok(())
    }

    async fn assign_quest(&self, player_id: i64, quest_id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(player) = state.players.iter_mut().find(|p| p.id == player_id) {
            if !player.assigned_quests.contains(&quest_id) && !player.completed_quests.contains(&quest_id) {
                player.assigned_quests.push(quest_id);
            }
        }
        Ok(())
    }

    async fn unassign_quest(&self, player_id: i64, quest_id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(player) = state.players.iter_mut().find(|p| p.id == player_id) {
            player.assigned_quests.retain(|id| *id != quest_id);
        }
        Ok(())
    }

    async fn set_quest_completed(&self, player_id: i64, quest_id: i64, completed: bool, xp: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(player) = state.players.iter_mut().find(|p| p.id == player_id) {
            player.assigned_quests.retain(|id| *id != quest_id);
            player.completed_quests.retain(|id| *id != quest_id);
            if completed {
                player.completed_quests.push(quest_id);
            } else {
                player.assigned_quests.push(quest_id);
            }
            player.xp = xp;
        }
        Ok(())
    }
}

#[async_trait]
impl ClanDataLayer for MemStore {
    async fn get_clans(&self) -> Result<Vec<ClanEntity>> {
        Ok(self.state.read().await.clans.clone())
    }

    async fn get_clan(&self, clan_id: i64) -> Result<Option<ClanEntity>> {
        Ok(self.state.read().await.clans.iter().find(|c| c.id == clan_id).cloned())
    }

    async fn create_clan(&self, clan: &NewClanModel) -> Result<ClanEntity> {
        let mut state = self.state.write().await;
        let clan = ClanEntity {
            id: next_id(&state.clans, |c| c.id),
            name: clan.name.clone(),
            description: clan.description.clone(),
            capacity: clan.capacity,
            image: clan.image.clone(),
        };
        state.clans.push(clan.clone());

        Ok(clan)
    }

    async fn update_clan(&self, clan_id: i64, patch: &ClanPatchModel) -> Result<Option<ClanEntity>> {
        let mut state = self.state.write().await;
        let Some(clan) = state.clans.iter_mut().find(|c| c.id == clan_id) else { return Ok(None) };

        if let Some(name) = &patch.name { clan.name = name.clone(); }
        if let Some(description) = &patch.description { clan.description = description.clone(); }
        if let Some(capacity) = patch.capacity { clan.capacity = capacity; }
        if let Some(image) = &patch.image { clan.image = Some(image.clone()); }

        Ok(Some(clan.clone()))
    }

    async fn delete_clan(&self, clan_id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let count = state.clans.len();
        state.clans.retain(|c| c.id != clan_id);

        for player in state.players.iter_mut().filter(|p| p.clan_id == Some(clan_id)) {
            player.clan_id = None;
        }

        Ok(state.clans.len() < count)
    }
}

#[async_trait]
impl AuthDataLayer for MemStore {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserModel>> {
        Ok(self.state.read().await.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>> {
        Ok(self.state.read().await.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, email: &str, pwd_hash: &str) -> Result<Option<i64>> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == email) {
            return Ok(None);
        }

        let id = next_id(&state.users, |u| u.id);
        state.users.push(UserModel { id, email: email.to_string(), pwd_hash: pwd_hash.to_string() });

        Ok(Some(id))
    }

    async fn get_refr_token_by_token(&self, token: &str) -> Result<Option<RefrTokenModel>> {
        Ok(self.state.read().await.refr_tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn get_refr_token_by_id(&self, id: i64) -> Result<Option<RefrTokenModel>> {
        Ok(self.state.read().await.refr_tokens.iter().find(|t| t.id == id).cloned())
    }

    async fn create_refr_token(&self, user_id: i64, token: &str, expires_on: NaiveDateTime) -> Result<i64> {
        let mut state = self.state.write().await;
        let id = next_id(&state.refr_tokens, |t| t.id);
        state.refr_tokens.push(RefrTokenModel {
            id, user_id, token: token.to_string(), expires_on, repl_id: None, revoked_on: None,
        });

        Ok(id)
    }

    async fn revoke_refr_token(&self, id: i64, repl_id: Option<i64>, _revoked_by: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(token) = state.refr_tokens.iter_mut().find(|t| t.id == id) {
            token.revoked_on = Some(Utc::now().naive_utc());
            token.repl_id = repl_id;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_store_respects_invariants() {
        let store = MemStore::seeded();
        let players = PlayerDataLayer::get_players(&store).await.unwrap();
        let clans = ClanDataLayer::get_clans(&store).await.unwrap();

        for player in &players {
            assert!(player.assigned_quests.iter().all(|id| !player.completed_quests.contains(id)));
        }
        for clan in &clans {
            let members = players.iter().filter(|p| p.clan_id == Some(clan.id)).count() as i64;
            assert!(members <= clan.capacity);
        }
    }

    #[tokio::test]
    async fn test_ids_follow_highest_existing() {
        let store = MemStore::seeded();
        let quest = store.create_quest(&NewQuestModel {
            title: "Slay the Wyrm".to_string(), description: String::new(), xp: 300, image: None,
        }).await.unwrap();

        assert_eq!(quest.id, 4);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemStore::default();
        store.create_user("hero@quest.io", "hash").await.unwrap();

        assert_eq!(store.create_user("hero@quest.io", "hash").await.unwrap(), None);
    }
}
