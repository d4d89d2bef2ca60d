pub mod data_layer;
pub mod error;

use std::sync::Arc;

use axum::async_trait;
use derive_more::Constructor;
use log::info;

use crate::models::{clan_models::{ClanModel, ClanPatchModel, NewClanModel}, player_models::PlayerModel};

use self::{data_layer::{ClanDataLayer, entities::ClanEntity}, error::{ClanServiceError, Result}};

use super::player_service::PlayerService;

///
/// Service managing clans and their membership. Membership is derived
/// from each player's `clan_id`; the clan record itself never stores it.
///
#[async_trait]
pub trait ClanService: Send + Sync {
    ///
    /// Lists all clans. If `search` is given, only clans whose name or
    /// description contain it (case-insensitive) are returned.
    ///
    async fn list_clans(&self, search: Option<String>) -> Result<Vec<ClanModel>>;
    async fn get_clan(&self, clan_id: i64) -> Result<ClanModel>;
    async fn add_clan(&self, clan: NewClanModel) -> Result<ClanModel>;
    ///
    /// Updates the clan. The capacity can never be lowered below the
    /// clan's current member count
    ///
    async fn update_clan(&self, clan_id: i64, patch: ClanPatchModel) -> Result<ClanModel>;
    ///
    /// Deletes the clan. All former members are left without a clan
    ///
    async fn delete_clan(&self, clan_id: i64) -> Result<()>;
    async fn members(&self, clan_id: i64) -> Result<Vec<PlayerModel>>;
    ///
    /// Moves the player into the clan, leaving whichever clan they were in
    /// before. Returns `ClanServiceError::ClanAtCapacity` if the clan is full.
    /// Adding an existing member is a no-op
    ///
    async fn add_member(&self, clan_id: i64, player_id: i64) -> Result<ClanModel>;
    async fn remove_member(&self, clan_id: i64, player_id: i64) -> Result<ClanModel>;
}

#[derive(Constructor)]
pub struct CoreClanService {
    data_layer: Arc<dyn ClanDataLayer>,
    player_service: Arc<dyn PlayerService>,
}

#[async_trait]
impl ClanService for CoreClanService {
    async fn list_clans(&self, search: Option<String>) -> Result<Vec<ClanModel>> {
        let search = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
        let players = self.player_service.list_players(None).await?;

        Ok(self.data_layer.get_clans().await?
            .into_iter()
            .filter(|c| search.as_ref().map_or(true, |s| {
                c.name.to_lowercase().contains(s) || c.description.to_lowercase().contains(s)
            }))
            .map(|c| {
                let member_ids = players.iter().filter(|p| p.clan_id == Some(c.id)).map(|p| p.id).collect();
                to_model(c, member_ids)
            })
            .collect())
    }

    async fn get_clan(&self, clan_id: i64) -> Result<ClanModel> {
        let clan = self.entity(clan_id).await?;
        let member_ids = self.member_ids(clan_id).await?;

        Ok(to_model(clan, member_ids))
    }

    async fn add_clan(&self, clan: NewClanModel) -> Result<ClanModel> {
        validate(Some(&clan.name), Some(clan.capacity))?;

        let clan = self.data_layer.create_clan(&clan).await?;
        info!("Clan added with ID: {}", clan.id);

        Ok(to_model(clan, vec![]))
    }

    async fn update_clan(&self, clan_id: i64, patch: ClanPatchModel) -> Result<ClanModel> {
        validate(patch.name.as_ref(), patch.capacity)?;

        let member_ids = self.member_ids(clan_id).await?;
        if let Some(capacity) = patch.capacity.filter(|c| (*c as usize) < member_ids.len()) {
            return Err(ClanServiceError::CapacityBelowMembers { capacity, members: member_ids.len() });
        }

        let clan = self.data_layer.update_clan(clan_id, &patch).await?
            .ok_or(ClanServiceError::ClanNotFound(clan_id))?;
        info!("Clan updated with ID: {}", clan_id);

        Ok(to_model(clan, member_ids))
    }

    async fn delete_clan(&self, clan_id: i64) -> Result<()> {
        if !self.data_layer.delete_clan(clan_id).await? {
            return Err(ClanServiceError::ClanNotFound(clan_id));
        }
        info!("Clan deleted with ID: {}", clan_id);

        Ok(())
    }

    async fn members(&self, clan_id: i64) -> Result<Vec<PlayerModel>> {
        self.entity(clan_id).await?;
        Ok(self.player_service.clan_members(clan_id).await?)
    }

    async fn add_member(&self, clan_id: i64, player_id: i64) -> Result<ClanModel> {
        let clan = self.entity(clan_id).await?;
        let player = self.player_service.get_player(player_id).await?;
        let mut member_ids = self.member_ids(clan_id).await?;

        if player.clan_id == Some(clan_id) {
            return Ok(to_model(clan, member_ids));
        }
        if member_ids.len() as i64 >= clan.capacity {
            return Err(ClanServiceError::ClanAtCapacity { clan_id, capacity: clan.capacity });
        }

        // Setting the clan id also drops the player from any previous clan
        self.player_service.set_clan(player_id, Some(clan_id)).await?;
        info!("Player {} added to clan {} (previous clan: {:?})", player_id, clan_id, player.clan_id);

        member_ids.push(player_id);
        member_ids.sort_unstable();
        Ok(to_model(clan, member_ids))
    }

    async fn remove_member(&self, clan_id: i64, player_id: i64) -> Result<ClanModel> {
        let clan = self.entity(clan_id).await?;
        let player = self.player_service.get_player(player_id).await?;

        if player.clan_id != Some(clan_id) {
            return Err(ClanServiceError::PlayerNotInClan { player_id, clan_id });
        }

        self.player_service.set_clan(player_id, None).await?;
        info!("Player {} removed from clan {}", player_id, clan_id);

        let member_ids = self.member_ids(clan_id).await?;
        Ok(to_model(clan, member_ids))
    }
}

impl CoreClanService {
    async fn entity(&self, clan_id: i64) -> Result<ClanEntity> {
        self.data_layer.get_clan(clan_id).await?
            .ok_or(ClanServiceError::ClanNotFound(clan_id))
    }

    async fn member_ids(&self, clan_id: i64) -> Result<Vec<i64>> {
        Ok(self.player_service.clan_members(clan_id).await?
            .into_iter()
            .map(|p| p.id)
            .collect())
    }
}

fn to_model(clan: ClanEntity, member_ids: Vec<i64>) -> ClanModel {
    ClanModel {
        id: clan.id,
        name: clan.name,
        description: clan.description,
        capacity: clan.capacity,
        image: clan.image,
        member_ids,
    }
}

fn validate(name: Option<&String>, capacity: Option<i64>) -> Result<()> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(ClanServiceError::EmptyName);
    }
    if let Some(capacity) = capacity.filter(|c| *c <= 0) {
        return Err(ClanServiceError::InvalidCapacity(capacity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mem_store::MemStore,
        models::player_models::NewPlayerModel,
        resources::levels::LevelTable,
        services::{player_service::{CorePlayerService, error::PlayerServiceError}, quest_service::CoreQuestService},
    };

    struct Fixture {
        clans: CoreClanService,
        players: Arc<CorePlayerService>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemStore::default());
        let quests = Arc::new(CoreQuestService::new(store.clone()));
        let players = Arc::new(CorePlayerService::new(store.clone(), quests, Arc::new(LevelTable::default()), true));
        let clans = CoreClanService::new(store, players.clone());
        Fixture { clans, players }
    }

    fn new_clan(name: &str, capacity: i64) -> NewClanModel {
        NewClanModel { name: name.to_string(), description: String::new(), capacity, image: None }
    }

    async fn add_player(fx: &Fixture, nickname: &str) -> i64 {
        fx.players.add_player(NewPlayerModel { nickname: nickname.to_string(), avatar: None, uid: None })
            .await.unwrap().id
    }

    #[tokio::test]
    async fn test_add_member_and_capacity() {
        let fx = fixture();
        let clan = fx.clans.add_clan(new_clan("Moon Order", 2)).await.unwrap();
        let (a, b, c) = (add_player(&fx, "A").await, add_player(&fx, "B").await, add_player(&fx, "C").await);

        fx.clans.add_member(clan.id, a).await.unwrap();
        let full = fx.clans.add_member(clan.id, b).await.unwrap();
        assert_eq!(full.member_ids, vec![a, b]);

        assert!(matches!(
            fx.clans.add_member(clan.id, c).await,
            Err(ClanServiceError::ClanAtCapacity { capacity: 2, .. })
        ));
        // Re-adding an existing member of a full clan is fine
        assert_eq!(fx.clans.add_member(clan.id, a).await.unwrap().member_ids.len(), 2);
        assert_eq!(fx.clans.members(clan.id).await.unwrap().len(), 2);
        assert_eq!(fx.players.get_player(c).await.unwrap().clan_id, None);
    }

    #[tokio::test]
    async fn test_joining_a_clan_leaves_the_previous_one() {
        let fx = fixture();
        let first = fx.clans.add_clan(new_clan("Dragon Knights", 10)).await.unwrap();
        let second = fx.clans.add_clan(new_clan("Moon Order", 5)).await.unwrap();
        let player = add_player(&fx, "Knightmare").await;

        fx.clans.add_member(first.id, player).await.unwrap();
        fx.clans.add_member(second.id, player).await.unwrap();

        assert!(fx.clans.get_clan(first.id).await.unwrap().member_ids.is_empty());
        assert_eq!(fx.clans.get_clan(second.id).await.unwrap().member_ids, vec![player]);
        assert_eq!(fx.players.get_player(player).await.unwrap().clan_id, Some(second.id));
    }

    #[tokio::test]
    async fn test_remove_member() {
        let fx = fixture();
        let clan = fx.clans.add_clan(new_clan("Dragon Knights", 10)).await.unwrap();
        let player = add_player(&fx, "Knightmare").await;

        assert!(matches!(
            fx.clans.remove_member(clan.id, player).await,
            Err(ClanServiceError::PlayerNotInClan { .. })
        ));

        fx.clans.add_member(clan.id, player).await.unwrap();
        let clan = fx.clans.remove_member(clan.id, player).await.unwrap();

        assert!(clan.member_ids.is_empty());
        assert_eq!(fx.players.get_player(player).await.unwrap().clan_id, None);
    }

    #[tokio::test]
    async fn test_delete_clan_clears_members() {
        let fx = fixture();
        let clan = fx.clans.add_clan(new_clan("Dragon Knights", 10)).await.unwrap();
        let other = fx.clans.add_clan(new_clan("Moon Order", 10)).await.unwrap();
        let (a, b, c) = (add_player(&fx, "A").await, add_player(&fx, "B").await, add_player(&fx, "C").await);
        fx.clans.add_member(clan.id, a).await.unwrap();
        fx.clans.add_member(clan.id, b).await.unwrap();
        fx.clans.add_member(other.id, c).await.unwrap();

        fx.clans.delete_clan(clan.id).await.unwrap();

        assert_eq!(fx.players.get_player(a).await.unwrap().clan_id, None);
        assert_eq!(fx.players.get_player(b).await.unwrap().clan_id, None);
        assert_eq!(fx.players.get_player(c).await.unwrap().clan_id, Some(other.id));
        assert!(matches!(fx.clans.get_clan(clan.id).await, Err(ClanServiceError::ClanNotFound(_))));
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_members() {
        let fx = fixture();
        let clan = fx.clans.add_clan(new_clan("Dragon Knights", 3)).await.unwrap();
        let (a, b) = (add_player(&fx, "A").await, add_player(&fx, "B").await);
        fx.clans.add_member(clan.id, a).await.unwrap();
        fx.clans.add_member(clan.id, b).await.unwrap();

        let shrink = |capacity| ClanPatchModel { capacity: Some(capacity), ..Default::default() };
        assert!(matches!(
            fx.clans.update_clan(clan.id, shrink(1)).await,
            Err(ClanServiceError::CapacityBelowMembers { capacity: 1, members: 2 })
        ));
        assert_eq!(fx.clans.update_clan(clan.id, shrink(2)).await.unwrap().capacity, 2);
    }

    #[tokio::test]
    async fn test_validation_and_search() {
        let fx = fixture();

        assert!(matches!(fx.clans.add_clan(new_clan("", 3)).await, Err(ClanServiceError::EmptyName)));
        assert!(matches!(fx.clans.add_clan(new_clan("Zero", 0)).await, Err(ClanServiceError::InvalidCapacity(0))));

        fx.clans.add_clan(new_clan("Dragon Knights", 10)).await.unwrap();
        fx.clans.add_clan(new_clan("Moon Order", 5)).await.unwrap();
        let found = fx.clans.list_clans(Some("dragon".to_string())).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Dragon Knights");
    }

    #[tokio::test]
    async fn test_missing_records() {
        let fx = fixture();
        let clan = fx.clans.add_clan(new_clan("Dragon Knights", 10)).await.unwrap();

        assert!(matches!(fx.clans.add_member(42, 1).await, Err(ClanServiceError::ClanNotFound(42))));
        assert!(matches!(
            fx.clans.add_member(clan.id, 42).await,
            Err(ClanServiceError::PlayerServiceError(PlayerServiceError::PlayerNotFound(42)))
        ));
        assert!(matches!(fx.clans.members(42).await, Err(ClanServiceError::ClanNotFound(42))));
    }
}
