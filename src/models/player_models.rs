use serde::{Deserialize, Serialize};

///
/// The level tier a player's xp falls into, with the
/// percentage of the way towards the next tier.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelModel {
    pub level: u32,
    pub title: String,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerModel {
    pub id: i64,
    pub nickname: String,
    pub xp: i64,
    pub assigned_quests: Vec<i64>,
    pub completed_quests: Vec<i64>,
    pub clan_id: Option<i64>,
    pub avatar: Option<String>,
    pub sound: Option<String>,
    pub uid: Option<String>,
    pub level: LevelModel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayerModel {
    pub nickname: String,
    pub avatar: Option<String>,
    /// Only ever set by the auth service when linking an identity
    #[serde(skip)]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPatchModel {
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub sound: Option<String>,
}
