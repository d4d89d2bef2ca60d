use serde::{Deserialize, Serialize};

const DEFAULT_CAPACITY: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanModel {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub capacity: i64,
    pub image: Option<String>,
    /// Derived from the players whose `clan_id` points at this clan
    pub member_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClanModel {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_capacity")]
    pub capacity: i64,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanPatchModel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i64>,
    pub image: Option<String>,
}

fn default_capacity() -> i64 {
    DEFAULT_CAPACITY
}
