use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuestModel {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub xp: i64,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestModel {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub xp: i64,
    pub image: Option<String>,
}

///
/// Partial update of a quest. Fields left as `None` are kept.
///
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestPatchModel {
    pub title: Option<String>,
    pub description: Option<String>,
    pub xp: Option<i64>,
    pub image: Option<String>,
}

impl QuestModel {
    pub fn matches(&self, search: &str) -> bool {
        let search = search.to_lowercase();
        self.title.to_lowercase().contains(&search)
            || self.description.to_lowercase().contains(&search)
    }
}
