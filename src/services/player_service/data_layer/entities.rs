#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerEntity {
    pub id: i64,
    pub nickname: String,
    pub xp: i64,
    pub assigned_quests: Vec<i64>,
    pub completed_quests: Vec<i64>,
    pub clan_id: Option<i64>,
    pub avatar: Option<String>,
    pub sound: Option<String>,
    pub uid: Option<String>,
}

#[derive(sqlx::FromRow)]
pub struct PlayerRow {
    pub id: i64,
    pub nickname: String,
    pub xp: i64,
    pub clan_id: Option<i64>,
    pub avatar: Option<String>,
    pub sound: Option<String>,
    pub uid: Option<String>,
}

#[derive(sqlx::FromRow)]
pub struct ProgressRow {
    pub player_id: i64,
    pub quest_id: i64,
    pub completed: bool,
}

impl PlayerEntity {
    ///
    /// Builds player entities from their rows, distributing each progress
    /// row into the assigned or completed list of its player. Progress rows
    /// are expected in insertion order.
    ///
    pub fn from_rows(rows: Vec<PlayerRow>, progress: Vec<ProgressRow>) -> Vec<PlayerEntity> {
        let mut players: Vec<PlayerEntity> = rows.into_iter().map(PlayerEntity::from).collect();

        for row in progress {
            if let Some(player) = players.iter_mut().find(|p| p.id == row.player_id) {
                if row.completed {
                    player.completed_quests.push(row.quest_id);
                } else {
                    player.assigned_quests.push(row.quest_id);
                }
            }
        }
        players
    }
}

impl From<PlayerRow> for PlayerEntity {
    fn from(row: PlayerRow) -> Self {
        PlayerEntity {
            id: row.id,
            nickname: row.nickname,
            xp: row.xp,
            clan_id: row.clan_id,
            avatar: row.avatar,
            sound: row.sound,
            uid: row.uid,
            ..Default::default()
        }
    }
}
