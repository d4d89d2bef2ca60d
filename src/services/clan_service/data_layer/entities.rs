#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ClanEntity {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub capacity: i64,
    pub image: Option<String>,
}
