use std::sync::Arc;

use axum::{Router, routing::get, extract::State, Json};

use crate::resources::levels::{LevelTable, LevelTier};

pub fn routes(levels: Arc<LevelTable>) -> Router {
    Router::new()
        .route("/", get(list_levels))
        .with_state(levels)
}

async fn list_levels(State(levels): State<Arc<LevelTable>>) -> Json<Vec<LevelTier>> {
    Json(levels.tiers().to_vec())
}
