use std::sync::Arc;

use axum::{Router, routing::get, extract::{FromRef, Path, Query, State}, http::StatusCode, Json, middleware};

use crate::{
    middleware::auth_middleware::{AuthContext, auth_middleware},
    models::{quest_models::{NewQuestModel, QuestModel, QuestPatchModel}, query_models::SearchQuery},
    services::{quest_service::{error::Result, QuestService}, token_service::TokenService},
};

#[derive(Clone, FromRef)]
pub struct QuestRoutesState {
    quest_service: Arc<dyn QuestService>
}

pub fn routes(quest_service: Arc<dyn QuestService>, token_service: Arc<dyn TokenService>) -> Router {
    Router::new()
        // Routes
        .route("/", get(list_quests).post(add_quest))
        .route("/:id", get(get_quest).patch(update_quest).delete(delete_quest))
        // Auth middleware
        .layer(middleware::from_fn_with_state(token_service, auth_middleware))
        // State
        .with_state(QuestRoutesState { quest_service })
}

async fn list_quests(
    State(quest_service): State<Arc<dyn QuestService>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<QuestModel>>> {
    Ok(Json(quest_service.list_quests(query.search).await?))
}

async fn get_quest(
    State(quest_service): State<Arc<dyn QuestService>>,
    Path(quest_id): Path<i64>,
) -> Result<Json<QuestModel>> {
    Ok(Json(quest_service.get_quest(quest_id).await?))
}

async fn add_quest(
    State(quest_service): State<Arc<dyn QuestService>>,
    _ctx: AuthContext,
    Json(quest): Json<NewQuestModel>,
) -> Result<(StatusCode, Json<QuestModel>)> {
    Ok((StatusCode::CREATED, Json(quest_service.add_quest(quest).await?)))
}

async fn update_quest(
    State(quest_service): State<Arc<dyn QuestService>>,
    Path(quest_id): Path<i64>,
    _ctx: AuthContext,
    Json(patch): Json<QuestPatchModel>,
) -> Result<Json<QuestModel>> {
    Ok(Json(quest_service.update_quest(quest_id, patch).await?))
}

async fn delete_quest(
    State(quest_service): State<Arc<dyn QuestService>>,
    Path(quest_id): Path<i64>,
    _ctx: AuthContext,
) -> Result<StatusCode> {
    quest_service.delete_quest(quest_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
