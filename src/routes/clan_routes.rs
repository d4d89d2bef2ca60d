use std::sync::Arc;

use axum::{Router, routing::{get, post}, extract::{FromRef, Path, Query, State}, http::StatusCode, Json, middleware};

use crate::{
    middleware::auth_middleware::{AuthContext, auth_middleware},
    models::{clan_models::{ClanModel, ClanPatchModel, NewClanModel}, player_models::PlayerModel, query_models::SearchQuery},
    services::{clan_service::{error::Result, ClanService}, token_service::TokenService},
};

#[derive(Clone, FromRef)]
pub struct ClanRoutesState {
    clan_service: Arc<dyn ClanService>
}

pub fn routes(clan_service: Arc<dyn ClanService>, token_service: Arc<dyn TokenService>) -> Router {
    Router::new()
        // Routes
        .route("/", get(list_clans).post(add_clan))
        .route("/:id", get(get_clan).patch(update_clan).delete(delete_clan))
        .route("/:id/members", get(members))
        .route("/:id/members/:player_id", post(add_member).delete(remove_member))
        // Auth middleware
        .layer(middleware::from_fn_with_state(token_service, auth_middleware))
        // State
        .with_state(ClanRoutesState { clan_service })
}

async fn list_clans(
    State(clan_service): State<Arc<dyn ClanService>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ClanModel>>> {
    Ok(Json(clan_service.list_clans(query.search).await?))
}

async fn get_clan(State(clan_service): State<Arc<dyn ClanService>>, Path(clan_id): Path<i64>) -> Result<Json<ClanModel>> {
    Ok(Json(clan_service.get_clan(clan_id).await?))
}

async fn add_clan(
    State(clan_service): State<Arc<dyn ClanService>>,
    _ctx: AuthContext,
    Json(clan): Json<NewClanModel>,
) -> Result<(StatusCode, Json<ClanModel>)> {
    Ok((StatusCode::CREATED, Json(clan_service.add_clan(clan).await?)))
}

async fn update_clan(
    State(clan_service): State<Arc<dyn ClanService>>,
    Path(clan_id): Path<i64>,
    _ctx: AuthContext,
    Json(patch): Json<ClanPatchModel>,
) -> Result<Json<ClanModel>> {
    Ok(Json(clan_service.update_clan(clan_id, patch).await?))
}

async fn delete_clan(
    State(clan_service): State<Arc<dyn ClanService>>,
    Path(clan_id): Path<i64>,
    _ctx: AuthContext,
) -> Result<StatusCode> {
    clan_service.delete_clan(clan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn members(State(clan_service): State<Arc<dyn ClanService>>, Path(clan_id): Path<i64>) -> Result<Json<Vec<PlayerModel>>> {
    Ok(Json(clan_service.members(clan_id).await?))
}

async fn add_member(
    State(clan_service): State<Arc<dyn ClanService>>,
    Path((clan_id, player_id)): Path<(i64, i64)>,
    _ctx: AuthContext,
) -> Result<Json<ClanModel>> {
    Ok(Json(clan_service.add_member(clan_id, player_id).await?))
}

async fn remove_member(
    State(clan_service): State<Arc<dyn ClanService>>,
    Path((clan_id, player_id)): Path<(i64, i64)>,
    _ctx: AuthContext,
) -> Result<Json<ClanModel>> {
    Ok(Json(clan_service.remove_member(clan_id, player_id).await?))
}
