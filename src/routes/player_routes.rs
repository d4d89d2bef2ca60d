use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    extract::{DefaultBodyLimit, FromRef, Path, Query, State},
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, middleware,
};

use crate::{
    middleware::auth_middleware::{AuthContext, auth_middleware},
    models::{
        player_models::{NewPlayerModel, PlayerModel, PlayerPatchModel},
        query_models::{SearchQuery, UploadQuery},
    },
    services::{
        player_service::{error::{PlayerServiceError, Result}, PlayerService},
        storage_service::{StorageService, MAX_UPLOAD_BYTES},
        token_service::TokenService,
    },
};

const AVATAR_FOLDER: &str = "avatars";
const SOUND_FOLDER: &str = "sounds";

#[derive(Clone, FromRef)]
pub struct PlayerRoutesState {
    player_service: Arc<dyn PlayerService>,
    storage_service: Arc<dyn StorageService>,
}

pub fn routes(
    player_service: Arc<dyn PlayerService>,
    storage_service: Arc<dyn StorageService>,
    token_service: Arc<dyn TokenService>,
) -> Router {
    Router::new()
        // Routes
        .route("/", get(list_players).post(add_player))
        .route("/me", get(me))
        .route("/:id", get(get_player).patch(update_player).delete(delete_player))
        .route("/:id/quests/:quest_id", post(assign_quest).delete(unassign_quest))
        .route("/:id/quests/:quest_id/complete", post(complete_quest))
        .route("/:id/quests/:quest_id/uncomplete", post(uncomplete_quest))
        .route(
            "/:id/avatar",
            put(upload_avatar).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/:id/sound",
            put(upload_sound).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Auth middleware
        .layer(middleware::from_fn_with_state(token_service, auth_middleware))
        // State
        .with_state(PlayerRoutesState { player_service, storage_service })
}

async fn list_players(
    State(player_service): State<Arc<dyn PlayerService>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PlayerModel>>> {
    Ok(Json(player_service.list_players(query.search).await?))
}

async fn me(State(player_service): State<Arc<dyn PlayerService>>, ctx: AuthContext) -> Result<Json<PlayerModel>> {
    player_service.find_by_uid(&ctx.user_id.to_string()).await?
        .map(Json)
        .ok_or(PlayerServiceError::NoLinkedPlayer(ctx.user_id))
}

async fn get_player(State(player_service): State<Arc<dyn PlayerService>>, Path(player_id): Path<i64>) -> Result<Json<PlayerModel>> {
    Ok(Json(player_service.get_player(player_id).await?))
}

async fn add_player(
    State(player_service): State<Arc<dyn PlayerService>>,
    _ctx: AuthContext,
    Json(player): Json<NewPlayerModel>,
) -> Result<(StatusCode, Json<PlayerModel>)> {
    Ok((StatusCode::CREATED, Json(player_service.add_player(player).await?)))
}

async fn update_player(
    State(player_service): State<Arc<dyn PlayerService>>,
    Path(player_id): Path<i64>,
    _ctx: AuthContext,
    Json(patch): Json<PlayerPatchModel>,
) -> Result<Json<PlayerModel>> {
    Ok(Json(player_service.update_player(player_id, patch).await?))
}

async fn delete_player(
    State(player_service): State<Arc<dyn PlayerService>>,
    Path(player_id): Path<i64>,
    _ctx: AuthContext,
) -> Result<StatusCode> {
    player_service.delete_player(player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign_quest(
    State(player_service): State<Arc<dyn PlayerService>>,
    Path((player_id, quest_id)): Path<(i64, i64)>,
    _ctx: AuthContext,
) -> Result<Json<PlayerModel>> {
    Ok(Json(player_service.assign_quest(player_id, quest_id).await?))
}

async fn unassign_quest(
    State(player_service): State<Arc<dyn PlayerService>>,
    Path((player_id, quest_id)): Path<(i64, i64)>,
    _ctx: AuthContext,
) -> Result<Json<PlayerModel>> {
    Ok(Json(player_service.unassign_quest(player_id, quest_id).await?))
}

async fn complete_quest(
    State(player_service): State<Arc<dyn PlayerService>>,
    Path((player_id, quest_id)): Path<(i64, i64)>,
    _ctx: AuthContext,
) -> Result<Json<PlayerModel>> {
    Ok(Json(player_service.complete_quest(player_id, quest_id).await?))
}

async fn uncomplete_quest(
    State(player_service): State<Arc<dyn PlayerService>>,
    Path((player_id, quest_id)): Path<(i64, i64)>,
    _ctx: AuthContext,
) -> Result<Json<PlayerModel>> {
    Ok(Json(player_service.uncomplete_quest(player_id, quest_id).await?))
}

///
/// Stores the request body as the player's new avatar image and points
/// the player's `avatar` at its public URL
///
async fn upload_avatar(
    State(state): State<PlayerRoutesState>,
    Path(player_id): Path<i64>,
    Query(query): Query<UploadQuery>,
    _ctx: AuthContext,
    body: Bytes,
) -> std::result::Result<Json<PlayerModel>, Response> {
    let url = store_player_file(&state, player_id, AVATAR_FOLDER, &query.file_name, &body).await?;
    let patch = PlayerPatchModel { avatar: Some(url), ..Default::default() };
    Ok(Json(state.player_service.update_player(player_id, patch).await.map_err(IntoResponse::into_response)?))
}

async fn upload_sound(
    State(state): State<PlayerRoutesState>,
    Path(player_id): Path<i64>,
    Query(query): Query<UploadQuery>,
    _ctx: AuthContext,
    body: Bytes,
) -> std::result::Result<Json<PlayerModel>, Response> {
    let url = store_player_file(&state, player_id, SOUND_FOLDER, &query.file_name, &body).await?;
    let patch = PlayerPatchModel { sound: Some(url), ..Default::default() };
    Ok(Json(state.player_service.update_player(player_id, patch).await.map_err(IntoResponse::into_response)?))
}

/// Uploads `body` under `<folder>/<player_id>/` and returns its public URL
async fn store_player_file(
    state: &PlayerRoutesState,
    player_id: i64,
    folder: &str,
    file_name: &str,
    body: &[u8],
) -> std::result::Result<String, Response> {
    // Fail before writing anything if the player doesn't exist
    state.player_service.get_player(player_id).await.map_err(IntoResponse::into_response)?;

    state.storage_service
        .upload(folder, &player_id.to_string(), file_name, body).await
        .map_err(IntoResponse::into_response)
}
