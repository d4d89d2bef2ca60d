use std::sync::Arc;

use axum::Router;
use log::{info, warn};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tower_cookies::CookieManagerLayer;
use tower_http::{services::ServeDir, trace::{self, TraceLayer}};
use tracing::Level;

use crate::{
    data_layer_error::Result,
    mem_store::MemStore,
    resources::levels::LevelTable,
    routes::{auth_routes, clan_routes, level_routes, player_routes, quest_routes},
    services::{
        auth_service::{data_layer::{AuthDataLayer, DbAuthDataLayer}, AuthService, CoreAuthService},
        clan_service::{data_layer::{ClanDataLayer, DbClanDataLayer}, ClanService, CoreClanService},
        player_service::{data_layer::{DbPlayerDataLayer, PlayerDataLayer}, CorePlayerService, PlayerService},
        quest_service::{data_layer::{DbQuestDataLayer, QuestDataLayer}, CoreQuestService, QuestService},
        storage_service::{FsStorageService, StorageService},
        token_service::{CoreTokenService, TokenService},
    },
    settings::Settings,
};

///
/// Where the data layers keep their records
///
pub enum Backend {
    Db(SqlitePool),
    Mem(Arc<MemStore>),
}

impl Backend {
    ///
    /// Connects to the database at `url` and runs the embedded migrations.
    /// If either fails, falls back to an in-memory store seeded with
    /// default records.
    ///
    pub async fn connect_or_fallback(url: &str) -> Self {
        match connect(url).await {
            Ok(db) => {
                info!("Connected to {}", url);
                Backend::Db(db)
            }
            Err(e) => {
                warn!("Database unavailable ({}), serving in-memory defaults", e);
                Backend::Mem(Arc::new(MemStore::seeded()))
            }
        }
    }
}

pub async fn connect(url: &str) -> Result<SqlitePool> {
    // Every connection to `:memory:` opens a separate database
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let db = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    Ok(db)
}

struct DataLayers {
    quest: Arc<dyn QuestDataLayer>,
    player: Arc<dyn PlayerDataLayer>,
    clan: Arc<dyn ClanDataLayer>,
    auth: Arc<dyn AuthDataLayer>,
}

impl DataLayers {
    fn new(backend: &Backend) -> Self {
        match backend {
            Backend::Db(db) => DataLayers {
                quest: Arc::new(DbQuestDataLayer::new(db.clone())),
                player: Arc::new(DbPlayerDataLayer::new(db.clone())),
                clan: Arc::new(DbClanDataLayer::new(db.clone())),
                auth: Arc::new(DbAuthDataLayer::new(db.clone())),
            },
            Backend::Mem(store) => DataLayers {
                quest: store.clone(),
                player: store.clone(),
                clan: store.clone(),
                auth: store.clone(),
            },
        }
    }
}

#[derive(Clone)]
pub struct AppServices {
    pub levels: Arc<LevelTable>,
    pub token_service: Arc<dyn TokenService>,
    pub quest_service: Arc<dyn QuestService>,
    pub player_service: Arc<dyn PlayerService>,
    pub clan_service: Arc<dyn ClanService>,
    pub auth_service: Arc<dyn AuthService>,
    pub storage_service: Arc<dyn StorageService>,
}

impl AppServices {
    pub fn new(backend: &Backend, levels: Arc<LevelTable>, settings: &Settings) -> Self {
        let data_layers = DataLayers::new(backend);

        let token_service: Arc<dyn TokenService> = Arc::new(CoreTokenService::new(settings.token.clone()));
        let quest_service: Arc<dyn QuestService> = Arc::new(CoreQuestService::new(data_layers.quest));
        let player_service: Arc<dyn PlayerService> = Arc::new(CorePlayerService::new(
            data_layers.player,
            quest_service.clone(),
            levels.clone(),
            settings.cap_xp_at_max_level,
        ));
        let clan_service: Arc<dyn ClanService> = Arc::new(CoreClanService::new(data_layers.clan, player_service.clone()));
        let auth_service: Arc<dyn AuthService> = Arc::new(CoreAuthService::new(
            data_layers.auth,
            token_service.clone(),
            player_service.clone(),
        ));
        let storage_service: Arc<dyn StorageService> = Arc::new(FsStorageService::new(settings.uploads.clone()));

        Self { levels, token_service, quest_service, player_service, clan_service, auth_service, storage_service }
    }
}

pub fn router(services: AppServices, uploads_dir: &str) -> Router {
    let AppServices {
        levels, token_service, quest_service, player_service, clan_service, auth_service, storage_service,
    } = services;

    Router::new()
        // Routes
        .nest("/api/v1/auth", auth_routes::routes(auth_service))
        .nest("/api/v1/levels", level_routes::routes(levels))
        .nest("/api/v1/quests", quest_routes::routes(quest_service, token_service.clone()))
        .nest("/api/v1/players", player_routes::routes(player_service, storage_service, token_service.clone()))
        .nest("/api/v1/clans", clan_routes::routes(clan_service, token_service))
        // Uploaded files
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        // Logging
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO))
        )
        // Cookies
        .layer(CookieManagerLayer::new())
}
