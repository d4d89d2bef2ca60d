
pub mod app;
pub mod data_layer_error;
pub mod mem_store;
pub mod settings;

pub mod middleware {
    pub mod auth_middleware;
}

pub mod models {
    pub mod auth_models;
    pub mod clan_models;
    pub mod player_models;
    pub mod query_models;
    pub mod quest_models;
}

pub mod routes {
    pub mod auth_routes;
    pub mod clan_routes;
    pub mod level_routes;
    pub mod player_routes;
    pub mod quest_routes;
}

pub mod resources {
    pub mod levels;
}

pub mod services {
    pub mod auth_service;
    pub mod clan_service;
    pub mod player_service;
    pub mod quest_service;
    pub mod storage_service;
    pub mod token_service;
}
