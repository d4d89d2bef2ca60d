use axum::{response::{IntoResponse, Response}, http::StatusCode};
use log::error;
use thiserror::Error;

use crate::{data_layer_error::DataLayerError, services::player_service::error::PlayerServiceError};

pub type Result<T> = std::result::Result<T, ClanServiceError>;

#[derive(Debug, Error)]
pub enum ClanServiceError {
    #[error("An internal server error occured")]
    DataLayerError(DataLayerError),
    #[error(transparent)]
    PlayerServiceError(PlayerServiceError),
    #[error("Clan `{0}` does not exist")]
    ClanNotFound(i64),
    #[error("Clan name cannot be empty")]
    EmptyName,
    #[error("Clan capacity must be positive, got {0}")]
    InvalidCapacity(i64),
    #[error("Clan `{clan_id}` is full ({capacity} members)")]
    ClanAtCapacity { clan_id: i64, capacity: i64 },
    #[error("Capacity {capacity} is below the clan's {members} current members")]
    CapacityBelowMembers { capacity: i64, members: usize },
    #[error("Player `{player_id}` is not a member of clan `{clan_id}`")]
    PlayerNotInClan { player_id: i64, clan_id: i64 },
}

impl From<DataLayerError> for ClanServiceError {
    fn from(e: DataLayerError) -> Self {
        ClanServiceError::DataLayerError(e)
    }
}

impl From<PlayerServiceError> for ClanServiceError {
    fn from(e: PlayerServiceError) -> Self {
        ClanServiceError::PlayerServiceError(e)
    }
}

impl ClanServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ClanServiceError::DataLayerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ClanServiceError::PlayerServiceError(e) => e.status(),
            ClanServiceError::ClanNotFound(_) => StatusCode::NOT_FOUND,
            ClanServiceError::ClanAtCapacity { .. } | ClanServiceError::CapacityBelowMembers { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ClanServiceError {
    fn into_response(self) -> Response {
        match self {
            ClanServiceError::PlayerServiceError(e) => e.into_response(),
            ClanServiceError::DataLayerError(ref e) => {
                error!("{:?}", e);
                (self.status(), self.to_string()).into_response()
            }
            _ => (self.status(), self.to_string()).into_response(),
        }
    }
}
