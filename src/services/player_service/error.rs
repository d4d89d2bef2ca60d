use axum::{response::{IntoResponse, Response}, http::StatusCode};
use log::error;
use thiserror::Error;

use crate::{data_layer_error::DataLayerError, services::quest_service::error::QuestServiceError};

pub type Result<T> = std::result::Result<T, PlayerServiceError>;

#[derive(Debug, Error)]
pub enum PlayerServiceError {
    #[error("An internal server error occured")]
    DataLayerError(DataLayerError),
    #[error(transparent)]
    QuestServiceError(QuestServiceError),
    #[error("Player `{0}` does not exist")]
    PlayerNotFound(i64),
    #[error("No player is linked to user `{0}`")]
    NoLinkedPlayer(i64),
    #[error("Player nickname cannot be empty")]
    EmptyNickname,
    #[error("Quest `{quest_id}` is not assigned to player `{player_id}`")]
    QuestNotAssigned { player_id: i64, quest_id: i64 },
    #[error("Quest `{quest_id}` is not completed by player `{player_id}`")]
    QuestNotCompleted { player_id: i64, quest_id: i64 },
    #[error("Quest `{quest_id}` is already completed by player `{player_id}`")]
    QuestAlreadyCompleted { player_id: i64, quest_id: i64 },
}

impl From<DataLayerError> for PlayerServiceError {
    fn from(e: DataLayerError) -> Self {
        PlayerServiceError::DataLayerError(e)
    }
}

impl From<QuestServiceError> for PlayerServiceError {
    fn from(e: QuestServiceError) -> Self {
        PlayerServiceError::QuestServiceError(e)
    }
}

impl PlayerServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            PlayerServiceError::DataLayerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PlayerServiceError::QuestServiceError(e) => e.status(),
            PlayerServiceError::PlayerNotFound(_) | PlayerServiceError::NoLinkedPlayer(_) => StatusCode::NOT_FOUND,
            PlayerServiceError::QuestAlreadyCompleted { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for PlayerServiceError {
    fn into_response(self) -> Response {
        match self {
            PlayerServiceError::QuestServiceError(e) => e.into_response(),
            PlayerServiceError::DataLayerError(ref e) => {
                error!("{:?}", e);
                (self.status(), self.to_string()).into_response()
            }
            _ => (self.status(), self.to_string()).into_response(),
        }
    }
}
