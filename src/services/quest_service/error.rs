use axum::{response::{IntoResponse, Response}, http::StatusCode};
use log::error;
use thiserror::Error;

use crate::data_layer_error::DataLayerError;

pub type Result<T> = std::result::Result<T, QuestServiceError>;

#[derive(Debug, Error)]
pub enum QuestServiceError {
    #[error("An internal server error occured")]
    DataLayerError(DataLayerError),
    #[error("Quest `{0}` does not exist")]
    QuestNotFound(i64),
    #[error("Quest title cannot be empty")]
    EmptyTitle,
    #[error("Quest xp must not be negative, got {0}")]
    NegativeXp(i64),
}

impl From<DataLayerError> for QuestServiceError {
    fn from(e: DataLayerError) -> Self {
        QuestServiceError::DataLayerError(e)
    }
}

impl QuestServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            QuestServiceError::DataLayerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            QuestServiceError::QuestNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for QuestServiceError {
    fn into_response(self) -> Response {
        if let QuestServiceError::DataLayerError(e) = &self {
            error!("{:?}", e);
        }
        (self.status(), self.to_string()).into_response()
    }
}
