use axum::{response::{IntoResponse, Response}, http::StatusCode};
use log::error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageServiceError>;

#[derive(Debug, Error)]
pub enum StorageServiceError {
    #[error("File name `{0}` is not allowed")]
    InvalidFileName(String),
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("Uploaded file exceeds {0} bytes")]
    FileTooLarge(usize),
    #[error("An internal server error occured")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for StorageServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            StorageServiceError::Io(e) => {
                error!("{:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            StorageServiceError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}
