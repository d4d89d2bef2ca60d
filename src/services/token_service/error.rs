use axum::{response::{IntoResponse, Response}, http::StatusCode};
use log::{debug, error};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokenError>;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Access token stale - please sign in again")]
    TokenStale,
    #[error("Access token is missing required claims")]
    MalformedClaims,
    #[error("The token secret is not a valid signing key")]
    InvalidKey,
    #[error("An error has occurred")]
    JwtError(#[from] jwt::Error),
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status = match self {
            TokenError::InvalidKey => {
                error!("{:?}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => {
                debug!("{:?}", self);
                StatusCode::UNAUTHORIZED
            }
        };
        (status, self.to_string()).into_response()
    }
}
