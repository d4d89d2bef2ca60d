use axum::{response::{IntoResponse, Response}, http::StatusCode, Json};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::{
    data_layer_error::DataLayerError,
    services::{player_service::error::PlayerServiceError, token_service::error::TokenError},
};

pub type Result<T> = std::result::Result<T, AuthServiceError>;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("Refresh token cookie not found")]
    CookieNotFound,
    #[error("An internal server error has occurred")]
    DataLayerError(DataLayerError),
    #[error("An internal server error has occurred")]
    PasswordHashError(#[from] argon2::Error),
    #[error(transparent)]
    TokenError(#[from] TokenError),
    #[error(transparent)]
    PlayerServiceError(#[from] PlayerServiceError),
    #[error("Invalid email address.")]
    InvalidEmail(String),
    #[error("Password is too weak. Use at least 6 characters.")]
    WeakPassword,
    #[error("Email already in use. Try logging in instead.")]
    EmailAlreadyInUse(String),
    #[error("No account found for this email.")]
    UserNotFound(String),
    #[error("Wrong password. Please try again.")]
    WrongPassword(String),
    #[error("Refresh token duplicate usage. duplicate ID `{dup_id}`, revoked ID `{revoked_id}`, user ID `{user_id}`")]
    DuplicateRefresh { user_id: i64, dup_id: i64, revoked_id: i64 },
    #[error("The token provided doesn't exist")]
    TokenDoesNotExist,
    #[error("Refresh token expired - please sign in again")]
    TokenExpired,
}

impl From<DataLayerError> for AuthServiceError {
    fn from(e: DataLayerError) -> Self {
        AuthServiceError::DataLayerError(e)
    }
}

#[derive(Serialize)]
struct AuthErrorBody {
    code: &'static str,
    message: String,
}

impl AuthServiceError {
    ///
    /// Stable error code the client can map to its own messages
    ///
    pub fn code(&self) -> &'static str {
        match self {
            AuthServiceError::InvalidEmail(_) => "auth/invalid-email",
            AuthServiceError::WeakPassword => "auth/weak-password",
            AuthServiceError::EmailAlreadyInUse(_) => "auth/email-already-in-use",
            AuthServiceError::UserNotFound(_) => "auth/user-not-found",
            AuthServiceError::WrongPassword(_) => "auth/wrong-password",
            AuthServiceError::CookieNotFound
            | AuthServiceError::TokenDoesNotExist
            | AuthServiceError::TokenExpired
            | AuthServiceError::DuplicateRefresh { .. }
            | AuthServiceError::TokenError(_) => "auth/invalid-token",
            AuthServiceError::PlayerServiceError(_) => "auth/player-error",
            AuthServiceError::DataLayerError(_) | AuthServiceError::PasswordHashError(_) => "auth/internal-error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthServiceError::DataLayerError(_) | AuthServiceError::PasswordHashError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthServiceError::PlayerServiceError(e) => e.status(),
            AuthServiceError::EmailAlreadyInUse(_) => StatusCode::CONFLICT,
            AuthServiceError::UserNotFound(_)
            | AuthServiceError::WrongPassword(_)
            | AuthServiceError::CookieNotFound
            | AuthServiceError::TokenDoesNotExist
            | AuthServiceError::TokenExpired
            | AuthServiceError::DuplicateRefresh { .. }
            | AuthServiceError::TokenError(_) => StatusCode::UNAUTHORIZED,
            AuthServiceError::InvalidEmail(_) | AuthServiceError::WeakPassword => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{:?}", self);
        }
        if let AuthServiceError::DuplicateRefresh { .. } = &self {
            error!("{}", self);
        }

        let body = AuthErrorBody { code: self.code(), message: self.to_string() };
        (status, Json(body)).into_response()
    }
}
