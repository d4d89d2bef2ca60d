use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
    TypedHeader,
};
use log::debug;

use crate::services::token_service::TokenService;

///
/// Identity of the caller, inserted by `auth_middleware` when the request
/// carries a valid bearer token. Extracting it rejects anonymous requests
///
#[derive(Clone)]
pub struct AuthContext { pub user_id: i64 }

#[async_trait]
impl <S : Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        return if let Some(info) = parts.extensions.get::<AuthContext>() {
            Ok(info.clone())
        } else {
            Err((StatusCode::UNAUTHORIZED, "Unauthorized. Please sign in".to_string()))
        };
    }
}

pub async fn auth_middleware<B : Send> (
    State(token_service): State<Arc<dyn TokenService>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<B>,
    next: Next<B>
) -> Response {
    if let Some(bearer) = bearer {
        match token_service.verify_access_token(bearer.token()) {
            Ok(user_id) => { request.extensions_mut().insert(AuthContext { user_id }); },
            Err(e) => debug!("Rejected bearer token: {}", e),
        }
    }
    next.run(request).await
}
