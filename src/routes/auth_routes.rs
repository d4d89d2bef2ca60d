use std::sync::Arc;

use axum::{Router, routing::post, extract::{FromRef, State}, Json};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};

use crate::{
    models::auth_models::{AuthResultModel, SignInModel, SignUpModel},
    services::auth_service::{error::{AuthServiceError, Result}, models::AuthSessionModel, AuthService},
};

pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Clone, FromRef)]
pub struct AuthRoutesState {
    auth_service: Arc<dyn AuthService>
}

pub fn routes(auth_service: Arc<dyn AuthService>) -> Router {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/refresh", post(refresh))
        .with_state(AuthRoutesState { auth_service })
}

async fn sign_up(
    State(auth_service): State<Arc<dyn AuthService>>,
    cookies: Cookies,
    Json(model): Json<SignUpModel>,
) -> Result<Json<AuthResultModel>> {
    let session = auth_service.sign_up(model.email, model.password, model.nickname).await?;
    Ok(Json(into_result(&cookies, session)))
}

async fn sign_in(
    State(auth_service): State<Arc<dyn AuthService>>,
    cookies: Cookies,
    Json(model): Json<SignInModel>,
) -> Result<Json<AuthResultModel>> {
    let session = auth_service.sign_in(model.email, model.password).await?;
    Ok(Json(into_result(&cookies, session)))
}

async fn refresh(State(auth_service): State<Arc<dyn AuthService>>, cookies: Cookies) -> Result<Json<AuthResultModel>> {
    let token = cookies.get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AuthServiceError::CookieNotFound)?;

    let session = auth_service.refresh(token).await?;
    Ok(Json(into_result(&cookies, session)))
}

///
/// Sets the refresh token cookie and returns the part of the
/// session the client keeps in memory
///
fn into_result(cookies: &Cookies, session: AuthSessionModel) -> AuthResultModel {
    let cookie = Cookie::build(REFRESH_COOKIE, session.tokens.refresh_token)
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/api/v1/auth")
        .finish();
    cookies.add(cookie);

    AuthResultModel {
        access_token: session.tokens.access_token,
        player_id: session.player_id,
    }
}
