use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct UserModel {
    pub id: i64,
    pub email: String,
    pub pwd_hash: String,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct RefrTokenModel {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_on: NaiveDateTime,
    #[sqlx(rename = "replacement_id")]
    pub repl_id: Option<i64>,
    pub revoked_on: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpModel {
    pub email: String,
    pub password: String,
    pub nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInModel {
    pub email: String,
    pub password: String,
}

///
/// Returned to the client on successful sign-in, sign-up or refresh.
/// The refresh token travels separately, as an http-only cookie.
///
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResultModel {
    pub access_token: String,
    pub player_id: i64,
}
