use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthTokensModel {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_on: NaiveDateTime,
}
