use crate::services::token_service::models::AuthTokensModel;

///
/// A signed-in session: the issued tokens and the player linked
/// to the authenticated identity
///
#[derive(Debug)]
pub struct AuthSessionModel {
    pub tokens: AuthTokensModel,
    pub player_id: i64,
}
