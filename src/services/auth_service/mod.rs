pub mod error;
pub mod data_layer;
pub mod models;

use std::sync::Arc;

use argon2::Config;
use axum::async_trait;
use chrono::Utc;
use derive_more::Constructor;
use log::{info, warn};
use rand::Rng;

use crate::{data_layer_error, models::{auth_models::{RefrTokenModel, UserModel}, player_models::NewPlayerModel}};

use self::{error::{Result, AuthServiceError}, data_layer::AuthDataLayer, models::AuthSessionModel};

use super::{player_service::PlayerService, token_service::TokenService};

const MIN_PASSWORD_LENGTH: usize = 6;
const SALT_LENGTH: usize = 16;
const DEFAULT_NICKNAME: &str = "Player";

#[async_trait]
pub trait AuthService: Send + Sync {
    ///
    /// Creates a new account and the player linked to it. The player's
    /// nickname falls back to the local part of the email.
    ///
    async fn sign_up(&self, email: String, pwd: String, nickname: Option<String>) -> Result<AuthSessionModel>;
    ///
    /// Verifies the credentials and returns fresh tokens. A basic player is
    /// created if the account has none linked yet
    ///
    async fn sign_in(&self, email: String, pwd: String) -> Result<AuthSessionModel>;
    ///
    /// Rotates the given refresh token. Presenting an already revoked token
    /// revokes the live end of its chain as well
    ///
    async fn refresh(&self, refr_token: String) -> Result<AuthSessionModel>;
}

#[derive(Clone, Constructor)]
pub struct CoreAuthService {
    data_layer: Arc<dyn AuthDataLayer>,
    token_service: Arc<dyn TokenService>,
    player_service: Arc<dyn PlayerService>,
}

#[async_trait]
impl AuthService for CoreAuthService {
    async fn sign_up(&self, email: String, pwd: String, nickname: Option<String>) -> Result<AuthSessionModel> {
        let email = normalize_email(&email)?;
        if pwd.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthServiceError::WeakPassword);
        }
        if self.data_layer.get_user_by_email(&email).await?.is_some() {
            return Err(AuthServiceError::EmailAlreadyInUse(email));
        }

        let salt: [u8; SALT_LENGTH] = rand::thread_rng().gen();
        let pwd_hash = argon2::hash_encoded(pwd.as_bytes(), &salt, &Config::default())?;
        // The email check above can lose a race with a concurrent sign-up
        let user_id = self.data_layer.create_user(&email, &pwd_hash).await?
            .ok_or_else(|| AuthServiceError::EmailAlreadyInUse(email.clone()))?;

        let nickname = nickname
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_nickname(&email));
        let player = self.player_service.add_player(NewPlayerModel {
            nickname,
            avatar: None,
            uid: Some(user_id.to_string()),
        }).await?;
        info!("User {} signed up, linked to player {}", user_id, player.id);

        self.issue_session(user_id, player.id).await
    }

    async fn sign_in(&self, email: String, pwd: String) -> Result<AuthSessionModel> {
        let email = normalize_email(&email)?;

        // Get the user associated with the email (if exists)
        let user = self.data_layer.get_user_by_email(&email).await?
            .ok_or_else(|| AuthServiceError::UserNotFound(email.clone()))?;

        // Verify that the password given matches the user's
        if !argon2::verify_encoded(&user.pwd_hash, pwd.as_bytes())? {
            return Err(AuthServiceError::WrongPassword(user.email));
        }

        let player_id = self.linked_player(&user).await?;
        self.issue_session(user.id, player_id).await
    }

    async fn refresh(&self, token: String) -> Result<AuthSessionModel> {
        // Attempt to query the refresh token that matches the token given
        let refr_token = self.data_layer.get_refr_token_by_token(&token).await?
            .ok_or(AuthServiceError::TokenDoesNotExist)?;

        // Ensure the refresh token hasn't already been revoked
        if refr_token.revoked_on.is_some() {
            // If it has, revoke its descendent refresh token,
            // and return an error
            let revoked_id = revoke_token(refr_token.clone(), &self.data_layer).await?;

            return Err(AuthServiceError::DuplicateRefresh {
                user_id: refr_token.user_id,
                dup_id: refr_token.id,
                revoked_id,
            });
        }
        if refr_token.expires_on < Utc::now().naive_utc() {
            return Err(AuthServiceError::TokenExpired);
        }

        // Get the user associated with the refresh token
        let user = self.data_layer.get_user_by_id(refr_token.user_id).await?
            .ok_or(AuthServiceError::TokenDoesNotExist)?;

        let player_id = self.linked_player(&user).await?;
        let (session, repl_id) = self.create_session(user.id, player_id).await?;

        // Update the old token's replacement to the new one
        self.data_layer.revoke_refr_token(refr_token.id, Some(repl_id), "CLIENT").await?;

        Ok(session)
    }
}

impl CoreAuthService {
    async fn issue_session(&self, user_id: i64, player_id: i64) -> Result<AuthSessionModel> {
        Ok(self.create_session(user_id, player_id).await?.0)
    }

    ///
    /// Generates new tokens for the user and stores the refresh token.
    /// Returns the session along with the stored refresh token's ID
    ///
    async fn create_session(&self, user_id: i64, player_id: i64) -> Result<(AuthSessionModel, i64)> {
        let tokens = self.token_service.generate_auth_tokens(user_id)?;
        let refr_id = self.data_layer
            .create_refr_token(user_id, &tokens.refresh_token, tokens.refresh_expires_on).await?;

        Ok((AuthSessionModel { tokens, player_id }, refr_id))
    }

    ///
    /// Returns the ID of the player linked to `user`, creating a basic
    /// player if none is linked yet
    ///
    async fn linked_player(&self, user: &UserModel) -> Result<i64> {
        let uid = user.id.to_string();
        if let Some(player) = self.player_service.find_by_uid(&uid).await? {
            return Ok(player.id);
        }

        let player = self.player_service.add_player(NewPlayerModel {
            nickname: default_nickname(&user.email),
            avatar: None,
            uid: Some(uid),
        }).await?;
        info!("Created missing player {} for user {}", player.id, user.id);

        Ok(player.id)
    }
}

///
/// Trims and lowercases the email, rejecting anything that isn't
/// shaped like `local@domain.tld`
///
fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if valid { Ok(email) } else { Err(AuthServiceError::InvalidEmail(email)) }
}

fn default_nickname(email: &str) -> String {
    email.split('@').next()
        .filter(|local| !local.is_empty())
        .unwrap_or(DEFAULT_NICKNAME)
        .to_string()
}

async fn revoke_token(refr_token: RefrTokenModel, data_layer: &Arc<dyn AuthDataLayer>) -> data_layer_error::Result<i64> {
    let mut desc_token = refr_token;

    // Traverse down the descendent token line, finding the
    // current valid token (if it is still valid)
    while let Some(next_token_id) = desc_token.repl_id {
        match data_layer.get_refr_token_by_id(next_token_id).await? {
            Some(next_token) => desc_token = next_token,
            None => {
                warn!("Refresh token {} points at missing replacement {}", desc_token.id, next_token_id);
                break;
            }
        }
    }

    data_layer.revoke_refr_token(desc_token.id, None, "SERVER (DUPL. USAGE)").await?;

    Ok(desc_token.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::NaiveDateTime;
    use crate::{
        mem_store::MemStore,
        resources::levels::LevelTable,
        services::{
            player_service::{CorePlayerService, PlayerService},
            quest_service::CoreQuestService,
            token_service::{CoreTokenService, settings::TokenSettings},
        },
    };

    struct Fixture {
        auth: CoreAuthService,
        players: Arc<CorePlayerService>,
        store: Arc<MemStore>,
        tokens: Arc<CoreTokenService>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemStore::default());
        let quests = Arc::new(CoreQuestService::new(store.clone()));
        let players = Arc::new(CorePlayerService::new(store.clone(), quests, Arc::new(LevelTable::default()), true));
        let tokens = Arc::new(CoreTokenService::new(TokenSettings {
            jwt_lifetime_s: 60,
            refr_token_lifetime_s: 60,
            jwt_secret: "test-secret".to_string(),
        }));
        let auth = CoreAuthService::new(store.clone(), tokens.clone(), players.clone());
        Fixture { auth, players, store, tokens }
    }

    ///
    /// Delegates to `MemStore` but never finds an existing email, as if a
    /// concurrent sign-up committed between the check and the insert
    ///
    struct StaleEmailCheck(Arc<MemStore>);

    #[async_trait]
    impl AuthDataLayer for StaleEmailCheck {
        async fn get_user_by_id(&self, user_id: i64) -> data_layer_error::Result<Option<UserModel>> {
            self.0.get_user_by_id(user_id).await
        }
        async fn get_user_by_email(&self, _email: &str) -> data_layer_error::Result<Option<UserModel>> {
            Ok(None)
        }
        async fn create_user(&self, email: &str, pwd_hash: &str) -> data_layer_error::Result<Option<i64>> {
            self.0.create_user(email, pwd_hash).await
        }
        async fn get_refr_token_by_token(&self, token: &str) -> data_layer_error::Result<Option<RefrTokenModel>> {
            self.0.get_refr_token_by_token(token).await
        }
        async fn get_refr_token_by_id(&self, id: i64) -> data_layer_error::Result<Option<RefrTokenModel>> {
            self.0.get_refr_token_by_id(id).await
        }
        async fn create_refr_token(&self, user_id: i64, token: &str, expires_on: NaiveDateTime) -> data_layer_error::Result<i64> {
            self.0.create_refr_token(user_id, token, expires_on).await
        }
        async fn revoke_refr_token(&self, id: i64, repl_id: Option<i64>, revoked_by: &str) -> data_layer_error::Result<()> {
            self.0.revoke_refr_token(id, repl_id, revoked_by).await
        }
    }

    #[tokio::test]
    async fn test_sign_up_race_reports_email_in_use() {
        let fx = fixture();
        fx.auth.sign_up("hero@quest.io".to_string(), "secret1".to_string(), None).await.unwrap();

        let racing = CoreAuthService::new(Arc::new(StaleEmailCheck(fx.store.clone())), fx.tokens.clone(), fx.players.clone());
        let err = racing.sign_up("hero@quest.io".to_string(), "secret2".to_string(), None).await.unwrap_err();

        assert_eq!(err.code(), "auth/email-already-in-use");
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_sign_up_creates_linked_player() {
        let fx = fixture();
        let session = fx.auth.sign_up(" Hero@Quest.io ".to_string(), "secret1".to_string(), None).await.unwrap();

        let player = fx.players.get_player(session.player_id).await.unwrap();
        assert_eq!(player.nickname, "hero");
        assert_eq!(player.xp, 0);

        let user_id = fx.tokens.verify_access_token(&session.tokens.access_token).unwrap();
        assert_eq!(player.uid, Some(user_id.to_string()));
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let fx = fixture();

        let err = fx.auth.sign_up("not-an-email".to_string(), "secret1".to_string(), None).await.unwrap_err();
        assert_eq!(err.code(), "auth/invalid-email");
        assert_eq!(err.to_string(), "Invalid email address.");

        let err = fx.auth.sign_up("hero@quest.io".to_string(), "short".to_string(), None).await.unwrap_err();
        assert_eq!(err.code(), "auth/weak-password");

        fx.auth.sign_up("hero@quest.io".to_string(), "secret1".to_string(), Some("Hero".to_string())).await.unwrap();
        let err = fx.auth.sign_up("hero@quest.io".to_string(), "secret2".to_string(), None).await.unwrap_err();
        assert_eq!(err.code(), "auth/email-already-in-use");
    }

    #[tokio::test]
    async fn test_sign_in() {
        let fx = fixture();
        let signed_up = fx.auth.sign_up("hero@quest.io".to_string(), "secret1".to_string(), Some("Hero".to_string()))
            .await.unwrap();

        let session = fx.auth.sign_in("hero@quest.io".to_string(), "secret1".to_string()).await.unwrap();
        assert_eq!(session.player_id, signed_up.player_id);

        let err = fx.auth.sign_in("hero@quest.io".to_string(), "wrong!".to_string()).await.unwrap_err();
        assert_eq!(err.code(), "auth/wrong-password");
        assert_eq!(err.to_string(), "Wrong password. Please try again.");

        let err = fx.auth.sign_in("nobody@quest.io".to_string(), "secret1".to_string()).await.unwrap_err();
        assert_eq!(err.code(), "auth/user-not-found");
    }

    #[tokio::test]
    async fn test_sign_in_creates_missing_player() {
        let fx = fixture();
        let pwd_hash = argon2::hash_encoded(b"secret1", b"somesaltvalue", &Config::default()).unwrap();
        fx.store.create_user("ranger@quest.io", &pwd_hash).await.unwrap();

        let session = fx.auth.sign_in("ranger@quest.io".to_string(), "secret1".to_string()).await.unwrap();
        let player = fx.players.get_player(session.player_id).await.unwrap();

        assert_eq!(player.nickname, "ranger");
        assert_eq!(player.avatar.as_deref(), Some("⚔️"));
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let fx = fixture();
        let session = fx.auth.sign_up("hero@quest.io".to_string(), "secret1".to_string(), None).await.unwrap();

        let refreshed = fx.auth.refresh(session.tokens.refresh_token.clone()).await.unwrap();
        assert_eq!(refreshed.player_id, session.player_id);
        assert_ne!(refreshed.tokens.refresh_token, session.tokens.refresh_token);

        let old = fx.store.get_refr_token_by_token(&session.tokens.refresh_token).await.unwrap().unwrap();
        let new = fx.store.get_refr_token_by_token(&refreshed.tokens.refresh_token).await.unwrap().unwrap();
        assert!(old.revoked_on.is_some());
        assert_eq!(old.repl_id, Some(new.id));
    }

    #[tokio::test]
    async fn test_reused_refresh_token_revokes_chain() {
        let fx = fixture();
        let session = fx.auth.sign_up("hero@quest.io".to_string(), "secret1".to_string(), None).await.unwrap();
        let refreshed = fx.auth.refresh(session.tokens.refresh_token.clone()).await.unwrap();

        let err = fx.auth.refresh(session.tokens.refresh_token.clone()).await.unwrap_err();
        assert!(matches!(err, AuthServiceError::DuplicateRefresh { .. }));

        // The live descendant is now revoked too
        let err = fx.auth.refresh(refreshed.tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthServiceError::DuplicateRefresh { .. }));
    }

    #[tokio::test]
    async fn test_unknown_refresh_token() {
        let fx = fixture();

        assert!(matches!(fx.auth.refresh("nope".to_string()).await, Err(AuthServiceError::TokenDoesNotExist)));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" A@B.io ").unwrap(), "a@b.io");
        for invalid in ["", "a", "@b.io", "a@b", "a@b.", "a@@b.io", "a b@c.io"] {
            assert!(normalize_email(invalid).is_err(), "{invalid} should be rejected");
        }
    }
}
